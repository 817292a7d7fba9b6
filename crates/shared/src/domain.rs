use serde::{Deserialize, Serialize};

/// One square record as served by the collection resource.
///
/// The server serializes field names inconsistently (`color` vs `Color`,
/// `position` vs `Position`); the aliases canonicalize both variants at the
/// deserialization boundary. Serialization always emits the lowercase names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    #[serde(alias = "Color")]
    pub color: String,
    #[serde(alias = "Position")]
    pub position: Option<i64>,
}
