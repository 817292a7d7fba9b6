use std::{fs, time::Duration};

use client_core::ADD_REQUEST_TIMEOUT;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub add_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5272".into(),
            add_timeout_secs: ADD_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    pub fn add_timeout(&self) -> Duration {
        Duration::from_secs(self.add_timeout_secs)
    }
}

/// Keys the config file may set; everything else keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    add_timeout_secs: Option<u64>,
}

/// Defaults, overridden by `squares.toml`, overridden by environment
/// variables. CLI flags are applied on top by the caller.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("squares.toml") {
        apply_file(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("SQUARES_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Ok(v) = std::env::var("SQUARES_ADD_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.add_timeout_secs = parsed;
        }
    }
    if let Ok(v) = std::env::var("APP__ADD_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.add_timeout_secs = parsed;
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    if let Ok(file) = toml::from_str::<FileSettings>(raw) {
        if let Some(v) = file.server_url {
            settings.server_url = v;
        }
        if let Some(v) = file.add_timeout_secs {
            settings.add_timeout_secs = v;
        }
    }
}
