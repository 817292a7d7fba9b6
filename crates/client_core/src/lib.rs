use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{domain::Square, error::ErrorReport};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub mod error;
mod http;

pub use error::{ApiError, SyncError};
pub use http::HttpSquaresApi;

/// Client-side deadline for the create request. When it elapses the
/// request is dropped, not left to resolve in the background.
pub const ADD_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Where the collection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// The full-collection fetch has not succeeded yet or is in flight.
    Loading,
    /// Idle with a usable collection.
    Ready,
    /// An add or clear is in flight.
    Mutating,
    /// The last load failed; only another load makes progress.
    Failed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Loading => "loading",
            SyncPhase::Ready => "ready",
            SyncPhase::Mutating => "mutating",
            SyncPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The three remote operations the client performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Add,
    Clear,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Load => "load",
            Operation::Add => "add",
            Operation::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// State changes published to subscribers after they are applied.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A load replaced the collection wholesale.
    CollectionReplaced { squares: Vec<Square> },
    /// An add appended one square at `index`.
    SquareAdded { square: Square, index: usize },
    /// A clear emptied the collection.
    CollectionCleared,
    /// An operation failed; the collection was left as it was.
    OperationFailed {
        operation: Operation,
        report: ErrorReport,
    },
}

/// Point-in-time copy of the controller state.
#[derive(Debug, Clone)]
pub struct CollectionSnapshot {
    pub squares: Vec<Square>,
    pub phase: SyncPhase,
    pub last_error: Option<ErrorReport>,
}

/// The HTTP boundary of the controller. Production code uses
/// [`HttpSquaresApi`]; tests substitute their own implementations.
#[async_trait]
pub trait SquaresApi: Send + Sync {
    /// Fetch the full collection in server order.
    async fn list_squares(&self) -> Result<Vec<Square>, ApiError>;
    /// Ask the server to create one square and return it.
    async fn create_square(&self) -> Result<Square, ApiError>;
    /// Delete every square.
    async fn delete_squares(&self) -> Result<(), ApiError>;
}

struct SquaresClientState {
    squares: Vec<Square>,
    phase: SyncPhase,
    in_flight: Option<Operation>,
    last_error: Option<ErrorReport>,
}

/// Stateful controller that mirrors the remote squares collection.
///
/// The controller owns the local ordered collection and serializes access
/// to it: one operation runs at a time and a second one is rejected with
/// [`SyncError::PhaseConflict`] instead of queued. [`close`] (or dropping
/// the last handle) cancels in-flight work; a cancelled operation never
/// touches state afterwards, so a late response cannot append or replace
/// anything.
///
/// [`close`]: SquaresClient::close
pub struct SquaresClient {
    api: Arc<dyn SquaresApi>,
    inner: Mutex<SquaresClientState>,
    events: broadcast::Sender<ClientEvent>,
    shutdown: CancellationToken,
    add_timeout: Duration,
}

impl SquaresClient {
    pub fn new(api: Arc<dyn SquaresApi>) -> Arc<Self> {
        Self::new_with_add_timeout(api, ADD_REQUEST_TIMEOUT)
    }

    /// Like [`new`](Self::new) with the add deadline overridden. Tests use
    /// short deadlines; the console wires the configured one through here.
    pub fn new_with_add_timeout(api: Arc<dyn SquaresApi>, add_timeout: Duration) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            api,
            inner: Mutex::new(SquaresClientState {
                squares: Vec::new(),
                phase: SyncPhase::Loading,
                in_flight: None,
                last_error: None,
            }),
            events,
            shutdown: CancellationToken::new(),
            add_timeout,
        })
    }

    /// Subscribe to state-change events. Slow receivers see
    /// [`broadcast::error::RecvError::Lagged`] rather than blocking the
    /// controller.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Clone the current state.
    pub async fn snapshot(&self) -> CollectionSnapshot {
        let guard = self.inner.lock().await;
        CollectionSnapshot {
            squares: guard.squares.clone(),
            phase: guard.phase,
            last_error: guard.last_error.clone(),
        }
    }

    /// Cancel in-flight work and reject every later operation with
    /// [`SyncError::Closed`]. Idempotent.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    /// Fetch the full collection and replace the local one with it.
    ///
    /// The server's order is authoritative; local state is never merged.
    /// A failure parks the client in [`SyncPhase::Failed`] with the
    /// collection untouched, and running `load` again is the retry path.
    pub async fn load(&self) -> Result<(), SyncError> {
        self.begin(Operation::Load).await?;
        let result = tokio::select! {
            _ = self.shutdown.cancelled() => return Err(SyncError::Closed),
            result = self.api.list_squares() => result,
        };
        if self.shutdown.is_cancelled() {
            return Err(SyncError::Closed);
        }

        let mut guard = self.inner.lock().await;
        guard.in_flight = None;
        match result {
            Ok(squares) => {
                info!(count = squares.len(), "sync: collection replaced");
                guard.squares = squares.clone();
                guard.phase = SyncPhase::Ready;
                drop(guard);
                let _ = self.events.send(ClientEvent::CollectionReplaced { squares });
                Ok(())
            }
            Err(source) => {
                let report = source.report();
                warn!(%report, "sync: load failed");
                guard.phase = SyncPhase::Failed;
                guard.last_error = Some(report.clone());
                drop(guard);
                let _ = self.events.send(ClientEvent::OperationFailed {
                    operation: Operation::Load,
                    report,
                });
                Err(SyncError::Api(source))
            }
        }
    }

    /// Ask the server for one new square and append it locally.
    ///
    /// The create request races a deadline; past it the request future is
    /// dropped and the failure is reported as a timeout, so a response
    /// that would have arrived later cannot append retroactively. On
    /// success the returned square is appended as the new last item; the
    /// collection is not refetched.
    pub async fn add(&self) -> Result<Square, SyncError> {
        self.begin(Operation::Add).await?;
        let result = tokio::select! {
            _ = self.shutdown.cancelled() => return Err(SyncError::Closed),
            outcome = tokio::time::timeout(self.add_timeout, self.api.create_square()) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::Timeout { timeout: self.add_timeout }),
                }
            }
        };
        if self.shutdown.is_cancelled() {
            return Err(SyncError::Closed);
        }

        let mut guard = self.inner.lock().await;
        guard.in_flight = None;
        guard.phase = SyncPhase::Ready;
        match result {
            Ok(square) => {
                let index = guard.squares.len();
                guard.squares.push(square.clone());
                info!(index, color = %square.color, "sync: square appended");
                drop(guard);
                let _ = self.events.send(ClientEvent::SquareAdded {
                    square: square.clone(),
                    index,
                });
                Ok(square)
            }
            Err(source) => {
                let report = source.report();
                warn!(%report, "sync: add failed");
                guard.last_error = Some(report.clone());
                drop(guard);
                let _ = self.events.send(ClientEvent::OperationFailed {
                    operation: Operation::Add,
                    report,
                });
                Err(SyncError::Api(source))
            }
        }
    }

    /// Delete every square on the server and locally.
    ///
    /// On success the local collection is reset to empty no matter what
    /// it held; on failure it is left untouched.
    pub async fn clear(&self) -> Result<(), SyncError> {
        self.begin(Operation::Clear).await?;
        let result = self.api.delete_squares().await;

        let mut guard = self.inner.lock().await;
        guard.in_flight = None;
        guard.phase = SyncPhase::Ready;
        match result {
            Ok(()) => {
                info!("sync: collection cleared");
                guard.squares.clear();
                drop(guard);
                let _ = self.events.send(ClientEvent::CollectionCleared);
                Ok(())
            }
            Err(source) => {
                let report = source.report();
                warn!(%report, "sync: clear failed");
                guard.last_error = Some(report.clone());
                drop(guard);
                let _ = self.events.send(ClientEvent::OperationFailed {
                    operation: Operation::Clear,
                    report,
                });
                Err(SyncError::Api(source))
            }
        }
    }

    /// Gate an operation on the current phase and mark it in flight.
    ///
    /// Loads may start from any phase, including as the retry out of
    /// [`SyncPhase::Failed`]. Mutations require [`SyncPhase::Ready`].
    /// Starting an operation discards the previous error.
    async fn begin(&self, operation: Operation) -> Result<(), SyncError> {
        if self.shutdown.is_cancelled() {
            return Err(SyncError::Closed);
        }
        let mut guard = self.inner.lock().await;
        if guard.in_flight.is_some() {
            return Err(SyncError::PhaseConflict {
                operation,
                phase: guard.phase,
            });
        }
        match operation {
            Operation::Load => {
                guard.phase = SyncPhase::Loading;
            }
            Operation::Add | Operation::Clear => {
                if guard.phase != SyncPhase::Ready {
                    return Err(SyncError::PhaseConflict {
                        operation,
                        phase: guard.phase,
                    });
                }
                guard.phase = SyncPhase::Mutating;
            }
        }
        guard.in_flight = Some(operation);
        guard.last_error = None;
        Ok(())
    }
}

impl Drop for SquaresClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
