use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use client_logging::{client_debug, client_info};
use tokio_util::sync::CancellationToken;

use crate::ApiError;

/// One delivery from a polling session.
#[derive(Debug, Clone, PartialEq)]
pub enum PollUpdate<T> {
    /// A successfully fetched status.
    Status(T),
    /// The status fetch itself failed; the session is over.
    Failed(ApiError),
}

/// Cancellation capability for one polling session.
///
/// `cancel` is idempotent and a no-op once the session has reached a
/// terminal state. After cancellation no further updates are delivered,
/// including the result of a tick already in flight.
#[derive(Debug, Clone)]
pub struct PollHandle {
    job_key: String,
    token: CancellationToken,
}

impl PollHandle {
    pub fn job_key(&self) -> &str {
        &self.job_key
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct SessionSlot {
    generation: u64,
    token: CancellationToken,
}

/// Drives repeated status fetches for long-running jobs until a terminal
/// state is observed, a tick fails, or the caller cancels.
///
/// At most one live session exists per job key; starting a new session for
/// a key cancels the previous one atomically with installing the new one.
/// Ticks for one key never overlap: the next tick is scheduled only after
/// the previous tick's result has been processed.
pub struct StatusPoller {
    sessions: Arc<Mutex<HashMap<String, SessionSlot>>>,
    next_generation: std::sync::atomic::AtomicU64,
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPoller {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_generation: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Starts a polling session for `job_key`.
    ///
    /// The first fetch happens immediately; each subsequent fetch starts
    /// `interval` after the previous result was processed. A fetch error is
    /// terminal: it is delivered as [`PollUpdate::Failed`] and the session
    /// ends without retrying. Callers needing resilience restart explicitly.
    pub fn start<T, F, Fut, U, P>(
        &self,
        job_key: impl Into<String>,
        interval: Duration,
        fetch: F,
        is_terminal: P,
        mut on_update: U,
    ) -> PollHandle
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        U: FnMut(PollUpdate<T>) + Send + 'static,
        P: Fn(&T) -> bool + Send + 'static,
    {
        let job_key = job_key.into();
        let token = CancellationToken::new();
        let generation = self
            .next_generation
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        // Swap-in must be atomic with cancelling the previous session, so
        // no tick for this key can run between the two.
        {
            let mut sessions = self.sessions.lock().expect("poller registry poisoned");
            if let Some(old) = sessions.insert(
                job_key.clone(),
                SessionSlot {
                    generation,
                    token: token.clone(),
                },
            ) {
                old.token.cancel();
                client_debug!("poll session for {job_key} replaced a prior session");
            }
        }

        let handle = PollHandle {
            job_key: job_key.clone(),
            token: token.clone(),
        };
        let sessions = Arc::clone(&self.sessions);

        tokio::spawn(async move {
            client_info!("poll session started for {job_key}");
            loop {
                let result = tokio::select! {
                    _ = token.cancelled() => break,
                    result = fetch() => result,
                };
                // A cancel that raced the fetch suppresses its delivery.
                if token.is_cancelled() {
                    break;
                }
                match result {
                    Ok(status) => {
                        let terminal = is_terminal(&status);
                        on_update(PollUpdate::Status(status));
                        if terminal {
                            client_info!("poll session for {job_key} reached a terminal state");
                            break;
                        }
                    }
                    Err(err) => {
                        client_info!("poll session for {job_key} failed: {err}");
                        on_update(PollUpdate::Failed(err));
                        break;
                    }
                }
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            // Unregister, unless a newer session already took the slot.
            let mut sessions = sessions.lock().expect("poller registry poisoned");
            if sessions
                .get(&job_key)
                .is_some_and(|slot| slot.generation == generation)
            {
                sessions.remove(&job_key);
            }
        });

        handle
    }

    /// True while a session for `job_key` is registered and not cancelled.
    pub fn is_active(&self, job_key: &str) -> bool {
        self.sessions
            .lock()
            .expect("poller registry poisoned")
            .get(job_key)
            .is_some_and(|slot| !slot.token.is_cancelled())
    }
}
