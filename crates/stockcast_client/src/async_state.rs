use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ApiError;

/// Observable snapshot of one asynchronous operation.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

impl<T> Default for AsyncState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Generic container for a single async request: holds the latest
/// `{data, loading, error}` while also returning each outcome to the
/// caller of [`AsyncRequest::run`].
///
/// Overlapping `run` calls race to write the shared state and the last
/// settlement wins. Callers needing strict ordering must serialize calls
/// or discard stale results themselves.
#[derive(Debug)]
pub struct AsyncRequest<T> {
    state: Arc<Mutex<AsyncState<T>>>,
}

impl<T> Default for AsyncRequest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for AsyncRequest<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

/// Clears `loading` when dropped, so the flag is released on success,
/// failure, and cancellation alike.
struct LoadingGuard<T> {
    state: Arc<Mutex<AsyncState<T>>>,
}

impl<T> Drop for LoadingGuard<T> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.loading = false;
        }
    }
}

impl<T> AsyncRequest<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AsyncState::default())),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    fn lock(&self) -> MutexGuard<'_, AsyncState<T>> {
        self.state.lock().expect("async request state poisoned")
    }
}

impl<T: Clone> AsyncRequest<T> {
    /// Runs `op`, tracking it in the shared state.
    ///
    /// Entry: `error` is cleared and `loading` set before `op` starts.
    /// Settlement: exactly one of `data`/`error` is written, the result is
    /// handed back to the caller, and `loading` is always cleared last.
    pub async fn run<Fut>(&self, op: Fut) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }
        let _guard = LoadingGuard {
            state: Arc::clone(&self.state),
        };

        let result = op.await;
        match &result {
            Ok(value) => {
                let mut state = self.lock();
                state.data = Some(value.clone());
            }
            Err(err) => {
                let mut state = self.lock();
                state.error = Some(err.clone());
            }
        }
        result
    }

    /// Current snapshot of `{data, loading, error}`.
    pub fn snapshot(&self) -> AsyncState<T> {
        self.lock().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.lock().data.clone()
    }

    pub fn error(&self) -> Option<ApiError> {
        self.lock().error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn run_settles_loading_on_success() {
        let request = AsyncRequest::<u32>::new();
        let result = request.run(async { Ok(7) }).await;
        assert_eq!(result, Ok(7));

        let state = request.snapshot();
        assert_eq!(state.data, Some(7));
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn run_settles_loading_on_failure() {
        let request = AsyncRequest::<u32>::new();
        let err = ApiError::new(ErrorKind::Client(404), "missing");
        let result = request.run(async { Err(err.clone()) }).await;
        assert_eq!(result, Err(err.clone()));

        let state = request.snapshot();
        assert_eq!(state.data, None);
        assert!(!state.loading);
        assert_eq!(state.error, Some(err));
    }

    #[tokio::test]
    async fn new_run_clears_previous_error() {
        let request = AsyncRequest::<u32>::new();
        let _ = request
            .run(async { Err(ApiError::network()) })
            .await;
        assert!(request.error().is_some());

        let result = request.run(async { Ok(1) }).await;
        assert_eq!(result, Ok(1));
        assert_eq!(request.error(), None);
        assert_eq!(request.data(), Some(1));
    }

    #[tokio::test]
    async fn loading_is_visible_while_op_is_pending() {
        let request = AsyncRequest::<u32>::new();
        let observer = request.clone();

        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel();

        let runner = tokio::spawn(async move {
            request
                .run(async move {
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    Ok(42)
                })
                .await
        });

        started_rx.await.unwrap();
        assert!(observer.is_loading());
        release_tx.send(()).unwrap();

        assert_eq!(runner.await.unwrap(), Ok(42));
        assert!(!observer.is_loading());
    }
}
