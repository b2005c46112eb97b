//! Single-flight lazy initialization for stateful adapters

use crate::{error::InitializationError, types::Protocol};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Where a lazily built connection stands
#[derive(Debug)]
pub enum ConnectionState<T> {
    Uninitialized,
    Ready(Arc<T>),
    /// The last attempt failed; the next caller tries again
    Failed(InitializationError),
}

/// A connection built on first use, at most once per successful attempt
///
/// Concurrent first callers queue behind the one performing the setup and
/// share its outcome. A failure is recorded, returned to everyone who
/// waited on that attempt, and retried by the next caller.
#[derive(Debug)]
pub struct LazyConnection<T> {
    protocol: Protocol,
    state: RwLock<ConnectionState<T>>,
    /// Completed initialization attempts
    attempts: AtomicU64,
}

impl<T> LazyConnection<T>
where
    T: Send + Sync,
{
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            state: RwLock::new(ConnectionState::Uninitialized),
            attempts: AtomicU64::new(0),
        }
    }

    /// Return the ready handle, running `init` if there is none yet
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<T>, InitializationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, InitializationError>>,
    {
        let seen = self.attempts.load(Ordering::SeqCst);

        if let ConnectionState::Ready(handle) = &*self.state.read().await {
            return Ok(Arc::clone(handle));
        }

        let mut state = self.state.write().await;
        match &*state {
            ConnectionState::Ready(handle) => return Ok(Arc::clone(handle)),
            // An attempt finished while we waited for the lock
            ConnectionState::Failed(error) if self.attempts.load(Ordering::SeqCst) != seen => {
                return Err(error.clone())
            }
            ConnectionState::Failed(error) => {
                tracing::debug!(protocol = %self.protocol, previous = %error, "retrying initialization");
            }
            ConnectionState::Uninitialized => {}
        }

        let outcome = init().await;
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        match outcome {
            Ok(handle) => {
                let handle = Arc::new(handle);
                *state = ConnectionState::Ready(Arc::clone(&handle));
                tracing::info!(protocol = %self.protocol, attempt, "connection initialized");
                Ok(handle)
            }
            Err(error) => {
                tracing::warn!(protocol = %self.protocol, error = %error, "initialization failed");
                *state = ConnectionState::Failed(error.clone());
                Err(error)
            }
        }
    }

    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.read().await, ConnectionState::Ready(_))
    }

    /// Error of the most recent attempt, if it failed
    pub async fn last_error(&self) -> Option<InitializationError> {
        match &*self.state.read().await {
            ConnectionState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn counted_init(
        counter: &AtomicUsize,
        fail: bool,
    ) -> Result<String, InitializationError> {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        if fail {
            Err(InitializationError::new(Protocol::Soap, "WSDL unavailable"))
        } else {
            Ok("handle".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_first_use_initializes_once() {
        let lazy = LazyConnection::new(Protocol::Soap);
        let counter = AtomicUsize::new(0);

        let results = join_all((0..8).map(|_| lazy.get_or_init(|| counted_init(&counter, false)))).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r.as_deref().map(String::as_str) == Ok("handle")));
        assert!(lazy.is_ready().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_handle_is_reused() {
        let lazy = LazyConnection::new(Protocol::Grpc);
        let counter = AtomicUsize::new(0);

        let first = lazy.get_or_init(|| counted_init(&counter, false)).await.unwrap();
        let second = lazy.get_or_init(|| counted_init(&counter, false)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_shared_then_retried() {
        let lazy = LazyConnection::new(Protocol::Soap);
        let counter = AtomicUsize::new(0);

        let results = join_all((0..4).map(|_| lazy.get_or_init(|| counted_init(&counter, true)))).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r.is_err()));
        assert!(!lazy.is_ready().await);
        assert_eq!(
            lazy.last_error().await.map(|e| e.message),
            Some("WSDL unavailable".to_string())
        );

        let retried = lazy.get_or_init(|| counted_init(&counter, false)).await;
        assert!(retried.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(lazy.last_error().await, None);
    }
}
