//! Bounded polling for records that another process is about to write.

use std::future::Future;
use std::time::Duration;

use dbhandler_core::storage::{RepositoryError, Result};

/// Calls `fetch` every `interval` until it yields a value `accept` takes, or
/// `timeout` elapses.
///
/// Errors and rejected values count as "not yet". Once the deadline fires the
/// polling future is dropped, so no further fetches are issued.
pub async fn poll_until<T, F, Fut, P>(
    entity_type: &'static str,
    id: &str,
    timeout: Duration,
    interval: Duration,
    mut fetch: F,
    accept: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    let attempts = async {
        loop {
            match fetch().await {
                Ok(value) if accept(&value) => return value,
                Ok(_) => tracing::trace!(entity = entity_type, id, "Record not ready yet"),
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    tracing::warn!(entity = entity_type, id, error = %err, "Poll attempt failed")
                }
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(timeout, attempts)
        .await
        .map_err(|_| RepositoryError::Timeout {
            entity_type,
            id: id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    const INTERVAL: Duration = Duration::from_millis(10);

    fn not_found() -> RepositoryError {
        RepositoryError::NotFound {
            entity_type: "Channel",
            id: "17.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_returns_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let value = poll_until(
            "Channel",
            "17.1",
            Duration::from_secs(1),
            INTERVAL,
            move || {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(not_found())
                    } else {
                        Ok(attempt)
                    }
                }
            },
            |_| true,
        )
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_waits_for_predicate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let value = poll_until(
            "Channel",
            "17.1",
            Duration::from_secs(1),
            INTERVAL,
            move || {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, RepositoryError>(attempt) }
            },
            |attempt| *attempt >= 3,
        )
        .await
        .unwrap();

        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_times_out_and_stops_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let err = poll_until(
            "Channel",
            "17.1",
            Duration::from_millis(50),
            INTERVAL,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(not_found()) }
            },
            |_| true,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            RepositoryError::Timeout {
                entity_type: "Channel",
                id: "17.1".to_string(),
            }
        );

        let after_timeout = calls.load(Ordering::SeqCst);
        assert!(after_timeout >= 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_timeout);
    }

    #[tokio::test]
    async fn test_infrastructure_errors_are_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let value = poll_until(
            "Call",
            "c-1",
            Duration::from_secs(1),
            INTERVAL,
            move || {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(RepositoryError::QueryFailed("database is locked".to_string()))
                    } else {
                        Ok("ready")
                    }
                }
            },
            |_| true,
        )
        .await
        .unwrap();

        assert_eq!(value, "ready");
    }
}
