//! Ordered first-success combinator used for provider/model fallback chains.

use std::future::Future;

/// Runs `attempt` against each candidate in order and returns the first `Ok`.
///
/// If every candidate fails, all errors are returned in candidate order.
/// An empty candidate list yields `Err(vec![])`.
pub async fn first_success<I, T, E, F, Fut>(candidates: I, mut attempt: F) -> Result<T, Vec<E>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut errors = Vec::new();
    for candidate in candidates {
        match attempt(candidate).await {
            Ok(value) => return Ok(value),
            Err(e) => errors.push(e),
        }
    }
    Err(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_returns_first_success_and_stops() {
        let calls = AtomicUsize::new(0);
        let result = first_success(["a", "b", "c"], |model| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if model == "b" {
                    Ok(model.to_uppercase())
                } else {
                    Err(format!("{model} failed"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "B");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_collects_all_errors_in_order() {
        let result: Result<(), Vec<String>> =
            first_success(["a", "b"], |model| async move { Err(format!("{model} down")) }).await;
        assert_eq!(result.unwrap_err(), vec!["a down", "b down"]);
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let result: Result<u8, Vec<String>> =
            first_success(Vec::<&str>::new(), |_| async { Ok(1) }).await;
        assert!(result.unwrap_err().is_empty());
    }
}
