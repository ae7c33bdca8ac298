//! Fan-out/fan-in aggregation with early cancellation.
//!
//! [`fetch_all`] runs one thread per fallible source and collects every
//! result, or aborts the whole batch as soon as any source fails: the first
//! error cancels a token shared by all remaining sources and becomes the
//! overall result, and every later result (success or error) is discarded.
//! Suppressed errors are not aggregated or logged; first-error-wins is a
//! deliberate simplicity trade-off.
//!
//! Sources observe cancellation cooperatively through the [`CancelToken`]
//! they are passed. A source that ignores its token delays the return of
//! [`fetch_all`] (all threads are joined before it returns) but cannot
//! deadlock it, because the results channel is buffered to hold one result
//! per source.

use crate::cancel::CancelToken;
use crate::channel::bounded;
use std::thread;

/// A fallible unit of work: invoked once with the batch's cancellation token,
/// yields either a value or an error.
pub type Source<T, E> = Box<dyn FnOnce(&CancelToken) -> Result<T, E> + Send>;

/// Boxes a closure as a [`Source`].
pub fn source<T, E, F>(f: F) -> Source<T, E>
where
    F: FnOnce(&CancelToken) -> Result<T, E> + Send + 'static,
{
    Box::new(f)
}

/// The ways a [`fetch_all`] batch can fail.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FetchError<E> {
    /// The caller's token was cancelled, either before dispatch or while
    /// sources were running. Distinguished from [`Source`](Self::Source):
    /// the batch was aborted, no source logic failed first.
    #[error("fetch was cancelled")]
    Cancelled,
    /// A source failed; this is the first error the collector observed.
    #[error("source failed: {0}")]
    Source(E),
}

/// Runs every source concurrently and returns either all of their values or
/// the first error observed.
///
/// Each source runs on its own thread and receives a token derived from
/// `token`, so cancelling `token` aborts the whole batch, while the batch
/// cancelling itself (on first error) leaves the caller's token untouched.
///
/// On success the returned values number exactly `sources.len()`, one per
/// source, in arrival order. On failure exactly one error is returned and no
/// partial results are exposed. Either way, every source thread has finished
/// before this function returns.
///
/// # Errors
///
/// * [`FetchError::Cancelled`] if `token` is already cancelled (no source is
///   invoked) or is cancelled while the batch runs.
/// * [`FetchError::Source`] carrying the first source error otherwise.
///
/// # Examples
///
/// ```
/// use manifold::cancel::CancelToken;
/// use manifold::fetch::{fetch_all, source, FetchError, Source};
///
/// let sources: Vec<Source<&str, String>> = vec![
///     source(|_| Ok("A")),
///     source(|_| Err("boom".to_string())),
///     source(|_| Ok("B")),
/// ];
/// let result = fetch_all(&CancelToken::new(), sources);
/// assert_eq!(result, Err(FetchError::Source("boom".to_string())));
/// ```
pub fn fetch_all<T, E>(
    token: &CancelToken,
    sources: Vec<Source<T, E>>,
) -> Result<Vec<T>, FetchError<E>>
where
    T: Send,
    E: Send,
{
    if token.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    let total = sources.len();
    let batch = token.child();
    // one buffer slot per source: a straggler's send never blocks
    let (result_tx, result_rx) = bounded(total);
    thread::scope(|scope| {
        for fetch in sources {
            let result_tx = result_tx.clone();
            let batch = &batch;
            scope.spawn(move || {
                let _ = result_tx.send(fetch(batch));
            });
        }
        drop(result_tx);
        let mut values = Vec::with_capacity(total);
        let mut first_error = None;
        // drains until every source has reported, even after a failure
        for result in result_rx.iter() {
            match result {
                Ok(value) if first_error.is_none() => values.push(value),
                Ok(_) => {}
                Err(error) => {
                    if first_error.is_none() {
                        batch.cancel();
                        first_error = Some(error);
                    }
                }
            }
        }
        match first_error {
            None => Ok(values),
            Some(_) if token.is_cancelled() => Err(FetchError::Cancelled),
            Some(error) => Err(FetchError::Source(error)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{fetch_all, source, FetchError, Source};
    use crate::cancel::CancelToken;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn ok_after(value: &'static str, delay: Duration) -> Source<&'static str, String> {
        source(move |token: &CancelToken| {
            if token.wait_timeout(delay) {
                Err("cancelled".to_string())
            } else {
                Ok(value)
            }
        })
    }

    fn err_after(error: &str, delay: Duration) -> Source<&'static str, String> {
        let error = error.to_string();
        source(move |token: &CancelToken| {
            token.wait_timeout(delay);
            Err(error)
        })
    }

    #[test]
    fn test_all_sources_succeed() {
        let sources = vec![
            ok_after("A", Duration::from_millis(10)),
            ok_after("B", Duration::from_millis(5)),
            ok_after("C", Duration::from_millis(1)),
        ];
        let mut values = fetch_all(&CancelToken::new(), sources).unwrap();
        values.sort_unstable();
        assert_eq!(values, ["A", "B", "C"]);
    }

    #[test]
    fn test_no_sources() {
        let sources: Vec<Source<&str, String>> = Vec::new();
        assert_eq!(fetch_all(&CancelToken::new(), sources), Ok(Vec::new()));
    }

    #[test]
    fn test_first_error_wins_and_preempts_slower_successes() {
        let sources = vec![
            ok_after("A", Duration::from_millis(100)),
            err_after("boom", Duration::from_millis(5)),
            ok_after("B", Duration::from_millis(100)),
        ];
        let result = fetch_all(&CancelToken::new(), sources);
        assert_eq!(result, Err(FetchError::Source("boom".to_string())));
    }

    #[test]
    fn test_immediate_error_discards_completed_successes() {
        let sources = vec![
            ok_after("A", Duration::from_millis(1)),
            err_after("boom", Duration::from_millis(50)),
        ];
        let result = fetch_all(&CancelToken::new(), sources);
        assert_eq!(result, Err(FetchError::Source("boom".to_string())));
    }

    #[test]
    fn test_pre_cancelled_token_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sources: Vec<Source<&str, String>> = (0..3)
            .map(|_| {
                let calls = Arc::clone(&calls);
                source(move |_: &CancelToken| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("never")
                })
            })
            .collect();
        let token = CancelToken::new();
        token.cancel();
        let result = fetch_all(&token, sources);
        assert_eq!(result, Err(FetchError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_caller_cancellation_mid_flight() {
        let token = CancelToken::new();
        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                token.cancel();
            })
        };
        let sources = vec![
            ok_after("A", Duration::from_secs(60)),
            ok_after("B", Duration::from_secs(60)),
        ];
        let result = fetch_all(&token, sources);
        assert_eq!(result, Err(FetchError::Cancelled));
        canceller.join().unwrap();
    }

    #[test]
    fn test_batch_failure_leaves_caller_token_uncancelled() {
        let token = CancelToken::new();
        let sources = vec![
            ok_after("A", Duration::from_millis(100)),
            err_after("boom", Duration::from_millis(1)),
        ];
        let _ = fetch_all(&token, sources);
        assert!(!token.is_cancelled());
    }
}
