//! Fan-in: merging any number of independent producer streams into a single
//! arrival-ordered sequence.
//!
//! Each producer runs on its own thread and owns the sending half of its own
//! channel; [`merge`] moves every source's values into one output channel via
//! one forwarder thread per source. The output channel disconnects exactly
//! when the last forwarder finishes, so a consumer draining the merged
//! receiver observes end-of-stream only after *every* producer has completed.
//!
//! Values from a single source arrive in the order that source emitted them;
//! the interleaving across sources is unspecified and must not be relied on.

use crate::channel::{unbounded, Receiver};
use std::thread;

/// Spawns a producer that emits the integers `0..count` in order, then closes
/// its channel. `count == 0` produces a channel that is already at
/// end-of-stream.
pub fn generate(count: usize) -> Receiver<usize> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for value in 0..count {
            if tx.send(value).is_err() {
                return;
            }
        }
    });
    rx
}

/// Spawns a producer that emits `times` copies of `value`, then closes its
/// channel.
pub fn repeat<T>(value: T, times: usize) -> Receiver<T>
where
    T: Clone + Send + 'static,
{
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for _ in 0..times {
            if tx.send(value.clone()).is_err() {
                return;
            }
        }
    });
    rx
}

/// Merges the given sources into a single receiver.
///
/// One forwarder thread is spawned per source. Each forwarder holds a clone
/// of the output sender for as long as its source is live, so the merged
/// receiver disconnects only once every source has reached end-of-stream:
/// per-source completions are ANDed together, never raced.
///
/// An empty set of sources yields a receiver that is already disconnected.
pub fn merge<T>(sources: impl IntoIterator<Item = Receiver<T>>) -> Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = unbounded();
    for source in sources {
        let tx = tx.clone();
        thread::spawn(move || {
            for value in source.iter() {
                if tx.send(value).is_err() {
                    return;
                }
            }
        });
    }
    // the original sender drops here; only forwarders keep the channel open
    rx
}

/// Launches `n` producers each emitting `0..count`, merges them, and collects
/// every value.
///
/// The result always holds exactly `n * count` values, with each value in
/// `0..count` occurring exactly `n` times. Order within a single producer's
/// contribution is ascending; the overall interleaving is unspecified.
///
/// # Examples
///
/// ```
/// let values = manifold::fanin::merge_generators(5, 3);
/// assert_eq!(values.len(), 15);
/// assert_eq!(values.iter().filter(|&&v| v == 4).count(), 3);
/// ```
pub fn merge_generators(count: usize, n: usize) -> Vec<usize> {
    merge((0..n).map(|_| generate(count))).into_iter().collect()
}

/// Launches one producer per label, each emitting its label `times` times,
/// and collects the merged output: `labels.len() * times` values in an
/// unspecified interleaving.
///
/// # Examples
///
/// ```
/// let messages = manifold::fanin::interleave(["ping", "pong"], 3);
/// assert_eq!(messages.len(), 6);
/// ```
pub fn interleave<T>(labels: impl IntoIterator<Item = T>, times: usize) -> Vec<T>
where
    T: Clone + Send + 'static,
{
    merge(labels.into_iter().map(|label| repeat(label, times)))
        .into_iter()
        .collect()
}
