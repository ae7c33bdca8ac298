//! Primitives for safely aggregating the results of any number of concurrent
//! producers, with correct termination detection and, where needed,
//! cooperative early cancellation.
//!
//! Three siblings are built on the same foundation (independent producer
//! threads, a single collector that owns the accumulating output, channel
//! handoff in between):
//!
//! * [`fanin`] merges N producer streams into one receiver that reaches
//!   end-of-stream only once *every* producer has finished.
//! * [`pool`] distributes work items over a bounded set of competing worker
//!   threads, delivering each item to exactly one worker and counting results
//!   to detect completion.
//! * [`fetch`] fans out one thread per fallible source and either collects
//!   every value or cancels the rest of the batch the moment one source
//!   fails, propagating the first error.
//!
//! In every case the collector is the only task with write access to the
//! accumulated results; producers communicate into it exclusively through a
//! channel, so no locking of the accumulator is ever needed.
//!
//! # Examples
//!
//! Merge three producers each emitting `0..5`:
//!
//! ```
//! let values = manifold::fanin::merge_generators(5, 3);
//! assert_eq!(values.len(), 15);
//! ```
//!
//! Process jobs on a pool of two workers:
//!
//! ```
//! use manifold::pool::{process_concurrently, Job};
//!
//! let jobs = vec![Job::new(1, "a"), Job::new(2, "b"), Job::new(3, "c")];
//! let done = process_concurrently(jobs, 2).unwrap();
//! assert!(done.iter().all(|job| job.processed));
//! ```
//!
//! Fetch from several sources, aborting all of them on the first failure:
//!
//! ```
//! use manifold::cancel::CancelToken;
//! use manifold::fetch::{fetch_all, source, Source};
//!
//! let sources: Vec<Source<String, std::io::Error>> = vec![
//!     source(|_| Ok("a".to_string())),
//!     source(|_| Ok("b".to_string())),
//! ];
//! let values = fetch_all(&CancelToken::new(), sources).unwrap();
//! assert_eq!(values.len(), 2);
//! ```

pub mod cancel;
pub mod channel;
pub mod fanin;
pub mod fetch;
pub mod pool;
