//! Support for the channel implementations used for all producer-to-collector
//! handoffs. Every stage in this crate communicates over multi-producer,
//! multi-consumer channels: pool workers are competing consumers on a single
//! shared receiver, so an MPSC implementation (e.g. `std::sync::mpsc`) is not
//! sufficient. `crossbeam-channel` is used by default; enable the `flume`
//! feature to use `flume`'s channels instead.
//!
//! A zero-capacity channel (`bounded(0)`) is a rendezvous point: a send blocks
//! until a receiver is ready to take the value. This is the strictest handoff
//! and the default choice wherever backpressure matters.

pub use prelude::{bounded, unbounded, Receiver, Sender};

#[cfg(not(feature = "flume"))]
mod prelude {
    pub use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
}

#[cfg(feature = "flume")]
mod prelude {
    pub use flume::{bounded, unbounded, Receiver, Sender};
}
