//! Pacing engine.
//!
//! Admission control, per-sender buffers, due-time ordering, output
//! coalescing and the per-destination drain loop.

pub mod admission;
mod buffers;
mod coalescer;
mod destination;
mod priority;
mod worker;

pub use buffers::BufferStore;
pub use coalescer::OutputCoalescer;
pub use destination::{Admitted, Destination, Phase};
pub use priority::{DueQueue, ScheduledEvent};
pub use worker::{drain, DrainReport};
