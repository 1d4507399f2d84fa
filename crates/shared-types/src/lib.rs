//! # Shared Types Crate
//!
//! Domain primitives used across every stream-mirror component.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: stream kinds, digests and file headers are
//!   defined once here and never redefined by a component crate.
//! - **No I/O**: apart from the clock and the shutdown channel, everything in
//!   this crate is plain data.

pub mod entities;
pub mod errors;
pub mod shutdown;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
