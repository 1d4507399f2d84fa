//! # Domain Layer
//!
//! Pure fetcher logic: object naming, signature object codec and per-source
//! backoff bookkeeping. No I/O.

pub mod backoff;
pub mod entities;
pub mod errors;
pub mod layout;
pub mod signature_file;
