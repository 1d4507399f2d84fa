//! # Adapters
//!
//! Concrete `StreamSource` implementations.

pub mod filesystem;
