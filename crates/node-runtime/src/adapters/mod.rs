//! # Runtime Adapters
//!
//! Concrete backends the binary wires into the components.

pub mod storage;
