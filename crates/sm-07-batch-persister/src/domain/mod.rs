//! # Domain Layer
//!
//! Storage entities, key layout and the record-to-row translation. Pure.

pub mod chain;
pub mod entities;
pub mod errors;
pub mod keys;
pub mod translate;
