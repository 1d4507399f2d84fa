//! Registry domain: node entities and snapshot invariants.

pub mod entities;
pub mod errors;
