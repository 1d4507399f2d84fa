//! Quorum domain layer: entities, errors, signature checks and stake tally.

pub mod entities;
pub mod errors;
pub mod quorum;
pub mod signature;
