//! # Adapters

pub mod lease_store;
