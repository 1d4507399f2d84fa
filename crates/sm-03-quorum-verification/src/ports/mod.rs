//! Ports for the quorum verifier.

pub mod inbound;
