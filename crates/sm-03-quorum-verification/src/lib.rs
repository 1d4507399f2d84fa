//! # Signature Quorum Verification (SM-03)
//!
//! Decides which claimed hash of a stream file is authentic.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): signature checks and the stake tally, no I/O
//! - **Ports Layer** (`ports/`): the `SignatureQuorumApi` driving port
//! - **Service Layer** (`service.rs`): policy-configured verifier with logging
//!
//! ## Algorithm
//!
//! 1. Verify every assertion's ed25519 signature over its claimed hash
//!    under the asserting node's registered key. Invalid signatures and
//!    unknown nodes contribute zero stake; a node counts at most once.
//! 2. Group the surviving assertions by claimed hash and sum stake.
//! 3. Accept the single hash whose stake clears the configured fraction of
//!    total network stake (default: strictly more than one third).
//! 4. Two hashes clearing the threshold is a network split (fatal);
//!    none clearing it is an insufficient quorum (retryable).

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::QuorumConfig;
pub use domain::entities::{HashTally, QuorumDecision, SignatureAssertion, SIGNATURE_LENGTH};
pub use domain::errors::QuorumError;
pub use domain::quorum::{clears_threshold, decide, tally, TallyOutcome};
pub use domain::signature::{sign_file_hash, verify_assertion};
pub use ports::inbound::SignatureQuorumApi;
pub use service::QuorumVerifier;
