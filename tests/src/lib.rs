//! # Stream-Mirror Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs      # Signing network, file builders, in-memory wiring
//! └── integration/     # Cross-crate scenarios
//!     ├── ingestion.rs       # fetch → verify → decode → commit
//!     ├── leadership.rs      # several instances over one store
//!     ├── integrity.rs       # conflicts, forgeries, corrupt sources
//!     └── reconciliation.rs  # audits over ingested history
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sm-tests
//! cargo test -p sm-tests integration::leadership::
//! ```

pub mod fixtures;
pub mod integration;
