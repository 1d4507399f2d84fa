//! # Consensus Node Registry (SM-01)
//!
//! Holds the current set of signing nodes, their ed25519 public keys and
//! relative stake. Verification consumes immutable [`RegistrySnapshot`]s; a
//! refresh replaces the snapshot wholesale and never mutates one in place.
//!
//! ## Module Structure
//!
//! ```text
//! sm-01-node-registry/
//! ├── domain/          # ConsensusNode, RegistrySnapshot, errors
//! ├── address_book.rs  # JSON address book loading
//! └── registry.rs      # ConsensusNodeRegistry (swappable snapshot holder)
//! ```

pub mod address_book;
pub mod domain;
pub mod registry;

pub use address_book::{AddressBook, AddressBookEntry};
pub use domain::entities::{ConsensusNode, RegistrySnapshot, PUBLIC_KEY_LENGTH};
pub use domain::errors::RegistryError;
pub use registry::ConsensusNodeRegistry;
