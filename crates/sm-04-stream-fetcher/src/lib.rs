//! # Stream File Fetcher (SM-04)
//!
//! Retrieves candidate stream files and the per-node signature objects that
//! vouch for them from many independent object-storage buckets, one per node.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): object layout, signature object codec,
//!   per-source backoff
//! - **Ports Layer** (`ports/`): `StreamFetchApi` (inbound) and
//!   `StreamSource` (outbound, with an in-memory implementation)
//! - **Adapters** (`adapters/`): filesystem bucket source
//! - **Service** (`service.rs`): concurrent, timeout-bounded rounds
//!
//! ## Round Structure
//!
//! 1. Ask every healthy source for the earliest period after the watermark.
//! 2. Fetch the signature objects of that period from the sources that
//!    advertise it, with bounded concurrency.
//! 3. After the quorum decision (SM-03), download the data bytes from a node
//!    that signed the accepted hash and check them against it.
//!
//! A source that times out, errors or returns malformed bytes is excluded for
//! the round and backed off; it never fails the round on its own.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::filesystem::FsBucketSource;
pub use config::FetcherConfig;
pub use domain::backoff::SourceHealth;
pub use domain::entities::{CandidateFile, ObjectType, SourceFailure};
pub use domain::errors::FetchError;
pub use domain::layout::{object_key, parse_object_name};
pub use domain::signature_file::{SignatureFile, SIGNATURE_FILE_VERSION};
pub use ports::inbound::StreamFetchApi;
pub use ports::outbound::{InMemorySource, SourceError, StreamSource};
pub use service::StreamFileFetcher;
