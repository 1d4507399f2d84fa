//! # Domain Layer

pub mod decoder;
pub mod errors;
pub mod reader;
pub mod records;
pub mod writer;

/// Original format: transactions without token transfers or bloom.
pub const VERSION_1: u32 = 1;

/// Adds token transfers and an optional bloom to transaction items.
pub const VERSION_2: u32 = 2;

/// Format versions this decoder understands.
pub const SUPPORTED_VERSIONS: [u32; 2] = [VERSION_1, VERSION_2];
