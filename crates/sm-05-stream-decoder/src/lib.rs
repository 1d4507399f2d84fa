//! # Stream File Decoder (SM-05)
//!
//! Parses authenticated stream file bytes into ordered, typed records.
//!
//! ## File Layout (big-endian)
//!
//! ```text
//! u32   format version         1 or 2
//! u8    stream kind tag
//! u64   period start (ns)
//! u64   period end (ns)
//! [48]  previous file hash
//! u32   item count
//! item count x { u32 length, length bytes }
//! [48]  running hash
//! ```
//!
//! The running hash starts at the previous file hash and folds in every item:
//! `h_i = SHA384(h_{i-1} || item_i)`. The content hash of the file is the
//! SHA-384 of all of its bytes.
//!
//! Unknown versions fail with [`DecodeError::UnsupportedVersion`], which
//! callers can tell apart from corruption via [`DecodeError::is_unsupported`].
//!
//! Decoding inside a file is sequential; independent files decode in
//! parallel through [`StreamFileDecoder::decode_many`].

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::DecoderConfig;
pub use domain::decoder::{decode_file, DecodedFile};
pub use domain::errors::DecodeError;
pub use domain::records::{
    BalancePayload, DecodedRecord, EventPayload, RecordPayload, TokenBalance, TokenTransfer,
    TransactionPayload, Transfer,
};
pub use domain::writer::{encode_item, StreamFileWriter};
pub use domain::{SUPPORTED_VERSIONS, VERSION_1, VERSION_2};
pub use ports::inbound::StreamDecodeApi;
pub use service::StreamFileDecoder;
