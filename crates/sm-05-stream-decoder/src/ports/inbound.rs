//! # Inbound Ports (Driving Ports / API)

use shared_types::StreamKind;

use crate::domain::decoder::DecodedFile;
use crate::domain::errors::DecodeError;

/// Decoder API.
pub trait StreamDecodeApi: Send + Sync {
    /// Decode one authenticated file of the declared kind.
    fn decode(&self, kind: StreamKind, bytes: &[u8]) -> Result<DecodedFile, DecodeError>;

    /// Decode independent files in parallel. Results keep input order.
    fn decode_many(&self, files: &[(StreamKind, Vec<u8>)]) -> Vec<Result<DecodedFile, DecodeError>>;
}
