//! # Stream File Decoder Service

use rayon::prelude::*;
use shared_types::StreamKind;
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::domain::decoder::{decode_file, DecodedFile};
use crate::domain::errors::DecodeError;
use crate::ports::inbound::StreamDecodeApi;

/// Configured decoder.
#[derive(Clone, Debug, Default)]
pub struct StreamFileDecoder {
    config: DecoderConfig,
}

impl StreamFileDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl StreamDecodeApi for StreamFileDecoder {
    fn decode(&self, kind: StreamKind, bytes: &[u8]) -> Result<DecodedFile, DecodeError> {
        match decode_file(kind, bytes, &self.config) {
            Ok(file) => {
                debug!(
                    "[sm-05] Decoded {} file at {}: {} records, {} bytes, {} blooms",
                    kind,
                    file.header.period_start,
                    file.records.len(),
                    bytes.len(),
                    file.bloom.contributions()
                );
                Ok(file)
            }
            Err(e) if e.is_unsupported() => {
                warn!("[sm-05] {} file written in a newer format: {}", kind, e);
                Err(e)
            }
            Err(e) => {
                warn!("[sm-05] Rejected corrupt {} file: {}", kind, e);
                Err(e)
            }
        }
    }

    fn decode_many(&self, files: &[(StreamKind, Vec<u8>)]) -> Vec<Result<DecodedFile, DecodeError>> {
        files
            .par_iter()
            .map(|(kind, bytes)| self.decode(*kind, bytes))
            .collect()
    }
}
