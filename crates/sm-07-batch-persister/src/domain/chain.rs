//! # Chain Continuity
//!
//! Decides whether a file may be appended after the committed head.

use shared_types::{FileHash, StreamFileHeader};

use super::errors::PersistError;

/// Outcome of checking a file against the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainCheck {
    /// Extends the head; write it.
    Append,
    /// Already the head; nothing to do.
    AlreadyApplied,
    /// At or before the head; needs a lookup to tell a replay from a fork.
    Behind,
}

/// Check `header` against the committed head of its stream.
///
/// With no head yet, the file must chain to `start_hash` when one is
/// configured; otherwise any first file is accepted.
pub fn check_chain(
    header: &StreamFileHeader,
    head: Option<&StreamFileHeader>,
    start_hash: Option<&FileHash>,
) -> Result<ChainCheck, PersistError> {
    let Some(head) = head else {
        return match start_hash {
            Some(start) if *start != header.previous_hash => Err(PersistError::StartHashMismatch {
                kind: header.kind,
                expected: *start,
                actual: header.previous_hash,
            }),
            _ => Ok(ChainCheck::Append),
        };
    };

    if header.content_hash == head.content_hash {
        return Ok(ChainCheck::AlreadyApplied);
    }
    if header.period_start <= head.period_start {
        return Ok(ChainCheck::Behind);
    }
    if !header.follows(head) {
        return Err(PersistError::ChainBroken {
            kind: header.kind,
            period: header.period_start,
            expected_previous: head.content_hash,
            actual_previous: header.previous_hash,
        });
    }
    Ok(ChainCheck::Append)
}
