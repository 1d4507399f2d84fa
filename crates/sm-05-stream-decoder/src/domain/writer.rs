//! # Stream File Writer
//!
//! Canonical encoder, the inverse of [`super::decoder::decode_file`]. Used by
//! node simulators and test fixtures.

use shared_types::{ConsensusTimestamp, EntityId, FileHash, StreamKind};

use super::records::{DecodedRecord, RecordPayload};
use super::VERSION_2;

/// Incrementally builds one stream file.
#[derive(Debug, Clone)]
pub struct StreamFileWriter {
    kind: StreamKind,
    version: u32,
    period_start: ConsensusTimestamp,
    period_end: ConsensusTimestamp,
    previous_hash: FileHash,
    running: FileHash,
    items: Vec<Vec<u8>>,
}

impl StreamFileWriter {
    pub fn new(
        kind: StreamKind,
        version: u32,
        period_start: ConsensusTimestamp,
        period_end: ConsensusTimestamp,
        previous_hash: FileHash,
    ) -> Self {
        Self {
            kind,
            version,
            period_start,
            period_end,
            previous_hash,
            running: previous_hash,
            items: Vec::new(),
        }
    }

    /// Append a record. Records whose payload does not match the writer's
    /// kind are written as-is and will fail decoding.
    pub fn push(&mut self, record: &DecodedRecord) -> &mut Self {
        let item = encode_item(self.version, record);
        self.push_raw(item)
    }

    /// Append pre-encoded item bytes.
    pub fn push_raw(&mut self, item: Vec<u8>) -> &mut Self {
        self.running = FileHash::digest_parts(&[self.running.as_bytes(), &item]);
        self.items.push(item);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize the file.
    pub fn finish(&self) -> Vec<u8> {
        let body: usize = self.items.iter().map(|i| 4 + i.len()).sum();
        let mut out = Vec::with_capacity(crate::domain::decoder::HEADER_LENGTH + body + 48);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.push(self.kind.tag());
        out.extend_from_slice(&self.period_start.to_be_bytes());
        out.extend_from_slice(&self.period_end.to_be_bytes());
        out.extend_from_slice(self.previous_hash.as_bytes());
        out.extend_from_slice(&(self.items.len() as u32).to_be_bytes());
        for item in &self.items {
            out.extend_from_slice(&(item.len() as u32).to_be_bytes());
            out.extend_from_slice(item);
        }
        out.extend_from_slice(self.running.as_bytes());
        out
    }
}

fn put_entity(out: &mut Vec<u8>, id: &EntityId) {
    out.extend_from_slice(&id.shard.to_be_bytes());
    out.extend_from_slice(&id.realm.to_be_bytes());
    out.extend_from_slice(&id.num.to_be_bytes());
}

/// Encode one record as an item of a `version` file.
pub fn encode_item(version: u32, record: &DecodedRecord) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&record.consensus_timestamp.to_be_bytes());
    match &record.payload {
        RecordPayload::Transaction(tx) => {
            put_entity(&mut out, &record.entity_reference);
            out.extend_from_slice(&tx.transaction_type.to_be_bytes());
            out.extend_from_slice(&tx.result.to_be_bytes());
            out.extend_from_slice(&tx.fee.to_be_bytes());
            out.extend_from_slice(&(tx.transfers.len() as u16).to_be_bytes());
            for t in &tx.transfers {
                put_entity(&mut out, &t.account);
                out.extend_from_slice(&t.amount.to_be_bytes());
            }
            if version >= VERSION_2 {
                out.extend_from_slice(&(tx.token_transfers.len() as u16).to_be_bytes());
                for t in &tx.token_transfers {
                    put_entity(&mut out, &t.token);
                    put_entity(&mut out, &t.account);
                    out.extend_from_slice(&t.amount.to_be_bytes());
                }
                let bloom = tx.bloom.as_ref().map_or(&[][..], |b| b.as_bytes());
                out.extend_from_slice(&(bloom.len() as u32).to_be_bytes());
                out.extend_from_slice(bloom);
            }
        }
        RecordPayload::Balance(row) => {
            put_entity(&mut out, &record.entity_reference);
            out.extend_from_slice(&row.balance.to_be_bytes());
            out.extend_from_slice(&(row.token_balances.len() as u16).to_be_bytes());
            for t in &row.token_balances {
                put_entity(&mut out, &t.token);
                out.extend_from_slice(&t.balance.to_be_bytes());
            }
        }
        RecordPayload::Event(event) => {
            out.extend_from_slice(&event.creator_node.to_be_bytes());
            out.extend_from_slice(&event.sequence.to_be_bytes());
            out.extend_from_slice(&(event.data.len() as u32).to_be_bytes());
            out.extend_from_slice(&event.data);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VERSION_1;

    #[test]
    fn test_empty_file_layout() {
        let prev = FileHash::digest(b"p");
        let bytes = StreamFileWriter::new(StreamKind::Event, VERSION_1, 1, 2, prev).finish();
        assert_eq!(bytes.len(), crate::domain::decoder::HEADER_LENGTH + 48);
        assert_eq!(&bytes[..4], &1u32.to_be_bytes());
        assert_eq!(bytes[4], StreamKind::Event.tag());
        // With no items the trailer equals the previous hash.
        assert_eq!(&bytes[bytes.len() - 48..], prev.as_bytes());
    }

    #[test]
    fn test_event_item_layout() {
        let item = encode_item(VERSION_2, &DecodedRecord::event(5, 3, 9, vec![0xAA]));
        assert_eq!(item.len(), 8 + 8 + 8 + 4 + 1);
        assert_eq!(&item[8..16], &3u64.to_be_bytes());
        assert_eq!(item[item.len() - 1], 0xAA);
    }
}
