//! # Batch Persister Service
//!
//! Commit algorithm:
//!
//! 1. Read the watermark of the file's stream (raw bytes kept).
//! 2. Check chain continuity against it.
//! 3. Build every row upsert plus the new watermark.
//! 4. Write the batch on condition that the watermark still holds the bytes
//!    read in step 1. If another writer got there first, re-read: our own
//!    file means `AlreadyApplied`, anything else is a retryable race.

use serde::de::DeserializeOwned;
use shared_types::{ConsensusTimestamp, FileHash, StreamFileHeader, StreamKind};
use sm_02_bloom_accumulator::LogsBloom;
use sm_03_quorum_verification::SignatureAssertion;
use sm_05_stream_decoder::{DecodedFile, DecodedRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::chain::{check_chain, ChainCheck};
use crate::domain::entities::{
    AccountBalanceRow, CommitOutcome, CryptoTransferRow, EventRow, SignatureRow, StreamFileRow,
    TokenBalanceRow, TokenTransferRow, TransactionRow,
};
use crate::domain::errors::{KVStoreError, PersistError};
use crate::domain::keys;
use crate::domain::translate::record_operations;
use crate::ports::inbound::{BatchPersistApi, LedgerReader};
use crate::ports::outbound::{BatchOperation, KeyValueStore, Precondition};

/// Commits decoded files into a [`KeyValueStore`].
pub struct BatchPersister {
    store: Arc<dyn KeyValueStore>,
    start_hashes: HashMap<StreamKind, FileHash>,
}

impl BatchPersister {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            start_hashes: HashMap::new(),
        }
    }

    /// Require the first committed file of `kind` to chain to `hash`.
    pub fn with_start_hash(mut self, kind: StreamKind, hash: FileHash) -> Self {
        self.start_hashes.insert(kind, hash);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Commit a decoded file.
    pub fn commit_decoded(
        &self,
        file: &DecodedFile,
        assertions: &[SignatureAssertion],
    ) -> Result<CommitOutcome, PersistError> {
        let bloom = (!file.bloom.is_empty()).then(|| file.bloom.bloom());
        self.commit(&file.header, &file.records, bloom, assertions)
    }

    fn read<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, PersistError> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<Vec<T>, PersistError> {
        entries
            .iter()
            .map(|(_, v)| bincode::deserialize(v).map_err(PersistError::from))
            .collect()
    }

    fn range<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
        after: ConsensusTimestamp,
        upto: ConsensusTimestamp,
    ) -> Result<Vec<T>, PersistError> {
        if upto <= after {
            return Ok(Vec::new());
        }
        let (start, end) = keys::timestamp_range(prefix, after, upto);
        self.scan(self.store.range_scan(&start, &end)?)
    }

    fn snapshot_rows<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
        snapshot: ConsensusTimestamp,
    ) -> Result<Vec<T>, PersistError> {
        let mut key = prefix.to_vec();
        key.extend_from_slice(&snapshot.to_be_bytes());
        self.scan(self.store.prefix_scan(&key)?)
    }

    /// Tell a replay of an older committed file from a fork.
    fn check_behind(
        &self,
        header: &StreamFileHeader,
        watermark: ConsensusTimestamp,
    ) -> Result<CommitOutcome, PersistError> {
        let existing: Option<StreamFileRow> =
            self.read(&keys::stream_file(header.kind, header.period_start))?;
        match existing {
            Some(row) if row.header.content_hash == header.content_hash => {
                debug!(
                    "[sm-07] {} file at {} was committed earlier",
                    header.kind, header.period_start
                );
                Ok(CommitOutcome::AlreadyApplied)
            }
            _ => Err(PersistError::PeriodRegression {
                kind: header.kind,
                period: header.period_start,
                watermark,
            }),
        }
    }
}

impl BatchPersistApi for BatchPersister {
    fn commit(
        &self,
        header: &StreamFileHeader,
        records: &[DecodedRecord],
        bloom: Option<&LogsBloom>,
        assertions: &[SignatureAssertion],
    ) -> Result<CommitOutcome, PersistError> {
        let wm_key = keys::watermark(header.kind);
        let raw_head = self.store.get(&wm_key)?;
        let head: Option<StreamFileHeader> = match &raw_head {
            Some(bytes) => Some(bincode::deserialize(bytes)?),
            None => None,
        };

        match check_chain(header, head.as_ref(), self.start_hashes.get(&header.kind))? {
            ChainCheck::Append => {}
            ChainCheck::AlreadyApplied => return Ok(CommitOutcome::AlreadyApplied),
            ChainCheck::Behind => {
                let watermark = head.as_ref().map_or(0, |h| h.period_start);
                return self.check_behind(header, watermark);
            }
        }

        let mut ops = record_operations(header, records, bloom, assertions)?;
        ops.push(BatchOperation::put(wm_key.clone(), bincode::serialize(header)?));

        match self
            .store
            .conditional_batch_write(vec![Precondition::equals(wm_key, raw_head)], ops)
        {
            Ok(()) => {
                info!(
                    "[sm-07] Committed {} file at {} ({} records, hash {})",
                    header.kind,
                    header.period_start,
                    records.len(),
                    header.content_hash.short()
                );
                Ok(CommitOutcome::Committed {
                    records: records.len(),
                })
            }
            Err(KVStoreError::ConditionFailed { .. }) => {
                let now = self.watermark(header.kind)?;
                if now.is_some_and(|h| h.content_hash == header.content_hash) {
                    return Ok(CommitOutcome::AlreadyApplied);
                }
                warn!(
                    "[sm-07] Watermark of {} moved while committing file at {}",
                    header.kind, header.period_start
                );
                Err(PersistError::ConcurrentCommit {
                    kind: header.kind,
                    period: header.period_start,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn watermark(&self, kind: StreamKind) -> Result<Option<StreamFileHeader>, PersistError> {
        self.read(&keys::watermark(kind))
    }
}

impl LedgerReader for BatchPersister {
    fn balance_snapshots(
        &self,
        after: Option<ConsensusTimestamp>,
        limit: usize,
    ) -> Result<Vec<ConsensusTimestamp>, PersistError> {
        let entries = match after {
            Some(after) => {
                let (start, _) = keys::timestamp_range(keys::BALANCE_SNAPSHOT, after, after);
                self.store
                    .range_scan(&start, &keys::prefix_end(keys::BALANCE_SNAPSHOT))?
            }
            None => self.store.prefix_scan(keys::BALANCE_SNAPSHOT)?,
        };
        Ok(entries
            .iter()
            .filter_map(|(k, _)| keys::leading_timestamp(keys::BALANCE_SNAPSHOT, k))
            .take(limit)
            .collect())
    }

    fn account_balances(
        &self,
        snapshot: ConsensusTimestamp,
    ) -> Result<Vec<AccountBalanceRow>, PersistError> {
        self.snapshot_rows(keys::ACCOUNT_BALANCE, snapshot)
    }

    fn token_balances(
        &self,
        snapshot: ConsensusTimestamp,
    ) -> Result<Vec<TokenBalanceRow>, PersistError> {
        self.snapshot_rows(keys::TOKEN_BALANCE, snapshot)
    }

    fn crypto_transfers(
        &self,
        after: ConsensusTimestamp,
        upto: ConsensusTimestamp,
    ) -> Result<Vec<CryptoTransferRow>, PersistError> {
        self.range(keys::CRYPTO_TRANSFER, after, upto)
    }

    fn token_transfers(
        &self,
        after: ConsensusTimestamp,
        upto: ConsensusTimestamp,
    ) -> Result<Vec<TokenTransferRow>, PersistError> {
        self.range(keys::TOKEN_TRANSFER, after, upto)
    }

    fn transaction(&self, ts: ConsensusTimestamp) -> Result<Option<TransactionRow>, PersistError> {
        self.read(&keys::transaction(ts))
    }

    fn event(&self, ts: ConsensusTimestamp) -> Result<Option<EventRow>, PersistError> {
        self.read(&keys::event(ts))
    }

    fn committed_through(&self, kind: StreamKind) -> Result<Option<ConsensusTimestamp>, PersistError> {
        Ok(self.watermark(kind)?.map(|h| h.period_end))
    }

    fn stream_files(&self, kind: StreamKind) -> Result<Vec<StreamFileRow>, PersistError> {
        self.scan(self.store.prefix_scan(&keys::stream_files_of(kind))?)
    }

    fn signatures(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
    ) -> Result<Vec<SignatureRow>, PersistError> {
        self.scan(self.store.prefix_scan(&keys::signatures_of(kind, period))?)
    }
}
