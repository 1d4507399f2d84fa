//! # Inbound Ports (Driving Ports / API)

use shared_types::{ConsensusTimestamp, StreamFileHeader, StreamKind};
use sm_02_bloom_accumulator::LogsBloom;
use sm_03_quorum_verification::SignatureAssertion;
use sm_05_stream_decoder::DecodedRecord;

use crate::domain::entities::{
    AccountBalanceRow, CommitOutcome, CryptoTransferRow, EventRow, SignatureRow, StreamFileRow,
    TokenBalanceRow, TokenTransferRow, TransactionRow,
};
use crate::domain::errors::PersistError;

/// Write side used by the download loop.
pub trait BatchPersistApi: Send + Sync {
    /// Commit one authenticated, decoded file with its quorum audit trail.
    fn commit(
        &self,
        header: &StreamFileHeader,
        records: &[DecodedRecord],
        bloom: Option<&LogsBloom>,
        assertions: &[SignatureAssertion],
    ) -> Result<CommitOutcome, PersistError>;

    /// Header of the last committed file of `kind`.
    fn watermark(&self, kind: StreamKind) -> Result<Option<StreamFileHeader>, PersistError>;
}

/// Read side over committed rows.
pub trait LedgerReader: Send + Sync {
    /// Committed balance snapshot timestamps after `after`, ascending.
    fn balance_snapshots(
        &self,
        after: Option<ConsensusTimestamp>,
        limit: usize,
    ) -> Result<Vec<ConsensusTimestamp>, PersistError>;

    fn account_balances(&self, snapshot: ConsensusTimestamp)
        -> Result<Vec<AccountBalanceRow>, PersistError>;

    fn token_balances(&self, snapshot: ConsensusTimestamp)
        -> Result<Vec<TokenBalanceRow>, PersistError>;

    /// Transfers with `after < timestamp <= upto`.
    fn crypto_transfers(
        &self,
        after: ConsensusTimestamp,
        upto: ConsensusTimestamp,
    ) -> Result<Vec<CryptoTransferRow>, PersistError>;

    /// Token transfers with `after < timestamp <= upto`.
    fn token_transfers(
        &self,
        after: ConsensusTimestamp,
        upto: ConsensusTimestamp,
    ) -> Result<Vec<TokenTransferRow>, PersistError>;

    fn transaction(&self, ts: ConsensusTimestamp) -> Result<Option<TransactionRow>, PersistError>;

    fn event(&self, ts: ConsensusTimestamp) -> Result<Option<EventRow>, PersistError>;

    /// End of the last committed period of `kind`. Every record of that
    /// stream with a timestamp below it is committed.
    fn committed_through(&self, kind: StreamKind) -> Result<Option<ConsensusTimestamp>, PersistError>;

    /// Committed files of `kind`, in period order.
    fn stream_files(&self, kind: StreamKind) -> Result<Vec<StreamFileRow>, PersistError>;

    /// Quorum audit rows of one committed file.
    fn signatures(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
    ) -> Result<Vec<SignatureRow>, PersistError>;
}
