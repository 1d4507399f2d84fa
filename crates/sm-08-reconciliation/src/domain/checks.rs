//! # Invariant Checks
//!
//! Pure functions over committed rows. Each returns the first violation
//! found, or `None`. Accounts are visited in id order so the reported
//! offender is deterministic.

use shared_types::{ConsensusTimestamp, EntityId};
use sm_07_batch_persister::{AccountBalanceRow, CryptoTransferRow, TokenBalanceRow, TokenTransferRow};
use std::collections::BTreeMap;

use super::entities::ReconciliationStatus;

/// Sum of every account balance in a snapshot.
pub fn supply_total(balances: &[AccountBalanceRow]) -> i128 {
    balances.iter().map(|row| i128::from(row.balance)).sum()
}

/// The snapshot at `snapshot` must sum to `expected`.
pub fn check_supply(
    snapshot: ConsensusTimestamp,
    balances: &[AccountBalanceRow],
    expected: i128,
) -> Option<ReconciliationStatus> {
    let actual = supply_total(balances);
    (actual != expected).then_some(ReconciliationStatus::SupplyMismatch {
        snapshot,
        expected,
        actual,
        delta: actual - expected,
    })
}

/// `end[k] == start[k] + Σ deltas[k]` for every key seen anywhere, missing
/// values counting as zero. Returns `(key, expected, actual)` of the first
/// offender.
fn first_mismatch<K: Ord + Copy>(
    start: impl IntoIterator<Item = (K, i64)>,
    end: impl IntoIterator<Item = (K, i64)>,
    deltas: impl IntoIterator<Item = (K, i64)>,
) -> Option<(K, i128, i128)> {
    let mut expected: BTreeMap<K, i128> = BTreeMap::new();
    for (key, value) in start.into_iter().chain(deltas) {
        *expected.entry(key).or_default() += i128::from(value);
    }
    let mut actual: BTreeMap<K, i128> = BTreeMap::new();
    for (key, value) in end {
        *actual.entry(key).or_default() += i128::from(value);
    }
    for key in actual.keys() {
        expected.entry(*key).or_default();
    }

    expected.into_iter().find_map(|(key, want)| {
        let got = actual.get(&key).copied().unwrap_or_default();
        (got != want).then_some((key, want, got))
    })
}

/// Balance changes between two snapshots must equal the transfers committed
/// in `(window_start, window_end]`.
pub fn check_transfers(
    window_start: ConsensusTimestamp,
    window_end: ConsensusTimestamp,
    start: &[AccountBalanceRow],
    end: &[AccountBalanceRow],
    transfers: &[CryptoTransferRow],
) -> Option<ReconciliationStatus> {
    first_mismatch(
        start.iter().map(|r| (r.account, r.balance)),
        end.iter().map(|r| (r.account, r.balance)),
        transfers.iter().map(|t| (t.account, t.amount)),
    )
    .map(|(account, expected, actual)| ReconciliationStatus::TransferMismatch {
        window_start,
        window_end,
        account,
        expected,
        actual,
    })
}

/// Same as [`check_transfers`], per (account, token).
pub fn check_token_transfers(
    window_start: ConsensusTimestamp,
    window_end: ConsensusTimestamp,
    start: &[TokenBalanceRow],
    end: &[TokenBalanceRow],
    transfers: &[TokenTransferRow],
) -> Option<ReconciliationStatus> {
    let key = |account: EntityId, token: EntityId| (account, token);
    first_mismatch(
        start.iter().map(|r| (key(r.account, r.token), r.balance)),
        end.iter().map(|r| (key(r.account, r.token), r.balance)),
        transfers.iter().map(|t| (key(t.account, t.token), t.amount)),
    )
    .map(|((account, token), expected, actual)| ReconciliationStatus::TokenTransferMismatch {
        window_start,
        window_end,
        account,
        token,
        expected,
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bal(ts: u64, account: u64, balance: i64) -> AccountBalanceRow {
        AccountBalanceRow {
            consensus_timestamp: ts,
            account: EntityId::of(account),
            balance,
        }
    }

    fn xfer(ts: u64, account: u64, amount: i64) -> CryptoTransferRow {
        CryptoTransferRow {
            consensus_timestamp: ts,
            account: EntityId::of(account),
            amount,
        }
    }

    #[test]
    fn test_supply() {
        let rows = [bal(1, 2, 600), bal(1, 3, 400)];
        assert_eq!(supply_total(&rows), 1_000);
        assert_eq!(check_supply(1, &rows, 1_000), None);
        assert_eq!(
            check_supply(1, &rows, 1_007),
            Some(ReconciliationStatus::SupplyMismatch {
                snapshot: 1,
                expected: 1_007,
                actual: 1_000,
                delta: -7,
            })
        );
    }

    #[test]
    fn test_supply_does_not_overflow() {
        let rows = [bal(1, 2, i64::MAX), bal(1, 3, i64::MAX)];
        assert_eq!(supply_total(&rows), 2 * i128::from(i64::MAX));
    }

    #[test]
    fn test_transfers_balance() {
        let start = [bal(10, 2, 600), bal(10, 3, 400)];
        let end = [bal(20, 2, 550), bal(20, 3, 440), bal(20, 4, 10)];
        let transfers = [xfer(15, 2, -50), xfer(15, 3, 40), xfer(15, 4, 10)];
        assert_eq!(check_transfers(10, 20, &start, &end, &transfers), None);
    }

    #[test]
    fn test_transfer_mismatch_reports_first_account() {
        let start = [bal(10, 2, 600), bal(10, 3, 400)];
        let end = [bal(20, 2, 600), bal(20, 3, 400)];
        let transfers = [xfer(15, 3, 5), xfer(15, 2, -5)];
        assert_eq!(
            check_transfers(10, 20, &start, &end, &transfers),
            Some(ReconciliationStatus::TransferMismatch {
                window_start: 10,
                window_end: 20,
                account: EntityId::of(2),
                expected: 595,
                actual: 600,
            })
        );
    }

    #[test]
    fn test_account_missing_from_end_counts_as_zero() {
        let start = [bal(10, 2, 5)];
        let end: [AccountBalanceRow; 0] = [];
        assert!(check_transfers(10, 20, &start, &end, &[]).is_some());
        assert_eq!(check_transfers(10, 20, &start, &end, &[xfer(11, 2, -5)]), None);
    }

    #[test]
    fn test_token_transfers() {
        let tb = |ts, account, balance| TokenBalanceRow {
            consensus_timestamp: ts,
            account: EntityId::of(account),
            token: EntityId::of(500),
            balance,
        };
        let tt = |account, amount| TokenTransferRow {
            consensus_timestamp: 15,
            token: EntityId::of(500),
            account: EntityId::of(account),
            amount,
        };
        let start = [tb(10, 2, 10)];
        let end = [tb(20, 2, 7), tb(20, 3, 3)];
        assert_eq!(
            check_token_transfers(10, 20, &start, &end, &[tt(2, -3), tt(3, 3)]),
            None
        );
        assert!(matches!(
            check_token_transfers(10, 20, &start, &end, &[tt(2, -3)]),
            Some(ReconciliationStatus::TokenTransferMismatch { expected: 0, actual: 3, .. })
        ));
    }
}
