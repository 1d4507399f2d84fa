//! # Reconciliation Over Ingested History
//!
//! Balance snapshots and transactions go through the full download path,
//! then the engine audits the committed rows.

#[cfg(test)]
mod tests {
    use node_runtime::{CycleOutcome, MirrorRuntime};
    use shared_types::{EntityId, FileHash, ShutdownSignal, StreamKind};
    use sm_05_stream_decoder::{DecodedRecord, TokenBalance, TokenTransfer, TransactionPayload};
    use sm_08_reconciliation::{
        describe, KvRunStore, ReconciliationApi, ReconciliationStatus, RunStore,
    };

    use crate::fixtures::{
        balances, pipeline, single_instance, stream_file, transfer, Network,
    };

    const TX: StreamKind = StreamKind::Transaction;
    const BAL: StreamKind = StreamKind::Balance;

    /// Run `kind`'s pipeline until nothing is left to commit.
    async fn drain(runtime: &MirrorRuntime, kind: StreamKind) {
        let download = pipeline(runtime, kind);
        let shutdown = ShutdownSignal::never();
        for _ in 0..32 {
            match download.run_cycle(&shutdown).await.unwrap() {
                CycleOutcome::Committed { .. } | CycleOutcome::AlreadyApplied { .. } => {}
                _ => return,
            }
        }
    }

    /// Publish a chain of balance snapshots, one file per snapshot.
    fn publish_snapshots(network: &Network, snapshots: &[(u64, Vec<DecodedRecord>)]) {
        let mut previous = FileHash::ZERO;
        for (ts, rows) in snapshots {
            let data = stream_file(BAL, *ts, ts + 1, previous, rows);
            previous = network.publish_all(BAL, *ts, &data);
        }
    }

    #[tokio::test]
    async fn test_ingested_history_reconciles() {
        let network = Network::new(3);
        let (runtime, store) = single_instance(&network, &[TX, BAL]);

        publish_snapshots(
            &network,
            &[
                (100, balances(100, &[(2, 600), (3, 400)])),
                (200, balances(200, &[(2, 550), (3, 450)])),
            ],
        );
        let moves = stream_file(
            TX,
            100,
            300,
            FileHash::ZERO,
            &[transfer(150, 2, 3, 60), transfer(180, 3, 2, 10)],
        );
        network.publish_all(TX, 100, &moves);

        drain(&runtime, BAL).await;
        drain(&runtime, TX).await;

        let run = runtime.reconciliation().run_once().unwrap().unwrap();
        assert_eq!(run.status, ReconciliationStatus::Success, "{}", describe(&run));
        assert_eq!((run.window_start, run.window_end), (100, 200));

        let stored = KvRunStore::new(store).latest().unwrap().unwrap();
        assert_eq!(stored, run);
        assert_eq!(runtime.reconciliation().run_once().unwrap(), None);
    }

    #[tokio::test]
    async fn test_audit_waits_for_transaction_coverage() {
        let network = Network::new(3);
        let (runtime, _store) = single_instance(&network, &[TX, BAL]);

        publish_snapshots(
            &network,
            &[
                (100, balances(100, &[(2, 1_000)])),
                (200, balances(200, &[(2, 1_000)])),
            ],
        );
        drain(&runtime, BAL).await;
        assert_eq!(runtime.reconciliation().run_once().unwrap(), None);

        network.publish_all(TX, 100, &stream_file(TX, 100, 250, FileHash::ZERO, &[]));
        drain(&runtime, TX).await;

        let run = runtime.reconciliation().run_once().unwrap().unwrap();
        assert_eq!(run.status, ReconciliationStatus::Success);
    }

    #[tokio::test]
    async fn test_drift_is_reported_without_stopping_ingestion() {
        let network = Network::new(3);
        let (runtime, _store) = single_instance(&network, &[TX, BAL]);

        publish_snapshots(
            &network,
            &[
                (100, balances(100, &[(2, 600), (3, 400)])),
                (200, balances(200, &[(2, 600), (3, 393)])),
            ],
        );
        let first = stream_file(TX, 100, 300, FileHash::ZERO, &[]);
        let first_hash = network.publish_all(TX, 100, &first);
        drain(&runtime, BAL).await;
        drain(&runtime, TX).await;

        let run = runtime.reconciliation().run_once().unwrap().unwrap();
        assert_eq!(
            run.status,
            ReconciliationStatus::SupplyMismatch {
                snapshot: 200,
                expected: 1_000,
                actual: 993,
                delta: -7,
            }
        );
        assert!(describe(&run).contains("snapshot 200"));

        let next = stream_file(TX, 300, 400, first_hash, &[transfer(350, 2, 3, 1)]);
        network.publish_all(TX, 300, &next);
        assert!(matches!(
            pipeline(&runtime, TX)
                .run_cycle(&ShutdownSignal::never())
                .await
                .unwrap(),
            CycleOutcome::Committed { period: 300, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_transfer_is_pinned_to_account() {
        let network = Network::new(3);
        let (runtime, _store) = single_instance(&network, &[TX, BAL]);

        publish_snapshots(
            &network,
            &[
                (100, balances(100, &[(2, 600), (3, 400)])),
                (200, balances(200, &[(2, 500), (3, 500)])),
            ],
        );
        // Only part of the movement was exported.
        network.publish_all(
            TX,
            100,
            &stream_file(TX, 100, 300, FileHash::ZERO, &[transfer(150, 2, 3, 40)]),
        );
        drain(&runtime, BAL).await;
        drain(&runtime, TX).await;

        let run = runtime.reconciliation().run_once().unwrap().unwrap();
        assert_eq!(
            run.status,
            ReconciliationStatus::TransferMismatch {
                window_start: 100,
                window_end: 200,
                account: EntityId::of(2),
                expected: 560,
                actual: 500,
            }
        );
    }

    #[tokio::test]
    async fn test_token_movements_are_audited() {
        let network = Network::new(3);
        let (runtime, _store) = single_instance(&network, &[TX, BAL]);
        let token = EntityId::of(5_000);

        let snapshot = |ts: u64, a: i64, b: i64| {
            vec![
                DecodedRecord::balance(ts, EntityId::of(2), 500, vec![TokenBalance { token, balance: a }]),
                DecodedRecord::balance(ts, EntityId::of(3), 500, vec![TokenBalance { token, balance: b }]),
            ]
        };
        publish_snapshots(&network, &[(100, snapshot(100, 70, 30)), (200, snapshot(200, 65, 30))]);

        let token_move = DecodedRecord::transaction(
            150,
            EntityId::of(2),
            TransactionPayload {
                transaction_type: 30,
                result: 22,
                fee: 0,
                transfers: vec![],
                token_transfers: vec![
                    TokenTransfer { token, account: EntityId::of(2), amount: -5 },
                    TokenTransfer { token, account: EntityId::of(3), amount: 5 },
                ],
                bloom: None,
            },
        );
        network.publish_all(TX, 100, &stream_file(TX, 100, 300, FileHash::ZERO, &[token_move]));
        drain(&runtime, BAL).await;
        drain(&runtime, TX).await;

        let run = runtime.reconciliation().run_once().unwrap().unwrap();
        assert_eq!(
            run.status,
            ReconciliationStatus::TokenTransferMismatch {
                window_start: 100,
                window_end: 200,
                account: EntityId::of(3),
                token,
                expected: 35,
                actual: 30,
            }
        );
        assert!(run.status.is_failure());
    }
}
