//! # Ingestion Flows
//!
//! Signed files published by the network end up as committed rows, one
//! file at a time, in chain order.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use node_runtime::CycleOutcome;
    use shared_types::{shutdown_channel, EntityId, FileHash, ShutdownSignal, StreamKind};
    use sm_02_bloom_accumulator::{LogsBloom, BLOOM_BYTES};
    use sm_05_stream_decoder::{DecodedRecord, TransactionPayload};
    use sm_07_batch_persister::{BatchPersistApi, LedgerReader};

    use crate::fixtures::{
        balances, instance, pipeline, single_instance, stream_file, test_config, transfer, Network,
    };

    const TX: StreamKind = StreamKind::Transaction;

    #[tokio::test]
    async fn test_signed_files_are_committed_in_chain_order() {
        let network = Network::new(4);
        let (runtime, _store) = single_instance(&network, &[TX]);
        let download = pipeline(&runtime, TX);
        let shutdown = ShutdownSignal::never();

        let first = stream_file(TX, 100, 200, FileHash::ZERO, &[transfer(110, 2, 3, 5), transfer(150, 3, 4, 1)]);
        let first_hash = network.publish_all(TX, 100, &first);
        let second = stream_file(TX, 200, 300, first_hash, &[transfer(250, 4, 2, 9)]);
        let second_hash = network.publish_all(TX, 200, &second);

        assert_eq!(
            download.run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { period: 100, records: 2 }
        );
        assert_eq!(
            download.run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { period: 200, records: 1 }
        );
        assert_eq!(download.run_cycle(&shutdown).await.unwrap(), CycleOutcome::Idle);

        let ledger = runtime.persister();
        let files = ledger.stream_files(TX).unwrap();
        let hashes: Vec<FileHash> = files.iter().map(|f| f.header.content_hash).collect();
        assert_eq!(hashes, vec![first_hash, second_hash]);
        assert_eq!(files[1].header.previous_hash, first_hash);

        assert_eq!(ledger.crypto_transfers(0, 1_000).unwrap().len(), 6);
        assert_eq!(ledger.transaction(150).unwrap().unwrap().payer, EntityId::of(3));
        assert_eq!(ledger.committed_through(TX).unwrap(), Some(300));
        assert_eq!(ledger.signatures(TX, 100).unwrap().len(), 4);
        assert!(ledger
            .signatures(TX, 200)
            .unwrap()
            .iter()
            .all(|row| row.file_hash == second_hash));
    }

    #[tokio::test]
    async fn test_file_bloom_is_the_union_of_record_blooms() {
        let network = Network::new(3);
        let (runtime, _store) = single_instance(&network, &[TX]);

        let with_bloom = |ts: u64, bit: usize| {
            let mut bloom = LogsBloom::zeroed();
            bloom.set_bit(bit);
            DecodedRecord::transaction(
                ts,
                EntityId::of(1001),
                TransactionPayload {
                    transaction_type: 7,
                    result: 22,
                    fee: 3,
                    transfers: vec![],
                    token_transfers: vec![],
                    bloom: Some(bloom),
                },
            )
        };
        let data = stream_file(
            TX,
            100,
            200,
            FileHash::ZERO,
            &[with_bloom(101, 3), transfer(120, 1, 2, 1), with_bloom(130, BLOOM_BYTES * 8 - 1)],
        );
        network.publish_all(TX, 100, &data);

        pipeline(&runtime, TX)
            .run_cycle(&ShutdownSignal::never())
            .await
            .unwrap();

        let files = runtime.persister().stream_files(TX).unwrap();
        let bloom = files[0].bloom.clone().unwrap();
        assert!(bloom.bit(3));
        assert!(bloom.bit(BLOOM_BYTES * 8 - 1));
        assert_eq!(bloom.bits_set(), 2);
        assert!(runtime.persister().transaction(120).unwrap().unwrap().bloom.is_none());
    }

    #[tokio::test]
    async fn test_restart_resumes_after_watermark() {
        let network = Network::new(3);
        let store = std::sync::Arc::new(sm_07_batch_persister::InMemoryKVStore::new());

        let first = stream_file(TX, 100, 200, FileHash::ZERO, &[transfer(100, 1, 2, 1)]);
        let first_hash = network.publish_all(TX, 100, &first);
        {
            let before = instance(&network, store.clone(), test_config(&[TX]));
            pipeline(&before, TX)
                .run_cycle(&ShutdownSignal::never())
                .await
                .unwrap();
            before.gate().release_all();
        }

        let second = stream_file(TX, 200, 300, first_hash, &[transfer(299, 2, 1, 1)]);
        network.publish_all(TX, 200, &second);

        let after = instance(&network, store, test_config(&[TX]));
        assert_eq!(
            pipeline(&after, TX)
                .run_cycle(&ShutdownSignal::never())
                .await
                .unwrap(),
            CycleOutcome::Committed { period: 200, records: 1 }
        );
        assert_eq!(after.persister().stream_files(TX).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stream_kinds_ingest_independently() {
        let network = Network::new(3);
        let kinds = [StreamKind::Transaction, StreamKind::Balance, StreamKind::Event];
        let (runtime, _store) = single_instance(&network, &kinds);

        network.publish_all(
            StreamKind::Balance,
            100,
            &stream_file(StreamKind::Balance, 100, 101, FileHash::ZERO, &balances(100, &[(2, 700), (3, 300)])),
        );
        network.publish_all(
            StreamKind::Event,
            100,
            &stream_file(
                StreamKind::Event,
                100,
                200,
                FileHash::ZERO,
                &[DecodedRecord::event(105, 1, 0, b"e".to_vec())],
            ),
        );

        let shutdown = ShutdownSignal::never();
        assert_eq!(
            pipeline(&runtime, StreamKind::Transaction).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Idle
        );
        assert!(matches!(
            pipeline(&runtime, StreamKind::Balance).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { period: 100, records: 2 }
        ));
        assert!(matches!(
            pipeline(&runtime, StreamKind::Event).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { period: 100, records: 1 }
        ));

        let ledger = runtime.persister();
        assert_eq!(ledger.balance_snapshots(None, 10).unwrap(), vec![100]);
        assert_eq!(ledger.account_balances(100).unwrap().len(), 2);
        assert_eq!(ledger.event(105).unwrap().unwrap().creator_node, 1);
        assert!(ledger.watermark(StreamKind::Transaction).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_spawned_loops_drain_published_files() {
        let network = Network::new(4);
        let (runtime, _store) = single_instance(&network, &[TX]);

        let mut previous = FileHash::ZERO;
        for i in 0..5u64 {
            let start = 1_000 + i * 100;
            let data = stream_file(TX, start, start + 100, previous, &[transfer(start + 1, 1, 2, 1)]);
            previous = network.publish_all(TX, start, &data);
        }

        let (trigger, signal) = shutdown_channel();
        let handles = runtime.spawn(&signal);

        let ledger = runtime.persister().clone();
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                if ledger.committed_through(TX).unwrap() == Some(1_500) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        trigger.trigger();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .unwrap()
                .unwrap();
        }

        assert_eq!(ledger.stream_files(TX).unwrap().len(), 5);
        assert_eq!(ledger.watermark(TX).unwrap().unwrap().content_hash, previous);
    }
}
