//! # Leadership Scenarios
//!
//! Several mirror instances share one store. Each job runs on exactly one
//! of them at a time, and a commit never lands twice.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use node_runtime::{download_job, CycleOutcome};
    use shared_types::{shutdown_channel, FileHash, ShutdownSignal, StreamKind};
    use sm_07_batch_persister::{BatchPersistApi, InMemoryKVStore, KeyValueStore, LedgerReader};

    use crate::fixtures::{instance, pipeline, stream_file, test_config, transfer, Network};

    const TX: StreamKind = StreamKind::Transaction;

    fn shared_store() -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryKVStore::new())
    }

    #[tokio::test]
    async fn test_follower_does_not_commit() {
        let network = Network::new(3);
        let store = shared_store();
        let a = instance(&network, store.clone(), test_config(&[TX]));
        let b = instance(&network, store, test_config(&[TX]));

        let data = stream_file(TX, 100, 200, FileHash::ZERO, &[transfer(100, 1, 2, 1)]);
        network.publish_all(TX, 100, &data);

        let shutdown = ShutdownSignal::never();
        assert!(matches!(
            pipeline(&a, TX).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { .. }
        ));
        assert_eq!(
            pipeline(&b, TX).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::NotLeader
        );
        assert_eq!(b.persister().stream_files(TX).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_released_lease_fails_over() {
        let network = Network::new(3);
        let store = shared_store();
        let a = instance(&network, store.clone(), test_config(&[TX]));
        let b = instance(&network, store, test_config(&[TX]));
        let shutdown = ShutdownSignal::never();

        let first = stream_file(TX, 100, 200, FileHash::ZERO, &[]);
        let first_hash = network.publish_all(TX, 100, &first);
        pipeline(&a, TX).run_cycle(&shutdown).await.unwrap();
        a.gate().release(&download_job(TX));

        let second = stream_file(TX, 200, 300, first_hash, &[]);
        network.publish_all(TX, 200, &second);
        assert_eq!(
            pipeline(&b, TX).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { period: 200, records: 0 }
        );
        assert_eq!(
            pipeline(&a, TX).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::NotLeader
        );
    }

    #[tokio::test]
    async fn test_jobs_lead_independently() {
        let network = Network::new(3);
        let store = shared_store();
        let a = instance(&network, store.clone(), test_config(&[TX]));
        let b = instance(&network, store, test_config(&[StreamKind::Event]));
        let shutdown = ShutdownSignal::never();

        network.publish_all(TX, 100, &stream_file(TX, 100, 200, FileHash::ZERO, &[]));
        network.publish_all(
            StreamKind::Event,
            100,
            &stream_file(StreamKind::Event, 100, 200, FileHash::ZERO, &[]),
        );

        assert!(matches!(
            pipeline(&a, TX).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { .. }
        ));
        assert!(matches!(
            pipeline(&b, StreamKind::Event).run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { .. }
        ));
    }

    #[tokio::test]
    async fn test_competing_instances_commit_each_file_once() {
        let network = Network::new(4);
        let store = shared_store();
        let instances: Vec<_> = (0..3)
            .map(|_| instance(&network, store.clone(), test_config(&[TX])))
            .collect();

        let mut previous = FileHash::ZERO;
        for i in 0..6u64 {
            let start = 100 + i * 100;
            let data = stream_file(TX, start, start + 100, previous, &[transfer(start, 1, 2, 1)]);
            previous = network.publish_all(TX, start, &data);
        }

        let (trigger, signal) = shutdown_channel();
        let handles: Vec<_> = instances
            .iter()
            .flat_map(|runtime| runtime.spawn(&signal))
            .collect();

        let ledger = instances[0].persister().clone();
        tokio::time::timeout(Duration::from_secs(10), async {
            while ledger.committed_through(TX).unwrap() != Some(700) {
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

        assert_eq!(ledger.stream_files(TX).unwrap().len(), 6);
        assert_eq!(ledger.crypto_transfers(0, 10_000).unwrap().len(), 12);
        assert_eq!(
            ledger.watermark(TX).unwrap().map(|h| h.content_hash),
            Some(previous)
        );
    }
}
