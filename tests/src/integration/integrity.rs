//! # Integrity Scenarios
//!
//! Byzantine and faulty sources: forged signatures, tampered bytes, split
//! networks and broken chains. Nothing unauthenticated is ever committed.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ed25519_dalek::Signer;
    use node_runtime::{CycleOutcome, PipelineError};
    use shared_types::{shutdown_channel, FileHash, ShutdownSignal, StreamKind};
    use sm_04_stream_fetcher::{ObjectType, SignatureFile};
    use sm_07_batch_persister::{BatchPersistApi, InMemoryKVStore, LedgerReader, PersistError};
    use std::sync::Arc;

    use crate::fixtures::{
        instance, node_key, pipeline, single_instance, stream_file, test_config, transfer, Network,
    };

    const TX: StreamKind = StreamKind::Transaction;

    #[tokio::test]
    async fn test_forged_signatures_carry_no_stake() {
        let network = Network::new(4);
        let (runtime, _store) = single_instance(&network, &[TX]);

        let honest = stream_file(TX, 100, 200, FileHash::ZERO, &[transfer(100, 1, 2, 3)]);
        let honest_hash = network.publish(&[1, 2], TX, 100, &honest);

        // Nodes 3 and 4 advertise a different file, signed with a key that
        // is not theirs.
        let forged = stream_file(TX, 100, 200, FileHash::ZERO, &[transfer(100, 1, 2, 3_000)]);
        let forged_hash = FileHash::digest(&forged);
        for node in [3, 4] {
            let sig = SignatureFile {
                node_id: node,
                file_hash: forged_hash,
                signature: node_key(99).sign(forged_hash.as_bytes()).to_bytes(),
            };
            network.source.put(TX, node, 100, ObjectType::Data, forged.clone());
            network.source.put(TX, node, 100, ObjectType::Signature, sig.encode());
        }

        assert!(matches!(
            pipeline(&runtime, TX).run_cycle(&ShutdownSignal::never()).await.unwrap(),
            CycleOutcome::Committed { period: 100, .. }
        ));
        let head = runtime.persister().watermark(TX).unwrap().unwrap();
        assert_eq!(head.content_hash, honest_hash);
        let signers: Vec<u64> = runtime
            .persister()
            .signatures(TX, 100)
            .unwrap()
            .iter()
            .map(|row| row.node_id)
            .collect();
        assert_eq!(signers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_tampered_bytes_from_one_source_are_skipped() {
        let network = Network::new(3);
        let (runtime, _store) = single_instance(&network, &[TX]);

        let data = stream_file(TX, 100, 200, FileHash::ZERO, &[transfer(150, 1, 2, 3)]);
        let hash = network.publish_all(TX, 100, &data);
        let mut tampered = data.clone();
        tampered[40] ^= 0x01;
        network.source.put(TX, 1, 100, ObjectType::Data, tampered);

        assert!(matches!(
            pipeline(&runtime, TX).run_cycle(&ShutdownSignal::never()).await.unwrap(),
            CycleOutcome::Committed { period: 100, .. }
        ));
        assert_eq!(
            runtime.persister().watermark(TX).unwrap().unwrap().content_hash,
            hash
        );
    }

    #[tokio::test]
    async fn test_quorum_forms_as_signatures_arrive() {
        let network = Network::new(3);
        let (runtime, _store) = single_instance(&network, &[TX]);
        let download = pipeline(&runtime, TX);
        let shutdown = ShutdownSignal::never();

        let data = stream_file(TX, 100, 200, FileHash::ZERO, &[transfer(100, 1, 2, 3)]);
        network.publish(&[1], TX, 100, &data);
        assert_eq!(
            download.run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::NoQuorum { period: 100 }
        );

        network.publish(&[3], TX, 100, &data);
        assert!(matches!(
            download.run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { period: 100, .. }
        ));
    }

    #[tokio::test]
    async fn test_broken_chain_is_retried_not_fatal() {
        let network = Network::new(3);
        let (runtime, _store) = single_instance(&network, &[TX]);
        let download = pipeline(&runtime, TX);
        let shutdown = ShutdownSignal::never();

        let first = stream_file(TX, 100, 200, FileHash::ZERO, &[]);
        let first_hash = network.publish_all(TX, 100, &first);
        download.run_cycle(&shutdown).await.unwrap();

        let orphan = stream_file(TX, 200, 300, FileHash::digest(b"elsewhere"), &[]);
        network.publish_all(TX, 200, &orphan);
        let err = download.run_cycle(&shutdown).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Persist(PersistError::ChainBroken { period: 200, .. })
        ));
        assert!(!err.is_fatal());
        assert_eq!(
            runtime.persister().watermark(TX).unwrap().unwrap().content_hash,
            first_hash
        );

        // The network republishes the correct successor.
        let fixed = stream_file(TX, 200, 300, first_hash, &[]);
        network.publish_all(TX, 200, &fixed);
        assert!(matches!(
            download.run_cycle(&shutdown).await.unwrap(),
            CycleOutcome::Committed { period: 200, .. }
        ));
    }

    #[tokio::test]
    async fn test_start_hash_mismatch_halts_the_stream() {
        let network = Network::new(3);
        let start = FileHash::digest(b"genesis");
        let mut config = test_config(&[TX]);
        config.start_hashes.insert(TX, start.to_hex());
        let runtime = instance(&network, Arc::new(InMemoryKVStore::new()), config);

        let stray = stream_file(TX, 100, 200, FileHash::ZERO, &[]);
        network.publish_all(TX, 100, &stray);
        let err = pipeline(&runtime, TX)
            .run_cycle(&ShutdownSignal::never())
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(runtime.persister().watermark(TX).unwrap().is_none());

        let anchored = stream_file(TX, 100, 200, start, &[]);
        network.publish_all(TX, 100, &anchored);
        assert!(matches!(
            pipeline(&runtime, TX).run_cycle(&ShutdownSignal::never()).await.unwrap(),
            CycleOutcome::Committed { period: 100, .. }
        ));
    }

    #[tokio::test]
    async fn test_conflict_halts_only_the_affected_kind() {
        let network = Network::new(4);
        let kinds = [StreamKind::Transaction, StreamKind::Event];
        let (runtime, _store) = single_instance(&network, &kinds);

        let a = stream_file(StreamKind::Event, 100, 200, FileHash::ZERO, &[]);
        let b = stream_file(StreamKind::Event, 100, 150, FileHash::ZERO, &[]);
        network.publish(&[1, 2], StreamKind::Event, 100, &a);
        network.publish(&[3, 4], StreamKind::Event, 100, &b);

        let first = stream_file(TX, 100, 200, FileHash::ZERO, &[transfer(100, 1, 2, 1)]);
        let first_hash = network.publish_all(TX, 100, &first);

        let (trigger, signal) = shutdown_channel();
        let mut handles = runtime.spawn(&signal);
        assert_eq!(handles.len(), 3);

        // The event loop gives up on its own.
        let event_loop = handles.remove(1);
        tokio::time::timeout(Duration::from_secs(5), event_loop)
            .await
            .unwrap()
            .unwrap();

        // Transactions keep flowing.
        let second = stream_file(TX, 200, 300, first_hash, &[transfer(200, 2, 1, 1)]);
        network.publish_all(TX, 200, &second);
        let ledger = runtime.persister().clone();
        tokio::time::timeout(Duration::from_secs(10), async {
            while ledger.committed_through(TX).unwrap() != Some(300) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert!(ledger.watermark(StreamKind::Event).unwrap().is_none());

        trigger.trigger();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
