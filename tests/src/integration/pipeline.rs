//! # Pipeline Scenarios
//!
//! Storage → quorum → reader → hash chain → parser → checkpoint, with the
//! in-memory persister standing in for the database.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{encode, name_at, records_at, Network, T0};
    use mn_03_hash_chain::{ChainVerdict, HashChainConfig};
    use mn_05_downloader::{CycleOutcome, DownloaderApi, DownloaderConfig, HaltReason};
    use mn_06_stream_parser::InMemoryPersister;
    use shared_types::{ConsensusTimestamp, Digest, LastValidCheckpoint, StreamType};
    use std::sync::Arc;
    use tokio::sync::watch;

    fn running() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    fn config(stream: StreamType) -> DownloaderConfig {
        DownloaderConfig::for_testing(stream)
    }

    // =========================================================================
    // CHAIN CONTINUITY
    // =========================================================================

    /// Checkpoint at 18:15:00 with hash h1; the next file links to h1 and is
    /// accepted, the one after links to a wrong hash and is rejected.
    #[tokio::test]
    async fn test_continuous_then_discontinuous_from_checkpoint() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        let h1 = encode(stream, &records_at(stream, 0), &Digest::ZERO).hash;
        let checkpoint = LastValidCheckpoint::new(name_at(stream, 0), h1);
        assert_eq!(checkpoint.file_name.to_string(), "2019-08-30T18_15_00Z.rcd");

        let second = encode(stream, &records_at(stream, 1), &h1);
        network.publish(name_at(stream, 1), &second, &[0, 1, 2, 3]);
        let wrong = Digest::new([0xEE; 48]);
        let third = encode(stream, &records_at(stream, 2), &wrong);
        network.publish(name_at(stream, 2), &third, &[0, 1, 2, 3]);

        let persister = Arc::new(InMemoryPersister::new());
        let downloader = network.downloader(config(stream), Arc::clone(&persister));
        let report = downloader
            .run_cycle(Some(checkpoint), &running())
            .await
            .unwrap();

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].verdict, ChainVerdict::Continuous);
        assert_eq!(report.accepted[0].previous_hash, h1);
        assert_eq!(
            report.outcome,
            CycleOutcome::Halted(HaltReason::Discontinuity {
                file: name_at(stream, 2),
                expected: second.hash,
                found: wrong,
            })
        );

        let stored = network.checkpoints.get(stream).unwrap();
        assert_eq!(stored.file_name, name_at(stream, 1));
        assert_eq!(stored.file_hash, second.hash);
        assert_eq!(report.checkpoint, Some(stored));
        assert_eq!(persister.committed_names(), vec![name_at(stream, 1)]);
    }

    /// A chain of N files: genesis first, then continuous throughout.
    #[tokio::test]
    async fn test_chain_from_genesis() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        let files = network.publish_chain(stream, 0, 6, Digest::ZERO, &[0, 1, 2, 3]);

        let persister = Arc::new(InMemoryPersister::new());
        let report = network
            .downloader(config(stream), Arc::clone(&persister))
            .download(&running())
            .await
            .unwrap();

        assert_eq!(report.outcome, CycleOutcome::Completed);
        let verdicts: Vec<_> = report.accepted.iter().map(|f| f.verdict).collect();
        assert_eq!(verdicts[0], ChainVerdict::Genesis);
        assert!(verdicts[1..].iter().all(|v| *v == ChainVerdict::Continuous));
        assert_eq!(persister.record_count(), 6 * 3);
        assert_eq!(
            network.checkpoints.get(stream).unwrap().file_hash,
            files[5].hash
        );
        assert_eq!(network.listener.accepted().len(), 6);
    }

    /// A single mutated byte changes the file's hash, so its successor no
    /// longer links to it.
    #[tokio::test]
    async fn test_mutated_byte_breaks_next_link() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        let original = encode(stream, &records_at(stream, 0), &Digest::ZERO);

        // Byte 4 is the low byte of the producer API version: the file still
        // decodes, but hashes differently.
        let mut mutated = original.clone();
        mutated.bytes[4] ^= 0x02;
        mutated.hash = shared_crypto::sha384(&mutated.bytes);
        assert_ne!(mutated.hash, original.hash);

        network.publish(name_at(stream, 0), &mutated, &[0, 1, 2, 3]);
        let next = encode(stream, &records_at(stream, 1), &original.hash);
        network.publish(name_at(stream, 1), &next, &[0, 1, 2, 3]);

        let report = network
            .downloader(config(stream), Arc::new(InMemoryPersister::new()))
            .download(&running())
            .await
            .unwrap();

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].hash, mutated.hash);
        assert_eq!(
            report.outcome,
            CycleOutcome::Halted(HaltReason::Discontinuity {
                file: name_at(stream, 1),
                expected: mutated.hash,
                found: original.hash,
            })
        );
    }

    /// The same break inside the bypass window is accepted as a known gap.
    #[tokio::test]
    async fn test_bypass_window_accepts_known_gap() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        network.publish_chain(stream, 0, 1, Digest::ZERO, &[0, 1, 2, 3]);
        network.publish_chain(stream, 1, 2, Digest::new([0xEE; 48]), &[0, 1, 2, 3]);

        let mut config = config(stream);
        config.hash_chain = HashChainConfig {
            bypass_until: Some(ConsensusTimestamp::from_parts(T0 + 2, 0)),
        };
        let report = network
            .downloader(config, Arc::new(InMemoryPersister::new()))
            .download(&running())
            .await
            .unwrap();

        let verdicts: Vec<_> = report.accepted.iter().map(|f| f.verdict).collect();
        assert_eq!(
            verdicts,
            vec![
                ChainVerdict::Genesis,
                ChainVerdict::Bypassed,
                ChainVerdict::Continuous
            ]
        );
        assert_eq!(report.outcome, CycleOutcome::Completed);
    }

    // =========================================================================
    // SIGNATURE QUORUM
    // =========================================================================

    /// Four nodes at 25 stake, threshold 1/3 of 100: two signers (50) pass,
    /// one signer (25) does not.
    #[tokio::test]
    async fn test_stake_quorum() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        let first = encode(stream, &records_at(stream, 0), &Digest::ZERO);
        network.publish(name_at(stream, 0), &first, &[1, 2]);
        let second = encode(stream, &records_at(stream, 1), &first.hash);
        network.publish(name_at(stream, 1), &second, &[3]);

        let report = network
            .downloader(config(stream), Arc::new(InMemoryPersister::new()))
            .download(&running())
            .await
            .unwrap();

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].signers, vec![1, 2]);
        assert_eq!(report.accepted[0].valid_weight, 50);
        assert_eq!(
            report.outcome,
            CycleOutcome::Halted(HaltReason::InsufficientStake {
                file: name_at(stream, 1),
                valid_weight: 25,
                total_weight: 100,
            })
        );
        assert_eq!(
            network.checkpoints.get(stream).unwrap().file_name,
            name_at(stream, 0)
        );
        assert_eq!(network.listener.halts().len(), 1);
    }

    /// Stake is weighed, not heads: one heavy node outvotes three light ones.
    #[tokio::test]
    async fn test_heavy_node_alone_reaches_quorum() {
        let network = Network::new(&[70, 10, 10, 10]);
        let stream = StreamType::Event;
        network.publish_chain(stream, 0, 1, Digest::ZERO, &[0]);
        network.publish_chain(stream, 1, 1, Digest::ZERO, &[1, 2, 3]);

        let report = network
            .downloader(config(stream), Arc::new(InMemoryPersister::new()))
            .download(&running())
            .await
            .unwrap();

        assert_eq!(report.accepted.len(), 1);
        assert!(matches!(
            report.outcome,
            CycleOutcome::Halted(HaltReason::InsufficientStake {
                valid_weight: 30,
                total_weight: 100,
                ..
            })
        ));
    }

    // =========================================================================
    // IDEMPOTENCE AND RECOVERY
    // =========================================================================

    /// Re-running over already accepted files neither persists nor moves
    /// the checkpoint again; re-verifying the bytes from scratch yields the
    /// same hash and verdict.
    #[tokio::test]
    async fn test_idempotent_redownload() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Balance;
        network.publish_chain(stream, 0, 3, Digest::ZERO, &[0, 1, 2, 3]);

        let persister = Arc::new(InMemoryPersister::new());
        let downloader = network.downloader(config(stream), Arc::clone(&persister));
        let first = downloader.download(&running()).await.unwrap();
        let saves = network.checkpoints.save_count();
        let second = downloader.download(&running()).await.unwrap();

        assert_eq!(first.accepted.len(), 3);
        assert!(second.accepted.is_empty());
        assert_eq!(second.outcome, CycleOutcome::Completed);
        assert_eq!(network.checkpoints.save_count(), saves);
        assert_eq!(persister.committed_names().len(), 3);

        // Fresh state, same bytes.
        let replay = Network::new(&[25, 25, 25, 25]);
        replay.publish_chain(stream, 0, 3, Digest::ZERO, &[0, 1, 2, 3]);
        let again = replay
            .downloader(config(stream), Arc::new(InMemoryPersister::new()))
            .download(&running())
            .await
            .unwrap();
        let hashes = |r: &mn_05_downloader::CycleReport| {
            r.accepted
                .iter()
                .map(|f| (f.hash, f.verdict))
                .collect::<Vec<_>>()
        };
        assert_eq!(hashes(&again), hashes(&first));
    }

    /// A file that cannot be persisted halts without advancing; the next
    /// cycle picks it up again.
    #[tokio::test]
    async fn test_persist_failure_then_recovery() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        network.publish_chain(stream, 0, 2, Digest::ZERO, &[0, 1, 2, 3]);

        let persister = Arc::new(InMemoryPersister::new());
        persister.fail_next_commits(2);
        let downloader = network.downloader(config(stream), Arc::clone(&persister));

        let failed = downloader.download(&running()).await.unwrap();
        assert!(matches!(
            failed.outcome,
            CycleOutcome::Halted(HaltReason::Persist { .. })
        ));
        assert!(network.checkpoints.get(stream).is_none());
        assert!(persister.committed_names().is_empty());

        let recovered = downloader.download(&running()).await.unwrap();
        assert_eq!(recovered.accepted.len(), 2);
        assert_eq!(
            persister.committed_names(),
            vec![name_at(stream, 0), name_at(stream, 1)]
        );
    }

    /// Streams keep independent chains and checkpoints over one bucket.
    #[tokio::test]
    async fn test_streams_are_independent() {
        let network = Network::new(&[25, 25, 25, 25]);
        network.publish_chain(StreamType::Record, 0, 2, Digest::ZERO, &[0, 1, 2, 3]);
        network.publish_chain(StreamType::Balance, 0, 3, Digest::ZERO, &[0, 1, 2, 3]);
        network.publish_chain(StreamType::Event, 0, 1, Digest::ZERO, &[0]);

        for stream in StreamType::ALL {
            network
                .downloader(config(stream), Arc::new(InMemoryPersister::new()))
                .download(&running())
                .await
                .unwrap();
        }

        assert_eq!(
            network.checkpoints.get(StreamType::Record).unwrap().file_name,
            name_at(StreamType::Record, 1)
        );
        assert_eq!(
            network.checkpoints.get(StreamType::Balance).unwrap().file_name,
            name_at(StreamType::Balance, 2)
        );
        assert!(network.checkpoints.get(StreamType::Event).is_none());
    }

    /// A stored checkpoint survives into a new downloader instance.
    #[tokio::test]
    async fn test_resume_with_new_instance() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        let files = network.publish_chain(stream, 0, 2, Digest::ZERO, &[0, 1, 2, 3]);
        network
            .downloader(config(stream), Arc::new(InMemoryPersister::new()))
            .download(&running())
            .await
            .unwrap();

        network.publish_chain(stream, 2, 2, files[1].hash, &[0, 1, 2, 3]);
        let persister = Arc::new(InMemoryPersister::new());
        let report = network
            .downloader(config(stream), Arc::clone(&persister))
            .download(&running())
            .await
            .unwrap();

        assert_eq!(
            persister.committed_names(),
            vec![name_at(stream, 2), name_at(stream, 3)]
        );
        assert!(report
            .accepted
            .iter()
            .all(|f| f.verdict == ChainVerdict::Continuous));
    }
}
