//! # Address Book Refresh
//!
//! Record files carrying writes to the address book system file change the
//! node set used for the next cycle's quorum.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{encode, file_write, name_at, records_at, transfer, Network, T0};
    use importer_runtime::adapters::AddressBookPersister;
    use mn_01_address_book::{AddressBookApi, ADDRESS_BOOK_FILE_ID};
    use mn_05_downloader::{CycleOutcome, DownloaderApi, DownloaderConfig};
    use mn_06_stream_parser::InMemoryPersister;
    use shared_types::{ConsensusTimestamp, Digest, StreamType};
    use std::sync::Arc;
    use tokio::sync::watch;

    fn running() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    fn persister(network: &Network) -> Arc<AddressBookPersister<InMemoryPersister>> {
        Arc::new(AddressBookPersister::new(
            InMemoryPersister::new(),
            Arc::clone(&network.address_book),
        ))
    }

    /// A node added by a file update signs the following file on its own.
    #[tokio::test]
    async fn test_file_update_admits_new_node() {
        let network = Network::with_spare_keys(&[25, 25, 25, 25], 1);
        let stream = StreamType::Record;
        let new_book = network.book(&[10, 10, 10, 10, 60]).to_json();

        let at = ConsensusTimestamp::from_parts(T0, 0);
        let first = encode(
            stream,
            &[
                transfer(at, 5),
                file_write(ConsensusTimestamp::from_parts(T0, 1), ADDRESS_BOOK_FILE_ID, &new_book, false),
            ],
            &Digest::ZERO,
        );
        network.publish(name_at(stream, 0), &first, &[0, 1, 2, 3]);
        let second = encode(stream, &records_at(stream, 1), &first.hash);
        network.publish(name_at(stream, 1), &second, &[4]);

        let persister = persister(&network);
        let downloader = network.downloader(DownloaderConfig::for_testing(stream), Arc::clone(&persister));

        // The old book does not list node 4, so only the first file is seen.
        let report = downloader.download(&running()).await.unwrap();
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.outcome, CycleOutcome::Completed);
        let book = network.address_book.current().unwrap();
        assert_eq!(book.len(), 5);
        assert_eq!(book.total_stake(), 100);

        let report = downloader.download(&running()).await.unwrap();
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].signers, vec![4]);
        assert_eq!(report.accepted[0].valid_weight, 60);
        assert_eq!(persister.inner().committed_names().len(), 2);
    }

    /// An update split over two files takes effect once the append lands.
    #[tokio::test]
    async fn test_update_and_append_span_files() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        let new_book = network.book(&[40, 30, 20, 10]).to_json();
        let (head, tail) = new_book.split_at(new_book.len() / 2);

        let first = encode(
            stream,
            &[file_write(ConsensusTimestamp::from_parts(T0, 0), ADDRESS_BOOK_FILE_ID, head, false)],
            &Digest::ZERO,
        );
        network.publish(name_at(stream, 0), &first, &[0, 1, 2, 3]);
        let second = encode(
            stream,
            &[file_write(ConsensusTimestamp::from_parts(T0 + 2, 0), ADDRESS_BOOK_FILE_ID, tail, true)],
            &first.hash,
        );
        network.publish(name_at(stream, 1), &second, &[0, 1, 2, 3]);

        let mut config = DownloaderConfig::for_testing(stream);
        config.batch_size = 1;
        let downloader = network.downloader(config, persister(&network));

        downloader.download(&running()).await.unwrap();
        assert_eq!(network.address_book.current().unwrap().total_stake(), 100);
        assert_eq!(network.address_book.current().unwrap().weight_of(0), Some(25));
        assert!(network.address_book.has_staged());

        downloader.download(&running()).await.unwrap();
        assert_eq!(network.address_book.current().unwrap().weight_of(0), Some(40));
        assert!(!network.address_book.has_staged());
    }

    /// A rejected file's address book write never takes effect.
    #[tokio::test]
    async fn test_update_in_unaccepted_file_is_ignored() {
        let network = Network::new(&[25, 25, 25, 25]);
        let stream = StreamType::Record;
        let new_book = network.book(&[1]).to_json();
        let file = encode(
            stream,
            &[file_write(ConsensusTimestamp::from_parts(T0, 0), ADDRESS_BOOK_FILE_ID, &new_book, false)],
            &Digest::ZERO,
        );
        network.publish(name_at(stream, 0), &file, &[0]);

        let report = network
            .downloader(DownloaderConfig::for_testing(stream), persister(&network))
            .download(&running())
            .await
            .unwrap();

        assert!(matches!(report.outcome, CycleOutcome::Halted(_)));
        assert_eq!(network.address_book.current().unwrap().len(), 4);
        assert!(!network.address_book.has_staged());
    }
}
