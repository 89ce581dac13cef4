//! # Ports Layer
//!
//! - **Inbound**: `DownloaderApi`, driven by the runtime's polling loop
//! - **Outbound**: `StorageClient`, `CheckpointStore`, `StreamListener`

pub mod inbound;
pub mod outbound;
