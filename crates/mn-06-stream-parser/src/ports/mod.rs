//! # Ports Layer
//!
//! - **Inbound**: `StreamParserApi`, called by the downloader
//! - **Outbound**: `Persister`, implemented by storage backends

pub mod inbound;
pub mod outbound;
