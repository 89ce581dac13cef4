//! # Inbound Ports

use crate::domain::entities::ParseSummary;
use crate::domain::errors::ParserError;
use async_trait::async_trait;
use mn_04_stream_reader::StreamFile;

/// Parser API - inbound port.
#[async_trait]
pub trait StreamParserApi: Send + Sync {
    /// Persist every record of a verified file, then commit it.
    ///
    /// Returns only once the file is durably committed. On error nothing
    /// of the file is committed.
    async fn parse(&self, file: &StreamFile) -> Result<ParseSummary, ParserError>;
}
