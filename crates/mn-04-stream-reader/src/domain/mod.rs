//! # Domain Layer
//!
//! Binary format, reader, writer and the decoded `StreamFile`.

pub mod cursor;
pub mod errors;
pub mod format;
pub mod reader;
pub mod stream_file;
pub mod writer;
