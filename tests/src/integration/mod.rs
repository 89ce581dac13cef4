//! # Integration Tests

pub mod fixtures;

mod address_book;
mod pipeline;
mod stream_format;
