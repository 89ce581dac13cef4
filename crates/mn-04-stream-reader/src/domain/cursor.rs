//! Bounds-checked big-endian reads over a byte slice.

use crate::domain::errors::ReaderError;
use shared_types::{Digest, DIGEST_LEN};

pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], ReaderError> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(ReaderError::Truncated {
                offset: self.offset,
                needed: len - remaining,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ReaderError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ReaderError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn digest(&mut self) -> Result<Digest, ReaderError> {
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(self.take(DIGEST_LEN)?);
        Ok(Digest::new(bytes))
    }
}
