//! # Signature File Codec
//!
//! ```text
//! u8 0x04 FILE_HASH | [48] data file hash
//! u8 0x03 SIGNATURE | u8 signature type | u32 len | signature[len]
//! ```
//!
//! Integers are big-endian. The node id is not stored in the file; it comes
//! from the object key.

use crate::domain::entities::SignatureFile;
use crate::domain::errors::SignatureFileError;
use shared_crypto::SignatureScheme;
use shared_types::{Digest, NodeId, DIGEST_LEN};

/// Marker preceding the declared file hash.
pub const FILE_HASH_MARKER: u8 = 0x04;

/// Marker preceding the signature.
pub const SIGNATURE_MARKER: u8 = 0x03;

/// Upper bound on a signature length.
pub const MAX_SIGNATURE_LEN: u32 = 1024;

struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], SignatureFileError> {
        let remaining = self.bytes.len() - self.offset;
        if remaining < len {
            return Err(SignatureFileError::Truncated {
                offset: self.offset,
                needed: len - remaining,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, SignatureFileError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, SignatureFileError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn expect_marker(&mut self, expected: u8) -> Result<(), SignatureFileError> {
        let offset = self.offset;
        let found = self.u8()?;
        if found != expected {
            return Err(SignatureFileError::UnexpectedMarker {
                offset,
                expected,
                found,
            });
        }
        Ok(())
    }
}

impl SignatureFile {
    /// Decode a signature file fetched from `node_id`'s directory.
    pub fn decode(node_id: NodeId, bytes: &[u8]) -> Result<Self, SignatureFileError> {
        let mut cursor = Cursor { bytes, offset: 0 };

        cursor.expect_marker(FILE_HASH_MARKER)?;
        let hash = cursor.take(DIGEST_LEN)?;

        cursor.expect_marker(SIGNATURE_MARKER)?;
        let tag = cursor.u8()?;
        let scheme = SignatureScheme::from_u8(tag)
            .map_err(|_| SignatureFileError::UnknownSignatureType(tag))?;

        let len = cursor.u32()?;
        if len == 0 || len > MAX_SIGNATURE_LEN {
            return Err(SignatureFileError::InvalidSignatureLength(len));
        }
        let signature = cursor.take(len as usize)?.to_vec();

        let trailing = bytes.len() - cursor.offset;
        if trailing > 0 {
            return Err(SignatureFileError::TrailingBytes(trailing));
        }

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(hash);

        Ok(Self {
            node_id,
            file_hash: Digest::new(digest),
            signature,
            scheme,
        })
    }

    /// Encode in the on-storage layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + DIGEST_LEN + 2 + 4 + self.signature.len());
        out.push(FILE_HASH_MARKER);
        out.extend_from_slice(self.file_hash.as_bytes());
        out.push(SIGNATURE_MARKER);
        out.push(self.scheme.as_u8());
        out.extend_from_slice(&(self.signature.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.signature);
        out
    }
}
