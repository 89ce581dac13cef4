//! # SHA-384 Hashing
//!
//! Content hashes for stream files. Every chain link is a 48-byte SHA-384
//! digest.

use sha2::{Digest as _, Sha384};
use shared_types::{Digest, DIGEST_LEN};

/// Stateful SHA-384 hasher.
#[derive(Clone, Default)]
pub struct Sha384Hasher {
    inner: Sha384,
}

impl Sha384Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha384::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return digest.
    pub fn finalize(self) -> Digest {
        to_digest(&self.inner.finalize())
    }
}

fn to_digest(output: &[u8]) -> Digest {
    let mut bytes = [0u8; DIGEST_LEN];
    bytes.copy_from_slice(output);
    Digest::new(bytes)
}

/// Hash data with SHA-384 (one-shot).
pub fn sha384(data: &[u8]) -> Digest {
    to_digest(&Sha384::digest(data))
}

/// Hash multiple inputs as if concatenated.
pub fn sha384_many(inputs: &[&[u8]]) -> Digest {
    let mut hasher = Sha384Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}
