//! # Signature Scheme Dispatch
//!
//! Signature files carry a one-byte type tag. This module maps the tag to a
//! concrete algorithm and verifies raw byte inputs against it.

use crate::{
    CryptoError, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, Secp256k1KeyPair,
    Secp256k1PublicKey, Secp256k1Signature,
};

/// Signature algorithm named by a signature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    /// Ed25519 over the raw message.
    Ed25519,
    /// ECDSA secp256k1 over SHA-256 of the message.
    EcdsaSecp256k1,
}

impl SignatureScheme {
    /// Wire tag.
    pub fn as_u8(self) -> u8 {
        match self {
            SignatureScheme::Ed25519 => 0x01,
            SignatureScheme::EcdsaSecp256k1 => 0x02,
        }
    }

    /// Parse a wire tag.
    pub fn from_u8(tag: u8) -> Result<Self, CryptoError> {
        match tag {
            0x01 => Ok(SignatureScheme::Ed25519),
            0x02 => Ok(SignatureScheme::EcdsaSecp256k1),
            other => Err(CryptoError::UnknownScheme(other)),
        }
    }
}

/// Verify `signature` over `message` with a raw public key.
pub fn verify_signature(
    scheme: SignatureScheme,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    match scheme {
        SignatureScheme::Ed25519 => {
            let key = Ed25519PublicKey::from_slice(public_key)?;
            key.verify(message, &Ed25519Signature::from_slice(signature)?)
        }
        SignatureScheme::EcdsaSecp256k1 => {
            let key = Secp256k1PublicKey::from_sec1_bytes(public_key)?;
            key.verify(message, &Secp256k1Signature::from_slice(signature)?)
        }
    }
}

/// A node signing key of either scheme.
///
/// Used to produce signature files for fixtures and local tooling.
pub enum NodeKeyPair {
    /// Ed25519 key.
    Ed25519(Ed25519KeyPair),
    /// secp256k1 key.
    Secp256k1(Secp256k1KeyPair),
}

impl NodeKeyPair {
    /// Deterministic Ed25519 key from a seed.
    pub fn ed25519_from_seed(seed: [u8; 32]) -> Self {
        NodeKeyPair::Ed25519(Ed25519KeyPair::from_seed(seed))
    }

    /// Deterministic secp256k1 key from secret bytes.
    pub fn secp256k1_from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        Secp256k1KeyPair::from_bytes(bytes).map(NodeKeyPair::Secp256k1)
    }

    /// Scheme of this key.
    pub fn scheme(&self) -> SignatureScheme {
        match self {
            NodeKeyPair::Ed25519(_) => SignatureScheme::Ed25519,
            NodeKeyPair::Secp256k1(_) => SignatureScheme::EcdsaSecp256k1,
        }
    }

    /// Public key bytes as stored in the address book.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            NodeKeyPair::Ed25519(kp) => kp.public_key().as_bytes().to_vec(),
            NodeKeyPair::Secp256k1(kp) => kp.public_key().as_bytes().to_vec(),
        }
    }

    /// Sign `message`, returning raw signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            NodeKeyPair::Ed25519(kp) => kp.sign(message).as_bytes().to_vec(),
            NodeKeyPair::Secp256k1(kp) => kp.sign(message).as_bytes().to_vec(),
        }
    }
}
