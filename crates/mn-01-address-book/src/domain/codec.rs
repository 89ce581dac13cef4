//! # Address Book Codec
//!
//! The address book system file is a JSON document:
//!
//! ```text
//! {"entries":[{"node_id":0,"public_key":"<hex>","stake":25}, ...]}
//! ```

use crate::domain::entities::{AddressBook, AddressBookEntry};
use crate::domain::errors::AddressBookError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct AddressBookDocument {
    entries: Vec<AddressBookEntry>,
}

impl AddressBook {
    /// Decode and validate an address book file.
    pub fn from_json(bytes: &[u8]) -> Result<Self, AddressBookError> {
        let document: AddressBookDocument = serde_json::from_slice(bytes)
            .map_err(|e| AddressBookError::Malformed(e.to_string()))?;
        AddressBook::new(document.entries)
    }

    /// Encode as an address book file.
    pub fn to_json(&self) -> Vec<u8> {
        let document = AddressBookDocument {
            entries: self.entries().cloned().collect(),
        };
        // Vec, u64 and String fields only; serialization cannot fail.
        serde_json::to_vec(&document).unwrap_or_default()
    }
}

/// Serde adapter for byte vectors as lowercase hex strings.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let value = String::deserialize(deserializer)?;
        let trimmed = value.strip_prefix("0x").unwrap_or(&value);
        hex::decode(trimmed).map_err(serde::de::Error::custom)
    }
}
