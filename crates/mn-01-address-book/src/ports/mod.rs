//! # Ports Layer
//!
//! - **Inbound**: `AddressBookApi` - read access for verifiers

pub mod inbound;

pub use inbound::AddressBookApi;
