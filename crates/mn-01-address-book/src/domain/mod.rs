//! # Domain Layer
//!
//! Address book snapshot, its wire codec and errors. No I/O.

pub mod codec;
pub mod entities;
pub mod errors;

pub use entities::{AddressBook, AddressBookEntry, ADDRESS_BOOK_FILE_ID};
pub use errors::AddressBookError;
