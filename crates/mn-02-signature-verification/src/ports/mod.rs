//! # Ports Layer
//!
//! - **Inbound**: `SignatureVerificationApi`

pub mod inbound;
