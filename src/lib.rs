//! nexo-envelope - Secure message envelope for payment-terminal messages
//!
//! This library seals protocol messages exchanged with a payment terminal
//! over an untrusted transport. Payloads are encrypted with AES-256-CBC under
//! a per-message IV and authenticated with HMAC-SHA256 over the plaintext;
//! the MAC, nonce and key identity travel in a side-channel security trailer.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `crypto`: Key block layout, key bundle, the envelope, key provisioning
//! - `nexo`: Sealing whole SaleToPOI request/response messages
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `cli`: Command handlers for the `nexo-envelope` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use nexo_envelope::crypto::{Envelope, KeyBundle};
//!
//! let keys = KeyBundle::install(KeyBundle::provisioned())?;
//! let envelope = Envelope::new(keys);
//!
//! let sealed = envelope.seal(b"{\"SaleToPOIRequest\":{}}")?;
//! let plaintext = envelope.open(&sealed)?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod nexo;

pub use error::{EnvelopeError, EnvelopeResult};
