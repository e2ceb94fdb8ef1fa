//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the envelope library.

pub mod envelope;
pub mod key;

pub use envelope::{handle_envelope_command, EnvelopeCommands};
pub use key::handle_derive_key;
