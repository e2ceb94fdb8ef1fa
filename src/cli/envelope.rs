//! Envelope CLI commands
//!
//! Seal and open raw payloads, and protect/unprotect whole protocol
//! messages. Input comes from a file or stdin; output goes to stdout.

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::crypto::{Envelope, KeyBundle, SealedPayload};
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::nexo::MessageProtector;

/// Envelope commands
#[derive(Subcommand)]
pub enum EnvelopeCommands {
    /// Seal a payload and print the sealed JSON
    Seal {
        /// Read the payload from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Verify and decrypt sealed JSON and print the payload
    Open {
        /// Read the sealed JSON from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Seal a SaleToPOI message, keeping its header in clear
    Protect {
        /// Read the message from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Verify and decrypt a protected SaleToPOI message
    Unprotect {
        /// Read the message from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Handle an envelope command
pub fn handle_envelope_command(
    keys: &KeyBundle,
    settings: &Settings,
    cmd: EnvelopeCommands,
) -> EnvelopeResult<()> {
    let envelope = Envelope::new(keys);

    match cmd {
        EnvelopeCommands::Seal { input } => {
            let payload = read_input(input.as_ref())?;
            let sealed = envelope.seal(&payload)?;
            let json = serde_json::to_vec_pretty(&sealed)?;
            write_output(&json)
        }
        EnvelopeCommands::Open { input } => {
            let raw = read_input(input.as_ref())?;
            let sealed: SealedPayload = serde_json::from_slice(&raw)
                .map_err(|e| EnvelopeError::Decode(format!("Invalid sealed payload: {}", e)))?;
            let plaintext = envelope.open(&sealed)?;
            write_output(&plaintext)
        }
        EnvelopeCommands::Protect { input } => {
            let message = read_input(input.as_ref())?;
            let protected = protector(envelope, settings).protect(&message)?;
            write_output(&protected)
        }
        EnvelopeCommands::Unprotect { input } => {
            let message = read_input(input.as_ref())?;
            let plaintext = protector(envelope, settings).unprotect(&message)?;
            write_output(&plaintext)
        }
    }
}

fn protector<'k>(envelope: Envelope<'k>, settings: &Settings) -> MessageProtector<'k> {
    MessageProtector::new(envelope).with_encryption(settings.encryption_enabled)
}

/// Read all of `path`, or stdin when no path is given
fn read_input(path: Option<&PathBuf>) -> EnvelopeResult<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .map_err(|e| EnvelopeError::Io(format!("Failed to read {}: {}", path.display(), e))),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .map_err(|e| EnvelopeError::Io(format!("Failed to read stdin: {}", e)))?;
            Ok(buffer)
        }
    }
}

fn write_output(bytes: &[u8]) -> EnvelopeResult<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()?;
    Ok(())
}
