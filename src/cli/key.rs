//! Key provisioning CLI commands
//!
//! Derives a new key block from a passphrase for key rotation.

use crate::crypto::{derive_key, SecureString};
use crate::error::{EnvelopeError, EnvelopeResult};

/// Minimum accepted passphrase length
const MIN_PASSPHRASE_LEN: usize = 8;

/// Derive a key block and print it base64 encoded
///
/// Reads the passphrase from `passphrase_env` when given, otherwise prompts
/// twice on the terminal.
pub fn handle_derive_key(passphrase_env: Option<&str>) -> EnvelopeResult<()> {
    let passphrase = match passphrase_env {
        Some(var) => SecureString::new(std::env::var(var).map_err(|e| {
            EnvelopeError::Config(format!("Passphrase variable {} unavailable: {}", var, e))
        })?),
        None => prompt_new_passphrase()?,
    };

    if passphrase.len() < MIN_PASSPHRASE_LEN {
        return Err(EnvelopeError::Config(format!(
            "Passphrase must be at least {} characters",
            MIN_PASSPHRASE_LEN
        )));
    }

    let key = derive_key(&passphrase)?;
    println!("{}", key.to_base64());
    eprintln!("Store this block in a key file or environment variable and bump the key version.");

    Ok(())
}

/// Prompt for a new passphrase with confirmation
fn prompt_new_passphrase() -> EnvelopeResult<SecureString> {
    loop {
        let pass1 = prompt_passphrase("Enter passphrase: ")?;

        if pass1.len() < MIN_PASSPHRASE_LEN {
            eprintln!(
                "Passphrase must be at least {} characters. Please try again.",
                MIN_PASSPHRASE_LEN
            );
            continue;
        }

        let pass2 = prompt_passphrase("Confirm passphrase: ")?;

        if pass1.as_str() != pass2.as_str() {
            eprintln!("Passphrases do not match. Please try again.");
            continue;
        }

        return Ok(pass1);
    }
}

/// Prompt for a passphrase (hidden input)
fn prompt_passphrase(prompt: &str) -> EnvelopeResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| EnvelopeError::Io(format!("Failed to read passphrase: {}", e)))
}
