//! Key block derivation using PBKDF2-HMAC-SHA1
//!
//! Offline provisioning only: turns a passphrase into a fresh 80-byte key
//! block when rotating keys. Nothing on the seal/open path calls into this
//! module.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{EnvelopeError, EnvelopeResult};

use super::key_material::{KeyMaterial, KEY_MATERIAL_LEN};

/// Salt used for every provisioned key block
pub const NEXO_KDF_SALT: &str = "AdyenNexoV1Salt";
/// PBKDF2 round count used for every provisioned key block
pub const NEXO_KDF_ITERATIONS: u32 = 4000;

/// Parameters for key derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Salt (UTF-8 text, used as raw bytes)
    pub salt: String,
    /// PBKDF2 round count
    pub iterations: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            salt: NEXO_KDF_SALT.to_string(),
            iterations: NEXO_KDF_ITERATIONS,
        }
    }
}

impl KeyDerivationParams {
    /// Create params with specific values
    pub fn with_values(salt: impl Into<String>, iterations: u32) -> Self {
        Self {
            salt: salt.into(),
            iterations,
        }
    }
}

/// A derived 80-byte key block
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_MATERIAL_LEN],
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_MATERIAL_LEN] {
        &self.key
    }

    /// Base64 form, as accepted by the `env` and `file` key sources
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.key)
    }

    /// Split into MAC key, cipher key and base IV
    pub fn to_key_material(&self) -> KeyMaterial {
        KeyMaterial::from_block(&self.key)
    }
}

/// Derive a key block from a passphrase with the standard salt and rounds
///
/// Deterministic: the same passphrase always yields the same block.
pub fn derive_key(passphrase: &str) -> EnvelopeResult<DerivedKey> {
    derive_key_with_params(passphrase, &KeyDerivationParams::default())
}

/// Derive a key block with explicit parameters
pub fn derive_key_with_params(
    passphrase: &str,
    params: &KeyDerivationParams,
) -> EnvelopeResult<DerivedKey> {
    if params.iterations == 0 {
        return Err(EnvelopeError::Config(
            "Key derivation needs at least one iteration".to_string(),
        ));
    }
    if params.salt.is_empty() {
        return Err(EnvelopeError::Config("Key derivation salt is empty".to_string()));
    }

    let mut key = [0u8; KEY_MATERIAL_LEN];
    pbkdf2::pbkdf2_hmac::<Sha1>(
        passphrase.as_bytes(),
        params.salt.as_bytes(),
        params.iterations,
        &mut key,
    );

    let derived = DerivedKey { key };
    key.zeroize();
    Ok(derived)
}
