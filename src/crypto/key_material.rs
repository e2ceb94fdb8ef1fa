//! Positional layout of the 80-byte key block
//!
//! A provisioned key block is split into three disjoint sub-keys:
//! `[0, 32)` MAC key, `[32, 64)` cipher key, `[64, 80)` base IV.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{EnvelopeError, EnvelopeResult};

/// Length of the HMAC-SHA256 key in bytes
pub const MAC_KEY_LEN: usize = 32;
/// Length of the AES-256 key in bytes
pub const CIPHER_KEY_LEN: usize = 32;
/// Length of the base IV (one AES block) in bytes
pub const IV_LEN: usize = 16;
/// Total length of a key block
pub const KEY_MATERIAL_LEN: usize = MAC_KEY_LEN + CIPHER_KEY_LEN + IV_LEN;

/// The three sub-keys of a provisioned key block
///
/// Immutable once built. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    mac_key: [u8; MAC_KEY_LEN],
    cipher_key: [u8; CIPHER_KEY_LEN],
    base_iv: [u8; IV_LEN],
}

impl KeyMaterial {
    /// Split an 80-byte block into its sub-keys
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyLength` if `block` is not exactly
    /// [`KEY_MATERIAL_LEN`] bytes.
    pub fn from_bytes(block: &[u8]) -> EnvelopeResult<Self> {
        let block: &[u8; KEY_MATERIAL_LEN] =
            block
                .try_into()
                .map_err(|_| EnvelopeError::InvalidKeyLength {
                    expected: KEY_MATERIAL_LEN,
                    actual: block.len(),
                })?;
        Ok(Self::from_block(block))
    }

    /// Split a block whose length is already fixed by its type
    pub fn from_block(block: &[u8; KEY_MATERIAL_LEN]) -> Self {
        let (mac, rest) = block.split_at(MAC_KEY_LEN);
        let (cipher, iv) = rest.split_at(CIPHER_KEY_LEN);

        let mut material = Self {
            mac_key: [0u8; MAC_KEY_LEN],
            cipher_key: [0u8; CIPHER_KEY_LEN],
            base_iv: [0u8; IV_LEN],
        };
        material.mac_key.copy_from_slice(mac);
        material.cipher_key.copy_from_slice(cipher);
        material.base_iv.copy_from_slice(iv);
        material
    }

    /// HMAC-SHA256 key, bytes `[0, 32)`
    pub fn mac_key(&self) -> &[u8; MAC_KEY_LEN] {
        &self.mac_key
    }

    /// AES-256 key, bytes `[32, 64)`
    pub fn cipher_key(&self) -> &[u8; CIPHER_KEY_LEN] {
        &self.cipher_key
    }

    /// Base IV, bytes `[64, 80)`
    pub fn base_iv(&self) -> &[u8; IV_LEN] {
        &self.base_iv
    }
}

// Never print key bytes
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &KEY_MATERIAL_LEN)
            .finish()
    }
}
