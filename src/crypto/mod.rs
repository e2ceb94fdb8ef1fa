//! Cryptographic functions for nexo-envelope
//!
//! Provides the AES-256-CBC + HMAC-SHA256 envelope, the 80-byte key block
//! layout, the process-wide key bundle, and PBKDF2 key provisioning.

pub mod bundle;
pub mod envelope;
pub mod key_derivation;
pub mod key_material;
pub mod secure_memory;

pub use bundle::KeyBundle;
pub use envelope::{Envelope, SealedPayload, SecurityTrailer, CRYPTO_VERSION};
pub use key_derivation::{derive_key, derive_key_with_params, DerivedKey, KeyDerivationParams};
pub use key_material::{KeyMaterial, KEY_MATERIAL_LEN};
pub use secure_memory::SecureString;
