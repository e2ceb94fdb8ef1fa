//! Process-wide key bundle
//!
//! A key bundle pairs [`KeyMaterial`] with the identifier and version that
//! go into every security trailer. One bundle is loaded at startup from the
//! configured [`KeySource`] and installed for the lifetime of the process;
//! tests and tools build their own bundles and hand them to
//! [`Envelope::new`](super::Envelope::new) directly.

use std::path::Path;
use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::Zeroizing;

use crate::config::settings::{KeySettings, KeySource};
use crate::error::{EnvelopeError, EnvelopeResult};

use super::key_material::{KeyMaterial, KEY_MATERIAL_LEN};

/// Identifier of the embedded key block
pub const PROVISIONED_KEY_IDENTIFIER: &str = "ios";
/// Version of the embedded key block
pub const PROVISIONED_KEY_VERSION: u32 = 1;

/// Embedded production key block
///
/// Generated with `nexo-envelope derive-key`. Bump the identifier/version
/// above whenever it is replaced.
const PROVISIONED_KEY_BLOCK: [u8; KEY_MATERIAL_LEN] = [
    7, 138, 67, 38, 42, 42, 72, 205, 83, 133, 251, 245, 79, 63, 82, 106, 141, 121, 32, 161, 44,
    80, 249, 206, 240, 203, 127, 64, 130, 162, 7, 33, 184, 62, 9, 97, 167, 42, 58, 146, 139, 148,
    85, 202, 226, 16, 131, 31, 244, 133, 233, 230, 174, 71, 75, 53, 67, 203, 214, 51, 132, 223,
    251, 72, 230, 94, 158, 178, 34, 15, 228, 110, 99, 230, 255, 150, 196, 39, 188, 224,
];

static INSTALLED: OnceLock<KeyBundle> = OnceLock::new();

/// Key material plus the identity written into trailers
#[derive(Debug, Clone)]
pub struct KeyBundle {
    identifier: String,
    version: u32,
    material: KeyMaterial,
}

impl KeyBundle {
    /// Create a bundle from already-split key material
    pub fn new(identifier: impl Into<String>, version: u32, material: KeyMaterial) -> Self {
        Self {
            identifier: identifier.into(),
            version,
            material,
        }
    }

    /// The embedded key block
    pub fn provisioned() -> Self {
        Self::new(
            PROVISIONED_KEY_IDENTIFIER,
            PROVISIONED_KEY_VERSION,
            KeyMaterial::from_block(&PROVISIONED_KEY_BLOCK),
        )
    }

    /// Load the bundle described by the key settings
    ///
    /// # Errors
    ///
    /// Returns `Config` if the source cannot be read or is not base64, or if
    /// an embedded source names a key other than the embedded block.
    /// Returns `InvalidKeyLength` if the decoded block is not 80 bytes.
    pub fn from_settings(settings: &KeySettings) -> EnvelopeResult<Self> {
        let bundle = match &settings.source {
            KeySource::Embedded => {
                check_embedded_identity(settings)?;
                Self::provisioned()
            }
            KeySource::Env { var } => {
                let encoded = Zeroizing::new(std::env::var(var).map_err(|e| {
                    EnvelopeError::Config(format!("Key variable {} unavailable: {}", var, e))
                })?);
                let material = decode_key_block(&encoded)?;
                Self::new(settings.identifier.clone(), settings.version, material)
            }
            KeySource::File { path } => {
                let material = read_key_file(path)?;
                Self::new(settings.identifier.clone(), settings.version, material)
            }
        };

        tracing::info!(
            key_identifier = %bundle.identifier,
            key_version = bundle.version,
            source = settings.source.describe(),
            "loaded key bundle"
        );

        Ok(bundle)
    }

    /// Install `bundle` as the process-wide key bundle
    ///
    /// # Errors
    ///
    /// Returns `Config` if a bundle is already installed.
    pub fn install(bundle: KeyBundle) -> EnvelopeResult<&'static KeyBundle> {
        INSTALLED
            .set(bundle)
            .map_err(|_| EnvelopeError::Config("Key bundle already installed".to_string()))?;
        Self::global()
            .ok_or_else(|| EnvelopeError::Config("Key bundle not installed".to_string()))
    }

    /// The process-wide key bundle, if one has been installed
    pub fn global() -> Option<&'static KeyBundle> {
        INSTALLED.get()
    }

    /// Key family written into trailers
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Key generation written into trailers
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The split key material
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }
}

/// The embedded block has a fixed identity; settings must not relabel it
pub(crate) fn check_embedded_identity(settings: &KeySettings) -> EnvelopeResult<()> {
    if settings.identifier != PROVISIONED_KEY_IDENTIFIER
        || settings.version != PROVISIONED_KEY_VERSION
    {
        return Err(EnvelopeError::Config(format!(
            "Embedded key is {} v{}, settings name {} v{}",
            PROVISIONED_KEY_IDENTIFIER,
            PROVISIONED_KEY_VERSION,
            settings.identifier,
            settings.version
        )));
    }
    Ok(())
}

/// Decode a base64 key block into key material
pub fn decode_key_block(encoded: &str) -> EnvelopeResult<KeyMaterial> {
    let block = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| EnvelopeError::Config(format!("Invalid key block encoding: {}", e)))?,
    );
    KeyMaterial::from_bytes(&block)
}

fn read_key_file(path: &Path) -> EnvelopeResult<KeyMaterial> {
    let contents = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
        EnvelopeError::Config(format!("Failed to read key file {}: {}", path.display(), e))
    })?);
    decode_key_block(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn encoded_block(fill: u8) -> String {
        STANDARD.encode([fill; KEY_MATERIAL_LEN])
    }

    #[test]
    fn test_provisioned_bundle() {
        let bundle = KeyBundle::provisioned();
        assert_eq!(bundle.identifier(), "ios");
        assert_eq!(bundle.version(), 1);
        assert_eq!(bundle.material().mac_key()[0], 7);
        assert_eq!(bundle.material().cipher_key()[0], 184);
        assert_eq!(bundle.material().base_iv()[0], 230);
        assert_eq!(bundle.material().base_iv()[15], 224);
    }

    #[test]
    fn test_from_settings_embedded() {
        let settings = KeySettings::default();
        let bundle = KeyBundle::from_settings(&settings).unwrap();
        assert_eq!(bundle.identifier(), PROVISIONED_KEY_IDENTIFIER);
        assert_eq!(bundle.version(), PROVISIONED_KEY_VERSION);
        assert_eq!(
            bundle.material().mac_key(),
            KeyBundle::provisioned().material().mac_key()
        );
    }

    #[test]
    fn test_embedded_source_cannot_be_relabelled() {
        let settings = KeySettings {
            identifier: "android".to_string(),
            version: 2,
            source: KeySource::Embedded,
        };
        let err = KeyBundle::from_settings(&settings).unwrap_err();
        assert!(matches!(err, EnvelopeError::Config(_)));

        let settings = KeySettings {
            version: 2,
            ..KeySettings::default()
        };
        assert!(KeyBundle::from_settings(&settings).is_err());
    }

    #[test]
    fn test_from_settings_env() {
        let var = "NEXO_ENVELOPE_TEST_KEY_FROM_ENV";
        std::env::set_var(var, encoded_block(0x11));

        let settings = KeySettings {
            identifier: "pos".to_string(),
            version: 3,
            source: KeySource::Env {
                var: var.to_string(),
            },
        };
        let bundle = KeyBundle::from_settings(&settings).unwrap();
        assert_eq!(bundle.identifier(), "pos");
        assert_eq!(bundle.version(), 3);
        assert_eq!(bundle.material().cipher_key(), &[0x11; 32]);

        std::env::remove_var(var);
    }

    #[test]
    fn test_from_settings_missing_env_var() {
        let settings = KeySettings {
            source: KeySource::Env {
                var: "NEXO_ENVELOPE_TEST_KEY_NOT_SET".to_string(),
            },
            ..KeySettings::default()
        };
        let err = KeyBundle::from_settings(&settings).unwrap_err();
        assert!(matches!(err, EnvelopeError::Config(_)));
    }

    #[test]
    fn test_from_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key.b64");
        std::fs::write(&path, format!("{}\n", encoded_block(0x22))).unwrap();

        let settings = KeySettings {
            source: KeySource::File { path },
            ..KeySettings::default()
        };
        let bundle = KeyBundle::from_settings(&settings).unwrap();
        assert_eq!(bundle.material().base_iv(), &[0x22; 16]);
    }

    #[test]
    fn test_short_key_block_rejected() {
        let encoded = STANDARD.encode([0u8; 79]);
        let err = decode_key_block(&encoded).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::InvalidKeyLength {
                expected: 80,
                actual: 79
            }
        ));
    }

    #[test]
    fn test_non_base64_key_block_rejected() {
        let err = decode_key_block("not a key").unwrap_err();
        assert!(matches!(err, EnvelopeError::Config(_)));
    }

    #[test]
    fn test_install_only_once() {
        let first = KeyBundle::install(KeyBundle::provisioned()).unwrap();
        assert_eq!(first.identifier(), "ios");
        assert!(KeyBundle::global().is_some());

        assert!(KeyBundle::install(KeyBundle::provisioned()).is_err());
    }
}
