//! Sealing and opening whole protocol messages
//!
//! A protected message keeps its root key and `MessageHeader` in clear.
//! The body is replaced by `NexoBlob` (the sealed, serialized original
//! message) and `SecurityTrailer`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crate::crypto::envelope::{Envelope, SealedPayload, SecurityTrailer};
use crate::error::{EnvelopeError, EnvelopeResult};

use super::header::{extract_header, MessageHeader, MessageKind};

/// Body of a protected message
#[derive(Debug, Clone, Serialize)]
struct SecuredBody {
    #[serde(rename = "MessageHeader")]
    header: MessageHeader,
    #[serde(rename = "NexoBlob")]
    nexo_blob: String,
    #[serde(rename = "SecurityTrailer")]
    security_trailer: SecurityTrailer,
}

/// Protects and unprotects protocol messages with one envelope
#[derive(Debug, Clone, Copy)]
pub struct MessageProtector<'k> {
    envelope: Envelope<'k>,
    encryption_enabled: bool,
}

impl<'k> MessageProtector<'k> {
    /// Create a protector that seals every message
    pub fn new(envelope: Envelope<'k>) -> Self {
        Self {
            envelope,
            encryption_enabled: true,
        }
    }

    /// Turn sealing on or off
    ///
    /// With sealing off, messages are still checked for a valid root and
    /// header but otherwise pass through unchanged.
    pub fn with_encryption(mut self, enabled: bool) -> Self {
        self.encryption_enabled = enabled;
        self
    }

    /// Seal a serialized message, keeping its header in clear
    ///
    /// # Errors
    ///
    /// - `Json` if `message` is not JSON.
    /// - `Message` if it has no recognised root or no valid header.
    /// - Any error from [`Envelope::seal`].
    pub fn protect(&self, message: &[u8]) -> EnvelopeResult<Vec<u8>> {
        let parsed: Value = serde_json::from_slice(message)?;
        let (kind, body) = MessageKind::detect(&parsed)?;
        let header = extract_header(body)?;

        if !self.encryption_enabled {
            tracing::debug!(kind = kind.root_key(), "encryption disabled, passing through");
            return Ok(message.to_vec());
        }

        let sealed = self.envelope.seal(message)?;
        let secured = SecuredBody {
            header,
            nexo_blob: sealed.ciphertext,
            security_trailer: sealed.trailer,
        };

        let mut root = Map::new();
        root.insert(kind.root_key().to_string(), serde_json::to_value(secured)?);
        Ok(serde_json::to_vec(&Value::Object(root))?)
    }

    /// Verify and decrypt a protected message
    ///
    /// Returns the original serialized message. The decrypted message must
    /// be of the same kind as the outer one.
    ///
    /// # Errors
    ///
    /// - `Json` if `message` is not JSON.
    /// - `Message` if it has no recognised root or no valid header, or if
    ///   the decrypted message is not a message of the same kind.
    /// - `Decode` if `NexoBlob` or `SecurityTrailer` is absent or malformed,
    ///   including a trailer missing one of its required fields.
    /// - Any error from [`Envelope::open`].
    pub fn unprotect(&self, message: &[u8]) -> EnvelopeResult<Zeroizing<Vec<u8>>> {
        let parsed: Value = serde_json::from_slice(message)?;
        let (kind, body) = MessageKind::detect(&parsed)?;

        if !self.encryption_enabled {
            extract_header(body)?;
            tracing::debug!(kind = kind.root_key(), "encryption disabled, passing through");
            return Ok(Zeroizing::new(message.to_vec()));
        }

        extract_header(body)?;
        let ciphertext = match body.get("NexoBlob") {
            Some(Value::String(blob)) => blob.clone(),
            Some(_) => return Err(EnvelopeError::Decode("NexoBlob is not a string".into())),
            None => return Err(EnvelopeError::missing_field("NexoBlob")),
        };
        let trailer = body
            .get("SecurityTrailer")
            .ok_or_else(|| EnvelopeError::missing_field("SecurityTrailer"))?;
        let trailer = SecurityTrailer::deserialize(trailer)
            .map_err(|e| EnvelopeError::Decode(format!("invalid security trailer: {}", e)))?;
        let sealed = SealedPayload {
            ciphertext,
            trailer,
        };

        let plaintext = self.envelope.open(&sealed)?;

        let inner: Value = serde_json::from_slice(&plaintext)
            .map_err(|e| EnvelopeError::Message(format!("sealed content is not JSON: {}", e)))?;
        let (inner_kind, _) = MessageKind::detect(&inner)?;
        if inner_kind != kind {
            return Err(EnvelopeError::Message(format!(
                "sealed {} inside {}",
                inner_kind.root_key(),
                kind.root_key()
            )));
        }

        Ok(plaintext)
    }
}
