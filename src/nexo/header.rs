//! Message header and root kinds
//!
//! The header is the only part of a protocol message that stays in clear
//! once the message is sealed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EnvelopeError, EnvelopeResult};

/// Clear-text routing header of a protocol message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageHeader {
    pub protocol_version: String,
    pub message_class: String,
    pub message_category: String,
    pub message_type: String,
    #[serde(rename = "SaleID")]
    pub sale_id: String,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    #[serde(rename = "POIID")]
    pub poi_id: String,
}

/// Which side of the exchange a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Sale system to terminal
    Request,
    /// Terminal to sale system
    Response,
}

impl MessageKind {
    /// The single top-level key of a message of this kind
    pub fn root_key(&self) -> &'static str {
        match self {
            MessageKind::Request => "SaleToPOIRequest",
            MessageKind::Response => "SaleToPOIResponse",
        }
    }

    /// Find the kind and body of a parsed message
    ///
    /// The message must be an object with exactly one recognised root key.
    pub fn detect(message: &Value) -> EnvelopeResult<(Self, &Map<String, Value>)> {
        let root = message
            .as_object()
            .ok_or_else(|| EnvelopeError::Message("message is not a JSON object".into()))?;

        let mut found = None;
        for kind in [MessageKind::Request, MessageKind::Response] {
            if let Some(body) = root.get(kind.root_key()) {
                if found.is_some() {
                    return Err(EnvelopeError::Message(
                        "message has both request and response roots".into(),
                    ));
                }
                found = Some((kind, body));
            }
        }

        let (kind, body) = found.ok_or_else(|| {
            EnvelopeError::Message("message has no SaleToPOIRequest or SaleToPOIResponse".into())
        })?;
        let body = body
            .as_object()
            .ok_or_else(|| EnvelopeError::Message(format!("{} is not an object", kind.root_key())))?;

        Ok((kind, body))
    }
}

/// Pull the header out of a message body
pub fn extract_header(body: &Map<String, Value>) -> EnvelopeResult<MessageHeader> {
    let header = body
        .get("MessageHeader")
        .ok_or_else(|| EnvelopeError::Message("missing MessageHeader".into()))?;
    MessageHeader::deserialize(header)
        .map_err(|e| EnvelopeError::Message(format!("invalid MessageHeader: {}", e)))
}
