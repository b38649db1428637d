//! # Response envelope
//!
//! This module contains the [`ResponseEnvelope`] struct, the success shape of
//! a dispatch. An envelope is created once, at settlement, and never mutated
//! afterwards.

use std::collections::HashMap;

use crate::core::request::RequestDescription;

/// Response body, decoded per the requested [`ResponseKind`].
///
/// [`ResponseKind`]: crate::core::ResponseKind
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseData {
    /// The response carried no body.
    Empty,

    /// Text form of the body.
    Text(String),

    /// Raw body bytes.
    Binary(Vec<u8>),

    /// Parsed JSON body.
    Json(serde_json::Value),
}

impl ResponseData {
    /// Whether the response carried no body.
    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseData::Empty)
    }

    /// Text form of the body, when decoded as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Raw bytes of the body, when kept binary.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ResponseData::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Parsed JSON value, when decoded as JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// The settled response of a successful exchange, or the response attached to
/// a non-2xx failure.
#[derive(Clone, Debug)]
pub struct ResponseEnvelope {
    /// Decoded response body.
    pub data: ResponseData,

    /// Numeric HTTP status.
    pub status: u16,

    /// Status text reported alongside the status code.
    pub status_text: String,

    /// Response headers, parsed from the raw CRLF block with lowercased
    /// names.
    pub headers: HashMap<String, String>,

    /// The description this response settled.
    pub request: RequestDescription,
}

impl ResponseEnvelope {
    /// Whether the status falls in \[200, 300).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
