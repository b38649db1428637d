//! # Transport call
//!
//! This module contains the [`TransportCall`] struct, the finalized wire form
//! of a request. The dispatch engine builds exactly one call per request
//! description, after URL composition and header finalization.

use std::{collections::HashMap, time::Duration};

use crate::core::request::{FormPart, Method, ResponseKind};

/// Wire form of a request body.
#[derive(Clone, Debug, PartialEq)]
pub enum WireBody {
    /// Serialized payload bytes.
    Bytes(Vec<u8>),

    /// Structured multipart form; the transport computes the boundary.
    Multipart(Vec<FormPart>),
}

/// The finalized request handed to a [`Transport`].
///
/// All fields are settled by the dispatch engine before sending: the URL
/// carries its query string, the headers are flat and final, and the body is
/// in wire form.
///
/// [`Transport`]: crate::core::Transport
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransportCall {
    /// Composed target URL.
    pub url: String,

    /// Method to use for the request, rendered uppercase on the wire.
    pub method: Method,

    /// Finalized headers, applied as literal name/value strings.
    pub headers: HashMap<String, String>,

    /// Body to send, absent for body-less requests.
    pub body: Option<WireBody>,

    /// Deadline the transport enforces on the whole exchange.
    pub timeout: Option<Duration>,

    /// Whether the exchange should carry credentials cross-site.
    pub with_credentials: bool,

    /// Response decoding the caller asked for; transports may use it to
    /// pre-decode, the dispatcher applies it either way.
    pub response_kind: ResponseKind,
}
