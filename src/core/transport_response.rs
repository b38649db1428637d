//! This module contains the [`RawResponse`] struct.
//!
//! A raw response is the untyped completion payload of a transport exchange,
//! carried by [`TransportSignal::Completed`]. The dispatch engine parses the
//! header block and decodes the body when it builds the settled envelope.
//!
//! [`TransportSignal::Completed`]: crate::core::TransportSignal::Completed

/// Untyped response as produced by the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// Status code of the response. A status of 0 marks a readiness probe
    /// with no usable response behind it.
    pub status: u16,

    /// Status text reported alongside the code.
    pub status_text: String,

    /// Response headers as one CRLF-delimited `name: value` block, exactly
    /// as transport APIs surface them.
    pub header_block: String,

    /// Body bytes of the response, absent when the response carried none.
    pub body: Option<Vec<u8>>,
}
