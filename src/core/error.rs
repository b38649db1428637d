//! # Error types
//!
//! This module contains the error types for the [`courier`] crate.
//!
//! [`courier`]: ../index.html

use crate::core::{RequestDescription, ResponseEnvelope};

/// Error code attached to [`CourierError::Timeout`] failures.
///
/// The code mirrors the conventional `ECONNABORTED` marker so collaborators
/// can distinguish deadline failures from other network-level failures
/// without matching on the error variant.
pub const TIMEOUT_ERROR_CODE: &str = "ECONNABORTED";

/// Courier error type
///
/// Every failed dispatch settles with exactly one value of this type. Each
/// variant carries the originating [`RequestDescription`], either directly or
/// through the attached [`ResponseEnvelope`].
///
/// # Examples
/// ```
/// use courier::core::CourierError;
///
/// fn describe(err: &CourierError) -> String {
///     match err {
///         CourierError::Status { status, .. } => format!("server said {status}"),
///         CourierError::Timeout { .. } => "took too long".into(),
///         CourierError::Cancelled { reason, .. } => reason.clone(),
///         CourierError::Network { .. } => "unreachable".into(),
///     }
/// }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum CourierError {
    /// The transport produced a response whose status falls outside
    /// \[200, 300). The full envelope is attached.
    #[error("Request failed with status code {status}")]
    Status {
        /// Numeric HTTP status of the response.
        status: u16,
        /// The response built from the failed exchange.
        response: Box<ResponseEnvelope>,
    },

    /// The transport failed at the network level before producing a usable
    /// response.
    #[error("Network Error")]
    Network {
        /// Transport-supplied detail, when available.
        message: Option<String>,
        /// The request that was being dispatched.
        request: Box<RequestDescription>,
    },

    /// The configured deadline elapsed before the transport completed.
    #[error("Timeout of {timeout_ms} ms exceeded")]
    Timeout {
        /// The configured timeout, in milliseconds.
        timeout_ms: u128,
        /// The request that was being dispatched.
        request: Box<RequestDescription>,
    },

    /// The caller cancelled the request while it was in flight. The reason is
    /// surfaced verbatim, never re-wrapped.
    #[error("{reason}")]
    Cancelled {
        /// Caller-supplied cancellation reason.
        reason: String,
        /// The request that was being dispatched.
        request: Box<RequestDescription>,
    },
}

impl CourierError {
    /// Machine-readable error code, when the failure kind defines one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            CourierError::Timeout { .. } => Some(TIMEOUT_ERROR_CODE),
            _ => None,
        }
    }

    /// The request whose dispatch produced this failure.
    pub fn request(&self) -> &RequestDescription {
        match self {
            CourierError::Status { response, .. } => &response.request,
            CourierError::Network { request, .. }
            | CourierError::Timeout { request, .. }
            | CourierError::Cancelled { request, .. } => request,
        }
    }

    /// The response received before failing, present only for
    /// [`CourierError::Status`].
    pub fn response(&self) -> Option<&ResponseEnvelope> {
        match self {
            CourierError::Status { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Whether this failure was caller-initiated.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CourierError::Cancelled { .. })
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::core::RequestDescription;

    fn request() -> Box<RequestDescription> {
        Box::new(
            RequestDescription::builder()
                .url("http://localhost/status")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn format_timeout_with_configured_value() {
        let err = CourierError::Timeout {
            timeout_ms: 250,
            request: request(),
        };

        assert_eq!(err.to_string(), "Timeout of 250 ms exceeded");
        assert_eq!(err.code(), Some(TIMEOUT_ERROR_CODE));
    }

    #[test]
    fn format_network_errors_with_generic_message() {
        let err = CourierError::Network {
            message: Some("connection refused".into()),
            request: request(),
        };

        assert_eq!(err.to_string(), "Network Error");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn surface_cancellation_reason_verbatim() {
        let err = CourierError::Cancelled {
            reason: "operation no longer needed".into(),
            request: request(),
        };

        assert_eq!(err.to_string(), "operation no longer needed");
        assert!(err.is_cancelled());
    }
}
