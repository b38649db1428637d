//! # Transport module
//!
//! This module contains the [`Transport`] trait and the lifecycle
//! [`TransportSignal`] events it emits.
//!
//! You can implement this trait for your own types, or enable the `reqwest`
//! feature to use the provided transport implementation.

use async_channel::Sender;

use crate::core::{request::TransferProgress, transport_request::TransportCall, RawResponse};

/// Lifecycle event of one exchange.
///
/// A transport emits any number of progress signals followed by exactly one
/// terminal signal (`Completed`, `NetworkError`, or `TimedOut`). A
/// `Completed` signal whose status is 0 is a readiness probe emitted by
/// transports that surface one before the actual failure signal lands; the
/// dispatcher ignores it.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportSignal {
    /// The exchange finished and produced a response.
    Completed(RawResponse),

    /// Bytes of the response body arrived.
    DownloadProgress(TransferProgress),

    /// Bytes of the request body were sent.
    UploadProgress(TransferProgress),

    /// The exchange failed at the network level; no usable response exists.
    NetworkError {
        /// Transport-supplied detail, when available.
        message: Option<String>,
    },

    /// The configured deadline elapsed before the exchange finished.
    TimedOut,
}

/// The capability that performs one network exchange.
///
/// One transport object backs one logical request; the dispatcher consumes
/// its transport and never reuses it across calls.
///
/// # Examples
/// ```
/// use async_channel::Sender;
/// use courier::core::{RawResponse, Transport, TransportCall, TransportSignal};
///
/// struct MyTransport;
///
/// #[async_trait::async_trait]
/// impl Transport for MyTransport {
///     async fn send(&self, _call: TransportCall, events: Sender<TransportSignal>) {
///         // Perform the exchange here, then report how it ended.
///         let _ = events
///             .send(TransportSignal::Completed(RawResponse::default()))
///             .await;
///     }
///
///     fn abort(&self) {}
/// }
/// ```
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Drive the exchange described by `call`, emitting lifecycle signals on
    /// `events`.
    ///
    /// Resolves once the terminal signal has been emitted, or once the
    /// exchange was aborted. Timeouts are enforced here, by the transport,
    /// never by the dispatcher polling a clock.
    async fn send(&self, call: TransportCall, events: Sender<TransportSignal>);

    /// Abort the in-flight exchange.
    ///
    /// Must be safe to call at any time; aborting an exchange that already
    /// finished is a no-op.
    fn abort(&self);
}
