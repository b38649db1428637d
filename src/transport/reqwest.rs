//! # Reqwest Transport Implementation
//!
//! This module contains the [`TransportReqwest`] struct. It performs the
//! actual network exchange using the [`reqwest`] crate and reports its
//! lifecycle through the signal channel of the [`Transport`] contract.
//!
//! It requires the [`reqwest` feature] to be enabled.
//!
//! [`Transport`]: crate::core::Transport
//! [`reqwest`]: https://docs.rs/reqwest
//! [`reqwest` feature]: ../index.html#features

use async_channel::{bounded, Receiver, Sender};
use bytes::Bytes;
use futures::FutureExt;
use log::{debug, info};
use reqwest::{
    header::HeaderMap,
    multipart::{Form, Part},
};

use crate::core::{
    Method, RawResponse, Transport, TransportCall, TransportSignal, WireBody,
};

/// [`Transport`] implementation over a [`reqwest::Client`].
///
/// One instance backs one logical request. The credentials flag of the call
/// has no wire effect here: cookie jars are a concern of the `reqwest` client
/// the transport is constructed with.
///
/// [`Transport`]: crate::core::Transport
///
/// # Examples
/// ```
/// use courier::transport::TransportReqwest;
///
/// let transport = TransportReqwest::new();
/// ```
#[derive(Clone, Debug)]
pub struct TransportReqwest {
    reqwest_client: reqwest::Client,
    abort_tx: Sender<()>,
    abort_rx: Receiver<()>,
}

impl Default for TransportReqwest {
    fn default() -> Self {
        Self::with_client(reqwest::Client::default())
    }
}

impl TransportReqwest {
    /// Create a new [`TransportReqwest`] instance over a default
    /// [`reqwest::Client`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport over a caller-configured client, e.g. one with a
    /// cookie jar or custom TLS settings.
    pub fn with_client(reqwest_client: reqwest::Client) -> Self {
        let (abort_tx, abort_rx) = bounded(1);
        Self {
            reqwest_client,
            abort_tx,
            abort_rx,
        }
    }

    fn prepare_request(&self, call: TransportCall) -> Result<reqwest::RequestBuilder, String> {
        let mut builder = self
            .reqwest_client
            .request(reqwest_method(call.method), &call.url);

        if let Some(timeout) = call.timeout {
            builder = builder.timeout(timeout);
        }

        let headers =
            HeaderMap::try_from(&call.headers).map_err(|err| err.to_string())?;
        builder = builder.headers(headers);

        match call.body {
            None => Ok(builder),
            Some(WireBody::Bytes(bytes)) => Ok(builder.body(bytes)),
            Some(WireBody::Multipart(parts)) => {
                let mut form = Form::new();
                for part in parts {
                    let mut piece = Part::bytes(part.value);
                    if let Some(filename) = part.filename {
                        piece = piece.file_name(filename);
                    }
                    if let Some(mime) = part.mime {
                        piece = piece.mime_str(&mime).map_err(|err| err.to_string())?;
                    }
                    form = form.part(part.name, piece);
                }
                Ok(builder.multipart(form))
            }
        }
    }
}

#[async_trait::async_trait]
impl Transport for TransportReqwest {
    async fn send(&self, call: TransportCall, events: Sender<TransportSignal>) {
        info!("{}", call.url);

        let builder = match self.prepare_request(call) {
            Ok(builder) => builder,
            Err(message) => {
                let _ = events
                    .send(TransportSignal::NetworkError {
                        message: Some(message),
                    })
                    .await;
                return;
            }
        };

        futures::select! {
            signal = perform(builder).fuse() => {
                let _ = events.send(signal).await;
            }
            _ = self.abort_rx.recv().fuse() => {
                debug!("exchange aborted");
            }
        }
    }

    fn abort(&self) {
        let _ = self.abort_tx.try_send(());
    }
}

async fn perform(builder: reqwest::RequestBuilder) -> TransportSignal {
    let response = match builder.send().await {
        Ok(response) => response,
        Err(err) if err.is_timeout() => return TransportSignal::TimedOut,
        Err(err) => {
            return TransportSignal::NetworkError {
                message: Some(err.to_string()),
            }
        }
    };

    let status = response.status();
    let header_block = response
        .headers()
        .iter()
        .fold(String::new(), |mut block, (name, value)| {
            block.push_str(name.as_str());
            block.push_str(": ");
            block.push_str(&String::from_utf8_lossy(value.as_bytes()));
            block.push_str("\r\n");
            block
        });

    match response.bytes().await {
        Ok(bytes) => TransportSignal::Completed(create_raw_response(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            header_block,
            bytes,
        )),
        Err(err) if err.is_timeout() => TransportSignal::TimedOut,
        Err(err) => TransportSignal::NetworkError {
            message: Some(err.to_string()),
        },
    }
}

fn create_raw_response(
    status: u16,
    status_text: &str,
    header_block: String,
    body: Bytes,
) -> RawResponse {
    RawResponse {
        status,
        status_text: status_text.to_owned(),
        header_block,
        body: (!body.is_empty()).then(|| body.to_vec()),
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}
