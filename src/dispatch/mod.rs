//! # Dispatch module
//!
//! This module contains the [`Dispatcher`], the engine that turns one
//! [`RequestDescription`] into one settled outcome. A dispatcher owns its
//! transport for the duration of a single request, wires the transport's
//! lifecycle signals, applies cross-site credential logic, and resolves
//! exactly once with a [`ResponseEnvelope`] or a [`CourierError`].

use async_channel::unbounded;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use futures::{future, FutureExt};
use log::{debug, info};
use url::Url;

use crate::core::{
    cancel::CancelToken,
    cookie::{CookieStore, NoCookies},
    utils::headers::{
        insert_preserving_case, parse_response_headers, remove_header, CONTENT_TYPE,
    },
    utils::url::is_same_origin,
    Body, CourierError, RawResponse, RequestDescription, ResponseData, ResponseEnvelope,
    ResponseKind, Transport, TransportCall, TransportSignal, WireBody,
};

pub mod pipeline;

/// Engine states up to the suspension point; the terminal states are the two
/// sides of the returned `Result`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DispatchState {
    Idle,
    Configured,
    Sent,
}

/// Single-shot request dispatcher.
///
/// One dispatcher issues one request: [`Dispatcher::dispatch`] consumes the
/// dispatcher together with its transport, so transport objects are never
/// reused across calls.
///
/// Cookies are read through the injected [`CookieStore`] (defaults to
/// [`NoCookies`]), and the optional origin drives the same-origin side of
/// XSRF injection.
///
/// # Examples
/// ```
/// # use async_channel::Sender;
/// # use courier::core::{RawResponse, RequestDescription, Transport, TransportCall, TransportSignal};
/// # use courier::dispatch::Dispatcher;
/// struct Stub;
/// # #[async_trait::async_trait]
/// # impl Transport for Stub {
/// #     async fn send(&self, _call: TransportCall, events: Sender<TransportSignal>) {
/// #         let _ = events
/// #             .send(TransportSignal::Completed(RawResponse {
/// #                 status: 200,
/// #                 ..Default::default()
/// #             }))
/// #             .await;
/// #     }
/// #     fn abort(&self) {}
/// # }
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let response = Dispatcher::new(Stub)
///     .dispatch(
///         RequestDescription::builder()
///             .url("http://localhost/ping")
///             .build()
///             .unwrap(),
///     )
///     .await
///     .unwrap();
///
/// assert_eq!(response.status, 200);
/// # }
/// ```
pub struct Dispatcher<T, C = NoCookies>
where
    T: Transport,
    C: CookieStore,
{
    transport: T,
    cookies: C,
    origin: Option<Url>,
}

impl<T> Dispatcher<T, NoCookies>
where
    T: Transport,
{
    /// Create a dispatcher over `transport`, without cookie access or a
    /// known origin.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cookies: NoCookies,
            origin: None,
        }
    }
}

impl<T, C> Dispatcher<T, C>
where
    T: Transport,
    C: CookieStore,
{
    /// Replace the cookie store the dispatcher reads XSRF tokens from.
    pub fn with_cookie_store<S>(self, cookies: S) -> Dispatcher<T, S>
    where
        S: CookieStore,
    {
        Dispatcher {
            transport: self.transport,
            cookies,
            origin: self.origin,
        }
    }

    /// Declare the origin of the context issuing requests, enabling the
    /// same-origin side of XSRF injection.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Issue the request and resolve its single terminal outcome.
    ///
    /// The description is first rewritten by the config pipeline, then turned
    /// into one transport call. The returned future settles exactly once:
    /// with the response envelope for a 2xx completion, or with the matching
    /// [`CourierError`] for non-2xx statuses, network failures, timeouts,
    /// and cancellations.
    ///
    /// # Panics
    /// Panics when the target URL is empty; an unresolvable target is a
    /// programming error, not a runtime failure mode.
    pub async fn dispatch(
        self,
        mut description: RequestDescription,
    ) -> Result<ResponseEnvelope, CourierError> {
        assert!(
            !description.url.is_empty(),
            "request target URL must not be empty"
        );

        let mut state = DispatchState::Idle;
        pipeline::prepare(&mut description);
        info!("dispatching {} {}", description.method, description.url);

        let call = self.configure(&description);
        state = transition(state, DispatchState::Configured);

        let cancel_token = description.cancel_token.clone();
        let (events_tx, events) = unbounded();
        let mut exchange = self.transport.send(call, events_tx).fuse();
        let mut cancelled = Box::pin(wait_for_cancel(cancel_token)).fuse();
        state = transition(state, DispatchState::Sent);
        debug_assert_eq!(state, DispatchState::Sent);

        loop {
            futures::select! {
                _ = exchange => {
                    // Terminal signal, if any, is already buffered on `events`.
                }
                reason = cancelled => {
                    self.transport.abort();
                    debug!("dispatch cancelled: {reason}");
                    return Err(CourierError::Cancelled {
                        reason,
                        request: Box::new(description),
                    });
                }
                event = events.recv().fuse() => match event {
                    Ok(TransportSignal::Completed(raw)) if raw.status == 0 => {
                        debug!("ignoring zero-status completion probe");
                    }
                    Ok(TransportSignal::Completed(raw)) => {
                        return settle(raw, description);
                    }
                    Ok(TransportSignal::DownloadProgress(progress)) => {
                        if let Some(handler) = &description.on_download_progress {
                            handler.call(progress);
                        }
                    }
                    Ok(TransportSignal::UploadProgress(progress)) => {
                        if let Some(handler) = &description.on_upload_progress {
                            handler.call(progress);
                        }
                    }
                    Ok(TransportSignal::NetworkError { message }) => {
                        return Err(CourierError::Network {
                            message,
                            request: Box::new(description),
                        });
                    }
                    Ok(TransportSignal::TimedOut) => {
                        let timeout_ms = description
                            .timeout
                            .map(|timeout| timeout.as_millis())
                            .unwrap_or_default();
                        return Err(CourierError::Timeout {
                            timeout_ms,
                            request: Box::new(description),
                        });
                    }
                    Err(_) => {
                        return Err(CourierError::Network {
                            message: Some(
                                "transport dropped the signal channel before settling".into(),
                            ),
                            request: Box::new(description),
                        });
                    }
                },
            }
        }
    }

    /// Build the finalized transport call: response-type, timeout, and
    /// credential settings plus the final header pass.
    fn configure(&self, description: &RequestDescription) -> TransportCall {
        let mut headers = description.headers.flatten(description.method);

        // The transport computes the boundary-bearing content-type itself.
        if matches!(description.body, Some(Body::Multipart(_))) {
            remove_header(&mut headers, CONTENT_TYPE);
        }

        if description.with_credentials || self.targets_own_origin(&description.url) {
            if let Some(cookie_name) = &description.xsrf_cookie_name {
                if let Some(token) = self.cookies.read(cookie_name) {
                    if let Some(header_name) = &description.xsrf_header_name {
                        insert_preserving_case(&mut headers, header_name, token);
                    }
                }
            }
        }

        if let Some(auth) = &description.auth {
            let credentials =
                BASE64_STANDARD.encode(format!("{}:{}", auth.username, auth.password));
            insert_preserving_case(&mut headers, "Authorization", format!("Basic {credentials}"));
        }

        // No payload, nothing for a content-type to describe.
        if description.body.is_none() {
            remove_header(&mut headers, CONTENT_TYPE);
        }

        TransportCall {
            url: description.url.clone(),
            method: description.method,
            headers,
            body: description.body.as_ref().map(wire_body),
            timeout: description.timeout,
            with_credentials: description.with_credentials,
            response_kind: description.response_kind,
        }
    }

    fn targets_own_origin(&self, target: &str) -> bool {
        self.origin
            .as_ref()
            .is_some_and(|origin| is_same_origin(target, origin))
    }
}

fn transition(from: DispatchState, to: DispatchState) -> DispatchState {
    debug!("dispatch state {from:?} -> {to:?}");
    to
}

async fn wait_for_cancel(token: Option<CancelToken>) -> String {
    match token {
        Some(token) => token.cancelled().await,
        None => future::pending().await,
    }
}

fn wire_body(body: &Body) -> WireBody {
    match body {
        Body::Json(value) => WireBody::Bytes(value.to_string().into_bytes()),
        Body::Text(text) => WireBody::Bytes(text.clone().into_bytes()),
        Body::Bytes(bytes) => WireBody::Bytes(bytes.clone()),
        Body::Multipart(parts) => WireBody::Multipart(parts.clone()),
    }
}

/// Translate a non-probe completion into the settled outcome.
fn settle(
    raw: RawResponse,
    description: RequestDescription,
) -> Result<ResponseEnvelope, CourierError> {
    let headers = parse_response_headers(&raw.header_block);
    let data = decode_data(description.response_kind, raw.body);
    let envelope = ResponseEnvelope {
        data,
        status: raw.status,
        status_text: raw.status_text,
        headers,
        request: description,
    };

    if envelope.is_success() {
        debug!("request settled with status {}", envelope.status);
        Ok(envelope)
    } else {
        debug!("request failed with status {}", envelope.status);
        Err(CourierError::Status {
            status: envelope.status,
            response: Box::new(envelope),
        })
    }
}

fn decode_data(kind: ResponseKind, body: Option<Vec<u8>>) -> ResponseData {
    let Some(bytes) = body.filter(|bytes| !bytes.is_empty()) else {
        return ResponseData::Empty;
    };

    match kind {
        ResponseKind::Binary => ResponseData::Binary(bytes),
        ResponseKind::Json => match serde_json::from_slice(&bytes) {
            Ok(value) => ResponseData::Json(value),
            // Keep the text form when the payload is not valid JSON.
            Err(_) => ResponseData::Text(String::from_utf8_lossy(&bytes).into_owned()),
        },
        ResponseKind::Text => ResponseData::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::core::{BasicAuth, CancelSource, FormPart, Method, ProgressHandler, TransferProgress};
    use async_channel::Sender;
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    #[derive(Default)]
    struct MockInner {
        script: Mutex<Vec<TransportSignal>>,
        seen: Mutex<Option<TransportCall>>,
        aborted: AtomicBool,
        hold_open: AtomicBool,
    }

    #[derive(Clone, Default)]
    struct MockTransport {
        inner: Arc<MockInner>,
    }

    impl MockTransport {
        fn scripted(signals: Vec<TransportSignal>) -> Self {
            let transport = Self::default();
            *transport.inner.script.lock().unwrap() = signals;
            transport
        }

        fn holding_open() -> Self {
            let transport = Self::default();
            transport.inner.hold_open.store(true, Ordering::SeqCst);
            transport
        }

        fn seen_call(&self) -> TransportCall {
            self.inner.seen.lock().unwrap().clone().expect("no call sent")
        }

        fn was_aborted(&self) -> bool {
            self.inner.aborted.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn send(&self, call: TransportCall, events: Sender<TransportSignal>) {
            *self.inner.seen.lock().unwrap() = Some(call);
            let script = std::mem::take(&mut *self.inner.script.lock().unwrap());
            for signal in script {
                let _ = events.send(signal).await;
            }
            if self.inner.hold_open.load(Ordering::SeqCst) {
                future::pending::<()>().await;
            }
        }

        fn abort(&self) {
            self.inner.aborted.store(true, Ordering::SeqCst);
        }
    }

    fn completed(status: u16, header_block: &str, body: Option<&[u8]>) -> TransportSignal {
        TransportSignal::Completed(RawResponse {
            status,
            status_text: String::new(),
            header_block: header_block.to_owned(),
            body: body.map(<[u8]>::to_vec),
        })
    }

    fn description(url: &str) -> RequestDescription {
        RequestDescription::builder().url(url).build().unwrap()
    }

    #[tokio::test]
    async fn settle_success_with_parsed_headers() {
        let transport = MockTransport::scripted(vec![completed(
            200,
            "Content-Type: text/html\r\nX-Foo:  bar \r\n",
            Some(b"hello"),
        )]);

        let response = Dispatcher::new(transport)
            .dispatch(description("http://localhost/greeting"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(
            response.headers.get("content-type").map(String::as_str),
            Some("text/html")
        );
        assert_eq!(response.headers.get("x-foo").map(String::as_str), Some("bar"));
        assert_eq!(response.data.as_text(), Some("hello"));
    }

    #[tokio::test]
    async fn settle_204_with_empty_body() {
        let transport = MockTransport::scripted(vec![completed(204, "", None)]);

        let response = Dispatcher::new(transport)
            .dispatch(description("http://localhost/none"))
            .await
            .unwrap();

        assert_eq!(response.status, 204);
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn fail_non_2xx_with_attached_response() {
        let transport = MockTransport::scripted(vec![completed(404, "", Some(b"missing"))]);

        let err = Dispatcher::new(transport)
            .dispatch(description("http://localhost/nowhere"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Request failed with status code 404");
        let response = err.response().expect("response attached");
        assert_eq!(response.status, 404);
        assert_eq!(response.data.as_text(), Some("missing"));
    }

    #[tokio::test]
    async fn fail_on_network_error_without_response() {
        let transport = MockTransport::scripted(vec![TransportSignal::NetworkError {
            message: Some("connection reset".into()),
        }]);

        let err = Dispatcher::new(transport)
            .dispatch(description("http://localhost/flaky"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Network Error");
        assert!(err.response().is_none());
    }

    #[tokio::test]
    async fn fail_on_timeout_with_configured_value() {
        let transport = MockTransport::scripted(vec![TransportSignal::TimedOut]);

        let err = Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://localhost/slow")
                    .timeout(Duration::from_millis(300))
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Timeout of 300 ms exceeded");
        assert_eq!(err.code(), Some(crate::core::TIMEOUT_ERROR_CODE));
        assert!(err.response().is_none());
    }

    #[tokio::test]
    async fn ignore_zero_status_probe_before_failure() {
        let transport = MockTransport::scripted(vec![
            completed(0, "", None),
            TransportSignal::NetworkError { message: None },
        ]);

        let err = Dispatcher::new(transport)
            .dispatch(description("http://localhost/probe"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Network Error");
    }

    #[tokio::test]
    async fn settle_once_and_ignore_later_signals() {
        let transport = MockTransport::scripted(vec![
            completed(200, "", Some(b"first")),
            completed(500, "", Some(b"late")),
        ]);

        let response = Dispatcher::new(transport)
            .dispatch(description("http://localhost/once"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.data.as_text(), Some("first"));
    }

    #[tokio::test]
    async fn cancel_in_flight_request_and_abort_transport() {
        let transport = MockTransport::holding_open();
        let probe = transport.clone();
        let (source, token) = CancelSource::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            source.cancel("caller lost interest");
        });

        let err = Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://localhost/forever")
                    .cancel_token(token)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "caller lost interest");
        assert!(err.is_cancelled());
        assert!(probe.was_aborted());
    }

    #[tokio::test]
    async fn inject_xsrf_header_when_credentials_enabled() {
        let transport = MockTransport::scripted(vec![completed(200, "", None)]);
        let probe = transport.clone();
        let cookies = HashMap::from([("XSRF-TOKEN".to_string(), "secret".to_string())]);

        Dispatcher::new(transport)
            .with_cookie_store(cookies)
            .dispatch(
                RequestDescription::builder()
                    .url("http://other.com/form")
                    .with_credentials(true)
                    .xsrf_cookie_name("XSRF-TOKEN")
                    .xsrf_header_name("X-XSRF-TOKEN")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let call = probe.seen_call();
        assert_eq!(
            call.headers.get("X-XSRF-TOKEN").map(String::as_str),
            Some("secret")
        );
    }

    #[tokio::test]
    async fn inject_xsrf_header_for_same_origin_target() {
        let transport = MockTransport::scripted(vec![completed(200, "", None)]);
        let probe = transport.clone();
        let cookies = HashMap::from([("XSRF-TOKEN".to_string(), "secret".to_string())]);

        Dispatcher::new(transport)
            .with_cookie_store(cookies)
            .with_origin(Url::parse("http://a.com").unwrap())
            .dispatch(
                RequestDescription::builder()
                    .url("http://a.com/form")
                    .xsrf_cookie_name("XSRF-TOKEN")
                    .xsrf_header_name("X-XSRF-TOKEN")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            probe.seen_call().headers.get("X-XSRF-TOKEN").map(String::as_str),
            Some("secret")
        );
    }

    #[tokio::test]
    async fn skip_xsrf_header_for_cross_origin_target() {
        let transport = MockTransport::scripted(vec![completed(200, "", None)]);
        let probe = transport.clone();
        let cookies = HashMap::from([("XSRF-TOKEN".to_string(), "secret".to_string())]);

        Dispatcher::new(transport)
            .with_cookie_store(cookies)
            .with_origin(Url::parse("http://a.com").unwrap())
            .dispatch(
                RequestDescription::builder()
                    .url("http://other.com/form")
                    .xsrf_cookie_name("XSRF-TOKEN")
                    .xsrf_header_name("X-XSRF-TOKEN")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(!probe.seen_call().headers.contains_key("X-XSRF-TOKEN"));
    }

    #[tokio::test]
    async fn skip_xsrf_header_when_cookie_missing() {
        let transport = MockTransport::scripted(vec![completed(200, "", None)]);
        let probe = transport.clone();

        Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://a.com/form")
                    .with_credentials(true)
                    .xsrf_cookie_name("XSRF-TOKEN")
                    .xsrf_header_name("X-XSRF-TOKEN")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(!probe.seen_call().headers.contains_key("X-XSRF-TOKEN"));
    }

    #[tokio::test]
    async fn inject_basic_authorization_header() {
        let transport = MockTransport::scripted(vec![completed(200, "", None)]);
        let probe = transport.clone();

        Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://localhost/private")
                    .auth(BasicAuth::new("user", "pass"))
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            probe.seen_call().headers.get("Authorization").map(String::as_str),
            Some("Basic dXNlcjpwYXNz")
        );
    }

    #[tokio::test]
    async fn strip_content_type_for_multipart_bodies() {
        let transport = MockTransport::scripted(vec![completed(200, "", None)]);
        let probe = transport.clone();
        let mut headers = crate::core::HeaderBag::new();
        headers.set("Content-Type", "multipart/form-data");

        Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://localhost/upload")
                    .method(Method::Post)
                    .headers(headers)
                    .body(Body::Multipart(vec![FormPart::new("file", b"bytes".to_vec())]))
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let call = probe.seen_call();
        assert!(!call
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE)));
        assert!(matches!(call.body, Some(WireBody::Multipart(_))));
    }

    #[tokio::test]
    async fn drop_content_type_when_body_absent() {
        let transport = MockTransport::scripted(vec![completed(200, "", None)]);
        let probe = transport.clone();
        let mut headers = crate::core::HeaderBag::new();
        headers.set("content-type", "application/json");
        headers.set("X-Keep", "yes");

        Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://localhost/empty")
                    .headers(headers)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let call = probe.seen_call();
        assert!(!call
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE)));
        assert_eq!(call.headers.get("X-Keep").map(String::as_str), Some("yes"));
    }

    #[tokio::test]
    async fn forward_progress_signals_to_handlers() {
        let transport = MockTransport::scripted(vec![
            TransportSignal::UploadProgress(TransferProgress {
                loaded: 10,
                total: Some(10),
            }),
            TransportSignal::DownloadProgress(TransferProgress {
                loaded: 3,
                total: Some(7),
            }),
            completed(200, "", None),
        ]);
        let downloads = Arc::new(Mutex::new(Vec::new()));
        let uploads = Arc::new(Mutex::new(Vec::new()));
        let download_log = downloads.clone();
        let upload_log = uploads.clone();

        Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://localhost/stream")
                    .on_download_progress(ProgressHandler::new(move |progress| {
                        download_log.lock().unwrap().push(progress);
                    }))
                    .on_upload_progress(ProgressHandler::new(move |progress| {
                        upload_log.lock().unwrap().push(progress);
                    }))
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            *downloads.lock().unwrap(),
            vec![TransferProgress {
                loaded: 3,
                total: Some(7)
            }]
        );
        assert_eq!(
            *uploads.lock().unwrap(),
            vec![TransferProgress {
                loaded: 10,
                total: Some(10)
            }]
        );
    }

    #[tokio::test]
    async fn decode_json_response_when_requested() {
        let transport =
            MockTransport::scripted(vec![completed(200, "", Some(b"{\"ok\":true}"))]);

        let response = Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://localhost/json")
                    .response_kind(ResponseKind::Json)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.data.as_json(),
            Some(&serde_json::json!({ "ok": true }))
        );
    }

    #[tokio::test]
    async fn keep_raw_bytes_for_binary_response_kind() {
        let transport = MockTransport::scripted(vec![completed(200, "", Some(&[0xde, 0xad]))]);

        let response = Dispatcher::new(transport)
            .dispatch(
                RequestDescription::builder()
                    .url("http://localhost/blob")
                    .response_kind(ResponseKind::Binary)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.data.as_bytes(), Some([0xde, 0xad].as_slice()));
    }

    #[tokio::test]
    async fn fail_when_transport_settles_nothing() {
        let transport = MockTransport::scripted(vec![]);

        let err = Dispatcher::new(transport)
            .dispatch(description("http://localhost/void"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Network Error");
    }
}
