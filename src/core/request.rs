//! # Request description
//!
//! This module contains the [`RequestDescription`] struct and the value types
//! it is built from. A description is the normalized input of the dispatch
//! engine: defaults merging and interceptor chains are collaborators that run
//! before one is handed over.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use derive_builder::Builder;

use crate::core::{
    cancel::CancelToken,
    utils::{headers::HeaderBag, url::QueryValue},
};

/// The method to use for a request.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub enum Method {
    /// Retrieve a representation of the target.
    #[default]
    Get,

    /// Like GET, without a response body.
    Head,

    /// Submit a payload to the target.
    Post,

    /// Replace the target with the payload.
    Put,

    /// Apply a partial modification to the target.
    Patch,

    /// Remove the target.
    Delete,

    /// Describe the communication options of the target.
    Options,
}

impl Method {
    /// Uppercase wire form of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// Parse a method name, ignoring case. `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Method> {
        [
            Method::Get,
            Method::Head,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
            Method::Options,
        ]
        .into_iter()
        .find(|method| method.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a request.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Structured payload. Serialized to JSON by the config pipeline, and
    /// the trigger for content-type inference.
    Json(serde_json::Value),

    /// Plain text payload.
    Text(String),

    /// Opaque payload, passed through untouched.
    Bytes(Vec<u8>),

    /// Multipart form payload. The transport computes the boundary-bearing
    /// content-type itself.
    Multipart(Vec<FormPart>),
}

impl Body {
    /// Build a structured body from any serializable value.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Body, serde_json::Error> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }
}

/// One part of a multipart form body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormPart {
    /// Field name of the part.
    pub name: String,

    /// Raw content of the part.
    pub value: Vec<u8>,

    /// Optional file name forwarded with the part.
    pub filename: Option<String>,

    /// Optional MIME type of the part.
    pub mime: Option<String>,
}

impl FormPart {
    /// Create a part with `name` and raw `value`.
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            filename: None,
            mime: None,
        }
    }

    /// Attach a file name to the part.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Attach a MIME type to the part.
    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// How the response body should be decoded into the envelope.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ResponseKind {
    /// Decode the body as text.
    #[default]
    Text,

    /// Keep the raw body bytes.
    Binary,

    /// Parse the body as JSON, falling back to text when parsing fails.
    Json,
}

/// Credentials injected as a `Basic` authorization header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// Account name.
    pub username: String,

    /// Account password.
    pub password: String,
}

impl BasicAuth {
    /// Create credentials for `username`/`password`.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Snapshot of transfer progress reported by the transport.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TransferProgress {
    /// Bytes transferred so far.
    pub loaded: u64,

    /// Total bytes expected, when known.
    pub total: Option<u64>,
}

/// Callback wired directly to the transport's native progress signals.
#[derive(Clone)]
pub struct ProgressHandler(Arc<dyn Fn(TransferProgress) + Send + Sync>);

impl ProgressHandler {
    /// Wrap a callback.
    pub fn new(handler: impl Fn(TransferProgress) + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    pub(crate) fn call(&self, progress: TransferProgress) {
        (self.0)(progress)
    }
}

impl fmt::Debug for ProgressHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressHandler")
    }
}

/// Normalized description of one request.
///
/// Built through [`RequestDescription::builder`]; the target URL is the only
/// required field, and leaving it out is a programming error surfaced by the
/// builder before anything is dispatched.
///
/// The config pipeline rewrites the URL, header, and body fields in place
/// before the dispatch engine consumes the description.
///
/// # Examples
/// ```
/// use courier::core::{Method, RequestDescription};
///
/// let request = RequestDescription::builder()
///     .url("https://api.example.com/notes")
///     .method(Method::Post)
///     .body(courier::core::Body::Json(serde_json::json!({ "text": "hi" })))
///     .build()
///     .expect("url is set");
///
/// assert_eq!(request.method, Method::Post);
/// ```
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned", setter(into))]
pub struct RequestDescription {
    /// Target URL. May be relative when the dispatcher knows its origin.
    pub url: String,

    /// HTTP method of the request.
    #[builder(default)]
    pub method: Method,

    /// Tiered headers, collapsed by the config pipeline.
    #[builder(default)]
    pub headers: HeaderBag,

    /// Query parameters composed onto the URL by the config pipeline.
    #[builder(default)]
    pub params: HashMap<String, QueryValue>,

    /// Payload, absent for body-less requests.
    #[builder(default, setter(strip_option))]
    pub body: Option<Body>,

    /// How to decode the response body.
    #[builder(default)]
    pub response_kind: ResponseKind,

    /// Deadline enforced by the transport. Absent means no deadline.
    #[builder(default, setter(strip_option))]
    pub timeout: Option<Duration>,

    /// Whether cross-site requests carry credentials; also enables XSRF
    /// injection regardless of origin.
    #[builder(default)]
    pub with_credentials: bool,

    /// Name of the cookie holding the XSRF token.
    #[builder(default, setter(strip_option))]
    pub xsrf_cookie_name: Option<String>,

    /// Header under which the XSRF token is echoed back.
    #[builder(default, setter(strip_option))]
    pub xsrf_header_name: Option<String>,

    /// Basic-auth credentials for the `Authorization` header.
    #[builder(default, setter(strip_option))]
    pub auth: Option<BasicAuth>,

    /// Called for every download progress signal.
    #[builder(default, setter(strip_option))]
    pub on_download_progress: Option<ProgressHandler>,

    /// Called for every upload progress signal.
    #[builder(default, setter(strip_option))]
    pub on_upload_progress: Option<ProgressHandler>,

    /// Cancellation token observed while the request is in flight.
    #[builder(default, setter(strip_option))]
    pub cancel_token: Option<CancelToken>,
}

impl RequestDescription {
    /// Start building a description.
    pub fn builder() -> RequestDescriptionBuilder {
        RequestDescriptionBuilder::default()
    }
}
