//! # Courier Core
//!
//! Core functionality of the request dispatch engine.
//!
//! The `core` module contains the data model, the transport capability, and
//! the leaf helpers (header merging, URL composition) the dispatcher is built
//! from.

pub use error::{CourierError, TIMEOUT_ERROR_CODE};
pub mod error;

pub use transport::{Transport, TransportSignal};
pub mod transport;

pub use transport_request::{TransportCall, WireBody};
pub mod transport_request;

pub use transport_response::RawResponse;
pub mod transport_response;

pub use request::{
    BasicAuth, Body, FormPart, Method, ProgressHandler, RequestDescription,
    RequestDescriptionBuilder, ResponseKind, TransferProgress,
};
pub mod request;

pub use response::{ResponseData, ResponseEnvelope};
pub mod response;

pub use cancel::{CancelSource, CancelToken};
pub mod cancel;

pub use cookie::{CookieStore, NoCookies};
pub mod cookie;

pub use utils::{headers::HeaderBag, url::QueryValue};
pub mod utils;
