//! # Courier
//!
//! Courier is the request-dispatch core of an HTTP client: it takes one
//! normalized request description, issues one transport call, observes its
//! lifecycle, and settles exactly once with a response envelope or a typed
//! failure.
//!
//! The crate deliberately stops at the dispatch boundary. Defaults merging,
//! interceptor chains, retries, pooling, and caching are collaborators that
//! sit around this core, not inside it.
//!
//! # Features
//!
//! - `reqwest` (default) - enables the [`reqwest`]-backed transport
//!   implementation in [`transport`].
//!
//! # Examples
//!
//! ```no_run
//! use courier::{
//!     core::{Body, Method, RequestDescription},
//!     dispatch::Dispatcher,
//!     transport::TransportReqwest,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = RequestDescription::builder()
//!     .url("https://api.example.com/notes")
//!     .method(Method::Post)
//!     .body(Body::Json(serde_json::json!({ "text": "hi" })))
//!     .build()?;
//!
//! let response = Dispatcher::new(TransportReqwest::new())
//!     .dispatch(request)
//!     .await?;
//!
//! println!("{} {}", response.status, response.status_text);
//! # Ok(())
//! # }
//! ```
//!
//! [`reqwest`]: https://docs.rs/reqwest

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod core;
pub mod dispatch;
#[cfg(feature = "reqwest")]
pub mod transport;

#[doc(inline)]
pub use crate::core::{
    Body, CancelSource, CancelToken, CourierError, HeaderBag, Method, QueryValue,
    RequestDescription, ResponseEnvelope, ResponseKind, Transport,
};
#[doc(inline)]
pub use crate::dispatch::Dispatcher;
