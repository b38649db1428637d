//! URL composition module.
//!
//! This module serializes query parameters onto a base URL to produce the
//! final request target, and compares request targets against an origin for
//! the same-origin check used by XSRF injection.

use std::collections::HashMap;

use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use url::Url;

use super::encoding::url_encode;

/// Value of a single query parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryValue {
    /// One value for the key.
    Single(String),
    /// The key is repeated once per element.
    List(Vec<String>),
    /// A point in time, rendered as an RFC 3339 instant.
    Instant(OffsetDateTime),
    /// The key is skipped entirely.
    Omitted,
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<OffsetDateTime> for QueryValue {
    fn from(value: OffsetDateTime) -> Self {
        QueryValue::Instant(value)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(QueryValue::Omitted)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::List(values)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        QueryValue::List(values.into_iter().map(str::to_owned).collect())
    }
}

macro_rules! scalar_query_value {
    ($($ty:ty),+) => {
        $(impl From<$ty> for QueryValue {
            fn from(value: $ty) -> Self {
                QueryValue::Single(value.to_string())
            }
        })+
    };
}

scalar_query_value!(bool, i32, i64, u32, u64, f64);

/// Serialize `params` onto `base`, producing the final request target.
///
/// Any fragment is stripped first; fragments are a client-side artifact and
/// never part of the wire target. The query string joins with `?`, or with
/// `&` when the base already carries a query, and is omitted entirely when
/// the parameters serialize to nothing. Keys are appended in lexicographic
/// order so composed targets are deterministic.
///
/// Percent sequences already present in `base` are not re-examined, so
/// composing again over an already-composed target is not guaranteed
/// lossless.
pub fn build_url(base: &str, params: &HashMap<String, QueryValue>) -> String {
    let mut url = match base.split_once('#') {
        Some((before_fragment, _)) => before_fragment.to_owned(),
        None => base.to_owned(),
    };

    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    let mut parts = Vec::new();
    for key in keys {
        let name = url_encode(key.as_bytes());
        match &params[key] {
            QueryValue::Omitted => {}
            QueryValue::Single(value) => {
                parts.push(format!("{name}={}", url_encode(value.as_bytes())));
            }
            QueryValue::List(values) => {
                parts.extend(
                    values
                        .iter()
                        .map(|value| format!("{name}={}", url_encode(value.as_bytes()))),
                );
            }
            QueryValue::Instant(instant) => {
                if let Ok(value) = instant.format(&Rfc3339) {
                    parts.push(format!("{name}={}", url_encode(value.as_bytes())));
                }
            }
        }
    }

    let serialized = parts.join("&");
    if !serialized.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&serialized);
    }

    url
}

/// Whether `target` shares scheme, host, and port with `origin`.
///
/// A relative target resolves against the origin itself and is same-origin by
/// definition.
pub fn is_same_origin(target: &str, origin: &Url) -> bool {
    match Url::parse(target) {
        Ok(target) => {
            target.scheme() == origin.scheme()
                && target.host_str() == origin.host_str()
                && target.port_or_known_default() == origin.port_or_known_default()
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}
