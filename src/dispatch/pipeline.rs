//! Config pipeline module.
//!
//! The pipeline rewrites a [`RequestDescription`] in place before dispatch:
//! the URL absorbs the query parameters, the header tiers collapse into one
//! flat mapping, and structured bodies take their wire form. Nothing here can
//! fail; malformed input surfaces later as a transport-level failure.

use crate::core::{
    utils::{
        headers::{infer_content_type, HeaderBag},
        url::build_url,
    },
    Body, RequestDescription,
};

/// Rewrite `description` into its dispatch-ready form.
pub fn prepare(description: &mut RequestDescription) {
    description.url = build_url(&description.url, &description.params);

    let mut flat = description.headers.flatten(description.method);
    infer_content_type(&mut flat, description.body.as_ref());
    description.headers = HeaderBag::from(flat);

    if let Some(body) = description.body.take() {
        description.body = Some(transform_body(body));
    }
}

/// Serialize structured payloads to their wire format; opaque and multipart
/// payloads pass through untouched.
fn transform_body(body: Body) -> Body {
    match body {
        Body::Json(value) => Body::Bytes(value.to_string().into_bytes()),
        other => other,
    }
}
