//! Headers module
//!
//! This module provides header-name normalization, the tiered [`HeaderBag`]
//! container with its flattening rules, content-type inference for structured
//! bodies, and the parser for raw response header blocks.

use std::collections::HashMap;

use crate::core::request::{Body, Method};

pub(crate) const CONTENT_TYPE: &str = "Content-Type";
pub(crate) const APPLICATION_JSON_UTF8: &str = "application/json;charset=utf-8";

/// Headers of a request, kept in three tiers until dispatch.
///
/// Headers can target a single method, every method (the common tier), or the
/// one request the bag belongs to (the instance tier). [`HeaderBag::flatten`]
/// collapses the tiers into the flat mapping handed to the transport; on name
/// collision later tiers win, with per-method weakest and instance strongest.
///
/// Names are compared case-insensitively everywhere, and the first-seen
/// casing of a name is the one preserved in the flattened result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderBag {
    per_method: HashMap<Method, HashMap<String, String>>,
    common: HashMap<String, String>,
    instance: HashMap<String, String>,
}

impl HeaderBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header on the instance tier.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.instance.insert(name.into(), value.into());
        self
    }

    /// Set a header applied to every method.
    pub fn set_common(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.common.insert(name.into(), value.into());
        self
    }

    /// Set a header applied only to requests using `method`.
    pub fn set_for(
        &mut self,
        method: Method,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.per_method
            .entry(method)
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    /// Whether no tier holds any header.
    pub fn is_empty(&self) -> bool {
        self.instance.is_empty()
            && self.common.is_empty()
            && self.per_method.values().all(HashMap::is_empty)
    }

    /// Collapse the tiers into one flat mapping for `method`.
    ///
    /// Merge order is per-method, then common, then instance, so later tiers
    /// win on collision. Flattening a bag that only carries an instance tier
    /// returns that tier unchanged, which makes the operation idempotent over
    /// its own output.
    pub fn flatten(&self, method: Method) -> HashMap<String, String> {
        let mut flat = HashMap::new();

        if let Some(tier) = self.per_method.get(&method) {
            for (name, value) in tier {
                insert_preserving_case(&mut flat, name, value.clone());
            }
        }
        for (name, value) in &self.common {
            insert_preserving_case(&mut flat, name, value.clone());
        }
        for (name, value) in &self.instance {
            insert_preserving_case(&mut flat, name, value.clone());
        }

        flat
    }
}

impl From<HashMap<String, String>> for HeaderBag {
    /// Wrap an already-flat mapping as an instance-only bag.
    fn from(instance: HashMap<String, String>) -> Self {
        Self {
            instance,
            ..Self::default()
        }
    }
}

/// Insert `value` under `name`, reusing the casing of an existing
/// case-insensitive match instead of introducing a duplicate key.
pub(crate) fn insert_preserving_case(
    headers: &mut HashMap<String, String>,
    name: &str,
    value: String,
) {
    match headers.keys().find(|key| key.eq_ignore_ascii_case(name)) {
        Some(existing) => {
            let existing = existing.clone();
            headers.insert(existing, value);
        }
        None => {
            headers.insert(name.to_owned(), value);
        }
    }
}

/// Remove every case-insensitive match of `name`.
pub(crate) fn remove_header(headers: &mut HashMap<String, String>, name: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
}

/// Rewrite keys matching `canonical` case-insensitively to the canonical
/// casing.
///
/// Guards against semantically-identical duplicate keys slipping into request
/// construction; after the rewrite at most one key carries the value.
pub fn normalize_header_name(headers: &mut HashMap<String, String>, canonical: &str) {
    let aliases: Vec<String> = headers
        .keys()
        .filter(|key| key.as_str() != canonical && key.eq_ignore_ascii_case(canonical))
        .cloned()
        .collect();

    for alias in aliases {
        if let Some(value) = headers.remove(&alias) {
            headers.insert(canonical.to_owned(), value);
        }
    }
}

/// Normalize content-type casing and inject a JSON content-type for
/// structured bodies that do not declare one.
pub fn infer_content_type(headers: &mut HashMap<String, String>, body: Option<&Body>) {
    normalize_header_name(headers, CONTENT_TYPE);

    if matches!(body, Some(Body::Json(_)))
        && !headers.keys().any(|key| key.eq_ignore_ascii_case(CONTENT_TYPE))
    {
        headers.insert(CONTENT_TYPE.to_owned(), APPLICATION_JSON_UTF8.to_owned());
    }
}

/// Parse a raw CRLF-delimited response header block into a mapping.
///
/// Each line splits on its first colon, so values containing colons stay
/// intact. Names are trimmed and lowercased, values trimmed; lines with a
/// blank name are skipped. An empty block yields an empty mapping.
pub fn parse_response_headers(raw: &str) -> HashMap<String, String> {
    let mut parsed = HashMap::new();

    for line in raw.split("\r\n") {
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value),
            None => (line, ""),
        };
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        parsed.insert(name, value.trim().to_owned());
    }

    parsed
}
