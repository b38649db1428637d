//! Percent-encoding module.

use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters that survive query-string encoding unescaped.
///
/// Alongside the RFC 3986 unreserved marks, the set keeps `@ : $ , [ ]`
/// readable to match the ergonomics of common query strings; spaces become
/// `%20`. Everything else reserved is escaped.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'@')
    .remove(b':')
    .remove(b'$')
    .remove(b',')
    .remove(b'[')
    .remove(b']');

/// `percent_encoding` crate recommends you to create your own set for
/// encoding. To be consistent in the whole codebase - we created a function
/// that can be used for encoding related stuff.
pub fn url_encode(data: &[u8]) -> String {
    percent_encode(data, QUERY).to_string()
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn keep_conventional_query_characters_unescaped() {
        assert_eq!(url_encode(b"@:$,[]-_.~"), "@:$,[]-_.~");
    }

    #[test]
    fn escape_reserved_characters() {
        assert_eq!(url_encode(b"a b&c=d?e#f"), "a%20b%26c%3Dd%3Fe%23f");
    }
}
