//! Percent-encoding for the segments of a storage provider URL, using the [`percent_encoding`]
//! crate.

use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// All ASCII characters in the [component percent-encode
/// set](https://url.spec.whatwg.org/#component-percent-encode-set).
///
/// Using this with [`utf8_percent_encode`] gives identical results to JavaScript's
/// [`encodeURIComponent`](https://developer.mozilla.org/docs/Web/JavaScript/Reference/Global_Objects/encodeURIComponent).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The set of [`COMPONENT`] ASCII characters, but with `/` excluded.
const COMPONENT_IGNORING_SLASH: &AsciiSet = &COMPONENT.remove(b'/');

/// Encodes a single URL path segment, such as a repository owner or name.
pub(crate) fn encode_segment(segment: &str) -> Cow<'_, str> {
    utf8_percent_encode(segment, COMPONENT).into()
}

/// Encodes a file path within a repository, keeping its `/` separators intact. Leading slashes are
/// dropped since the path is always relative to the repository root.
pub(crate) fn encode_file_path(path: &str) -> Cow<'_, str> {
    utf8_percent_encode(path.trim_start_matches('/'), COMPONENT_IGNORING_SLASH).into()
}
