//! The stored document and its encoding as file content on the storage provider.
//!
//! The provider holds the document as a Base64-encoded file of pretty-printed JSON text. Nothing
//! here looks inside the document itself.

use std::{io, string::FromUtf8Error};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use derive_more::derive::{AsRef, Deref, Display, From};
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use thiserror::Error;

/// The caller's JSON document, of whatever shape the caller chooses.
pub(crate) type Document = serde_json::Value;

/// The storage provider's identifier for one exact version of the file's content (its "sha").
///
/// A write must present the token of the version it's replacing. The provider rejects the write if
/// the file has changed since.
#[derive(
    Deref, AsRef, Display, From, Deserialize, Serialize, Clone, PartialEq, Eq, Hash, Debug,
)]
#[as_ref(forward)]
#[serde(transparent)]
pub(crate) struct VersionToken(String);

/// Encodes a document as file content: pretty-printed JSON with two-space indentation, in Base64.
///
/// The text is byte-for-byte what a browser's `JSON.stringify(document, null, 2)` gives, so the
/// file doesn't change when a browser app and this server take turns writing it.
pub(crate) fn encode(document: &Document) -> String {
    let mut text = Vec::new();
    let mut serializer = Serializer::with_formatter(
        &mut text,
        JsPrettyFormatter(PrettyFormatter::with_indent(b"  ")),
    );

    document
        .serialize(&mut serializer)
        .expect("JSON values should always be serializable to memory");

    STANDARD.encode(text)
}

/// A [`PrettyFormatter`] that writes floating-point numbers the way JavaScript does: without a
/// trailing `.0`, with `-0` as `0`, and in exponent notation only below 1e-6 or from 1e21 up.
#[derive(Debug)]
struct JsPrettyFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for JsPrettyFormatter<'_> {
    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.write_f64(writer, value.into())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(ryu_js::Buffer::new().format(value).as_bytes())
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_value(writer)
    }
}

/// An error decoding file content into a [`Document`].
#[derive(Error, Debug)]
pub(crate) enum DecodeError {
    /// The content isn't valid Base64.
    #[error("file content isn't valid Base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes aren't valid UTF-8.
    #[error("file content isn't valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// The decoded text isn't valid JSON.
    #[error("file content isn't valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes file content into a [`Document`].
///
/// # Errors
///
/// See [`DecodeError`].
pub(crate) fn decode(content: &str) -> Result<Document, DecodeError> {
    // The provider breaks Base64 content into lines.
    let content: String = content.split_ascii_whitespace().collect();

    let text = String::from_utf8(STANDARD.decode(content)?)?;

    Ok(serde_json::from_str(&text)?)
}
