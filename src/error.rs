//! Error types for termbook operations.
//!
//! [`Error`] is only returned by the collaborators that touch the outside
//! world (archives, files). The rendering core never fails: recoverable
//! problems are reported as [`Degradation`] values next to the output.

use thiserror::Error;

/// Errors that can occur while reading books or chapter resources.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A problem the renderer recovered from.
///
/// Published books are untrusted input, so every stage degrades instead of
/// failing. The variants are kept on the rendered chapter so callers can
/// surface them (or ignore them).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Degradation {
    /// The tokenizer reported parse errors; output is best effort.
    #[error("malformed markup ({count} parse errors, first: {first})")]
    MalformedMarkup { count: usize, first: String },
    /// A language hint did not resolve to a tokenizer.
    #[error("no tokenizer for language hint {hint:?}")]
    UnsupportedLanguage { hint: String },
    /// The tokenizer failed mid-block; the block was rendered uncoloured.
    #[error("highlighting failed: {reason}")]
    HighlightFailed { reason: String },
    /// Image bytes were missing or could not be decoded.
    #[error("could not load image {src}: {reason}")]
    ImageDecode { src: String, reason: String },
    /// The colour-pair table is full; remaining cells use unpaired colours.
    #[error("colour pair budget of {capacity} exhausted")]
    ColorBudgetExhausted { capacity: usize },
}
