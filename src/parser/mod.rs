//! PDF parsing layer
//!
//! Implements the lexical and syntactic reader for existing PDF files: a
//! seekable byte source, a mode-switching tokenizer, a recursive-descent
//! value parser, and the xref-directed document model built on top of them.

pub mod byte_source;
pub mod document;
pub mod filters;
pub mod lexer;
pub mod objects;
pub mod reader;
pub mod trailer;
pub mod xref;

use crate::boxes::BoxKind;
use std::sync::Arc;

pub use self::byte_source::ByteSource;
pub use self::document::PdfDocument;
pub use self::lexer::{Lexer, Token};
pub use self::objects::{
    ObjectDeclaration, ObjectRef, PdfArray, PdfDictionary, PdfStream, PdfString, PdfValue,
    ValueKind,
};
pub use self::reader::PdfReader;
pub use self::trailer::PdfTrailer;
pub use self::xref::XRefTable;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF parsing errors.
///
/// The fatal kinds surface from [`PdfDocument::open`]; `PageOutOfRange` is
/// recorded on the document and the operation that hit it fails, but later
/// operations keep working.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("missing %PDF header")]
    InvalidHeader,

    #[error("unable to find startxref near end of file")]
    XrefNotFound,

    #[error("malformed xref table line: {line:?}")]
    InvalidXref { line: String },

    #[error("no trailer keyword after xref table")]
    TrailerMissing,

    #[error("trailer is not a dictionary")]
    TrailerNotDictionary,

    #[error("document is encrypted")]
    Encrypted,

    #[error("trailer /Root is missing or unresolvable")]
    RootUnresolvable,

    #[error("page {page} out of range, document has {count} pages")]
    PageOutOfRange { page: u32, count: u32 },

    #[error("missing required key: {0}")]
    MissingKey(String),

    #[error("syntax error: {message}")]
    SyntaxError { message: String },
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::Io(Arc::new(err))
    }
}

impl ParseError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        ParseError::SyntaxError {
            message: message.into(),
        }
    }
}

/// Non-fatal conditions collected while a document is being read.
///
/// Each warning is also emitted through [`log::warn!`] as it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An indirect reference had no xref entry; the value resolved to nothing
    UnresolvedReference { reference: ObjectRef },
    /// A stream's `/Length` could not be resolved; the stream was read empty
    StreamLengthUnresolvable,
    /// A `/Font` resource entry was skipped because its shape was wrong
    MalformedFontResource { name: String },
    /// A `/Filter` name was not recognized; the bytes passed through unchanged
    UnknownFilter { name: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::UnresolvedReference { reference } => {
                write!(f, "unresolved reference {reference}")
            }
            Warning::StreamLengthUnresolvable => {
                write!(f, "stream /Length unresolvable, read as empty")
            }
            Warning::MalformedFontResource { name } => {
                write!(f, "malformed font resource {name}, skipped")
            }
            Warning::UnknownFilter { name } => {
                write!(f, "unknown stream filter /{name}, bytes passed through")
            }
        }
    }
}

/// Options controlling how a document is opened and measured.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// User-unit-to-point factor applied to every box coordinate
    pub scale: f64,
    /// Bounding box selector used by [`PdfDocument::page`]
    pub default_box: BoxKind,
    /// Tolerate a missing `endstream` keyword after stream data
    pub lenient_streams: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            scale: 1.0,
            default_box: BoxKind::DEFAULT,
            lenient_streams: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError::PageOutOfRange { page: 99, count: 1 };
        assert_eq!(err.to_string(), "page 99 out of range, document has 1 pages");

        let err = ParseError::InvalidXref {
            line: "bogus".to_string(),
        };
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ParseError::from(io);
        assert!(matches!(err, ParseError::Io(_)));
        // The sticky-error slot on documents needs Clone to hand copies out.
        let copy = err.clone();
        assert!(copy.to_string().contains("gone"));
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.scale, 1.0);
        assert_eq!(options.default_box, BoxKind::CropBox);
        assert!(options.lenient_streams);
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::UnresolvedReference {
            reference: ObjectRef::new(12, 0),
        };
        assert_eq!(w.to_string(), "unresolved reference 12 0 R");

        let w = Warning::UnknownFilter {
            name: "JBIG2Decode".to_string(),
        };
        assert_eq!(
            w.to_string(),
            "unknown stream filter /JBIG2Decode, bytes passed through"
        );
    }
}
