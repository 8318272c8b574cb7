//! PDF Trailer
//!
//! The dictionary that follows the xref table, ISO 32000-1 Section 7.5.5.
//! It names the document's entry points: `/Root`, `/Size`, optionally
//! `/Info`, `/Prev` and `/Encrypt`.

use super::objects::{ObjectRef, PdfDictionary};
use super::{ParseError, ParseResult};

/// The trailer dictionary with typed accessors.
#[derive(Debug, Clone, Default)]
pub struct PdfTrailer {
    dict: PdfDictionary,
    xref_offset: u64,
}

impl PdfTrailer {
    /// Wrap the parsed trailer dictionary
    pub fn new(dict: PdfDictionary, xref_offset: u64) -> Self {
        PdfTrailer { dict, xref_offset }
    }

    /// The underlying dictionary
    pub fn dict(&self) -> &PdfDictionary {
        &self.dict
    }

    /// Offset of the xref table this trailer followed
    pub fn xref_offset(&self) -> u64 {
        self.xref_offset
    }

    /// The `/Root` catalog reference; its absence is unrecoverable
    pub fn root(&self) -> ParseResult<ObjectRef> {
        self.dict
            .get("/Root")
            .and_then(|v| v.as_reference())
            .ok_or(ParseError::RootUnresolvable)
    }

    /// The `/Size` entry, when present
    pub fn size(&self) -> Option<i64> {
        self.dict.get("/Size").map(|v| v.to_integer())
    }

    /// The `/Info` reference, when present
    pub fn info(&self) -> Option<ObjectRef> {
        self.dict.get("/Info").and_then(|v| v.as_reference())
    }

    /// The `/Prev` offset of an earlier xref section, when present
    pub fn prev(&self) -> Option<i64> {
        self.dict.get("/Prev").map(|v| v.to_integer())
    }

    /// Whether the document declares encryption
    pub fn is_encrypted(&self) -> bool {
        self.dict.contains_key("/Encrypt")
    }

    /// The `/Encrypt` reference, when present
    pub fn encrypt(&self) -> Option<ObjectRef> {
        self.dict.get("/Encrypt").and_then(|v| v.as_reference())
    }

    /// Check the invariants the importer depends on: the document must not
    /// be encrypted and must name a root catalog.
    pub fn validate(&self) -> ParseResult<()> {
        if self.is_encrypted() {
            return Err(ParseError::Encrypted);
        }
        self.root()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::objects::PdfValue;

    fn trailer_with(entries: &[(&str, PdfValue)]) -> PdfTrailer {
        let mut dict = PdfDictionary::new();
        for (key, value) in entries {
            dict.insert(*key, value.clone());
        }
        PdfTrailer::new(dict, 116)
    }

    #[test]
    fn test_trailer_basic() {
        let trailer = trailer_with(&[
            ("/Size", PdfValue::Integer(6)),
            ("/Root", PdfValue::Reference(ObjectRef::new(1, 0))),
        ]);
        assert_eq!(trailer.root().unwrap(), ObjectRef::new(1, 0));
        assert_eq!(trailer.size(), Some(6));
        assert_eq!(trailer.info(), None);
        assert!(!trailer.is_encrypted());
        assert!(trailer.validate().is_ok());
        assert_eq!(trailer.xref_offset(), 116);
    }

    #[test]
    fn test_trailer_missing_root() {
        let trailer = trailer_with(&[("/Size", PdfValue::Integer(6))]);
        assert!(matches!(trailer.root(), Err(ParseError::RootUnresolvable)));
        assert!(matches!(
            trailer.validate(),
            Err(ParseError::RootUnresolvable)
        ));
    }

    #[test]
    fn test_trailer_encrypted() {
        let trailer = trailer_with(&[
            ("/Root", PdfValue::Reference(ObjectRef::new(1, 0))),
            ("/Encrypt", PdfValue::Reference(ObjectRef::new(9, 0))),
        ]);
        assert!(trailer.is_encrypted());
        assert_eq!(trailer.encrypt(), Some(ObjectRef::new(9, 0)));
        assert!(matches!(trailer.validate(), Err(ParseError::Encrypted)));
    }

    #[test]
    fn test_trailer_prev_and_info() {
        let trailer = trailer_with(&[
            ("/Root", PdfValue::Reference(ObjectRef::new(1, 0))),
            ("/Info", PdfValue::Reference(ObjectRef::new(2, 0))),
            ("/Prev", PdfValue::Integer(5000)),
        ]);
        assert_eq!(trailer.info(), Some(ObjectRef::new(2, 0)));
        assert_eq!(trailer.prev(), Some(5000));
    }
}
