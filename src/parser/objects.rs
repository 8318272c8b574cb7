//! PDF object model
//!
//! The typed values produced by the recursive-descent parser, ISO 32000-1
//! Section 7.3. Bare names and keywords stay raw [`Token`]s; the parser only
//! commits to a more specific variant when the syntax demands it.

use super::filters;
use super::lexer::Token;
use super::ParseResult;
use std::collections::HashMap;
use std::fmt;

/// Discriminant for [`PdfValue`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Real,
    Token,
    String,
    HexString,
    Array,
    Dictionary,
    Reference,
    ObjectDecl,
    Stream,
}

/// An indirect object reference, the `<obj> <gen> R` construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub obj: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a reference from object and generation numbers
    pub fn new(obj: u32, gen: u16) -> Self {
        ObjectRef { obj, gen }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.obj, self.gen)
    }
}

/// A resolved `<obj> <gen> obj ... endobj` region
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDeclaration {
    /// The declared object identity
    pub reference: ObjectRef,
    /// Body values; typically a dictionary, optionally followed by a stream
    pub values: Vec<PdfValue>,
}

impl ObjectDeclaration {
    /// First body value, if any
    pub fn first(&self) -> Option<&PdfValue> {
        self.values.first()
    }

    /// The object's dictionary: either a direct dictionary value or the
    /// parameter dictionary of a contained stream
    pub fn dict(&self) -> Option<&PdfDictionary> {
        self.values.iter().find_map(|v| match v {
            PdfValue::Dictionary(d) => Some(d),
            PdfValue::Stream(s) => Some(&s.dict),
            _ => None,
        })
    }

    /// The object's stream body, if it has one
    pub fn stream(&self) -> Option<&PdfStream> {
        self.values.iter().find_map(|v| match v {
            PdfValue::Stream(s) => Some(s),
            _ => None,
        })
    }
}

/// String bytes from a literal or hex string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PdfString(pub Vec<u8>);

impl PdfString {
    /// Wrap string bytes
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        PdfString(data.into())
    }

    /// The raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 view when the bytes allow it
    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }
}

/// Ordered sequence of values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfArray(pub Vec<PdfValue>);

impl PdfArray {
    /// Create an empty array
    pub fn new() -> Self {
        PdfArray(Vec::new())
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no elements
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<&PdfValue> {
        self.0.get(index)
    }

    /// Append an element
    pub fn push(&mut self, value: PdfValue) {
        self.0.push(value);
    }

    /// Iterate over the elements
    pub fn iter(&self) -> std::slice::Iter<'_, PdfValue> {
        self.0.iter()
    }
}

/// Name-keyed mapping.
///
/// Keys are the textual names exactly as written in the file, slash
/// included: `dict.get("/Length")`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfDictionary(pub HashMap<String, PdfValue>);

impl PdfDictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        PdfDictionary(HashMap::new())
    }

    /// Look up a value by its `/`-prefixed name
    pub fn get(&self, key: &str) -> Option<&PdfValue> {
        self.0.get(key)
    }

    /// Insert a key-value pair
    pub fn insert(&mut self, key: impl Into<String>, value: PdfValue) {
        self.0.insert(key.into(), value);
    }

    /// Whether the dictionary carries `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the entries
    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, String, PdfValue> {
        self.0.iter()
    }

    /// Value of `/Type` as a bare name, when present
    pub fn type_name(&self) -> Option<String> {
        self.get("/Type").and_then(|v| v.as_name())
    }
}

/// A binary stream with its parameter dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    /// The enclosing object's dictionary
    pub dict: PdfDictionary,
    /// Raw stream bytes, exactly `/Length` of them
    pub data: Vec<u8>,
}

impl PdfStream {
    /// The raw, still-encoded stream bytes
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Run the stream's `/Filter` chain.
    ///
    /// Decoding is delegated; every dispatched filter currently passes the
    /// bytes through unchanged. Unrecognized filter names are logged here;
    /// [`PdfReader::decode_stream`](super::reader::PdfReader::decode_stream)
    /// additionally records them as document warnings.
    pub fn decode(&self) -> ParseResult<Vec<u8>> {
        let (data, unknown) = filters::decode_stream(&self.dict, &self.data)?;
        for name in unknown {
            log::warn!("unknown stream filter /{name}, bytes passed through");
        }
        Ok(data)
    }
}

/// A PDF value as produced by the parser
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Raw token: names such as `/Pages`, keywords, stray delimiters
    Token(Token),
    String(PdfString),
    /// Undecoded bytes between `<` and `>`
    HexString(PdfString),
    Array(PdfArray),
    Dictionary(PdfDictionary),
    Reference(ObjectRef),
    ObjectDecl(ObjectDeclaration),
    Stream(PdfStream),
}

impl PdfValue {
    /// The variant discriminant
    pub fn kind(&self) -> ValueKind {
        match self {
            PdfValue::Null => ValueKind::Null,
            PdfValue::Boolean(_) => ValueKind::Boolean,
            PdfValue::Integer(_) => ValueKind::Integer,
            PdfValue::Real(_) => ValueKind::Real,
            PdfValue::Token(_) => ValueKind::Token,
            PdfValue::String(_) => ValueKind::String,
            PdfValue::HexString(_) => ValueKind::HexString,
            PdfValue::Array(_) => ValueKind::Array,
            PdfValue::Dictionary(_) => ValueKind::Dictionary,
            PdfValue::Reference(_) => ValueKind::Reference,
            PdfValue::ObjectDecl(_) => ValueKind::ObjectDecl,
            PdfValue::Stream(_) => ValueKind::Stream,
        }
    }

    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, PdfValue::Null)
    }

    /// Whether this is the raw token `literal`
    pub fn is_token(&self, literal: &[u8]) -> bool {
        matches!(self, PdfValue::Token(t) if t.is(literal))
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as real number; integers widen
    pub fn as_real(&self) -> Option<f64> {
        match self {
            PdfValue::Real(r) => Some(*r),
            PdfValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string bytes
    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            PdfValue::String(s) | PdfValue::HexString(s) => Some(s),
            _ => None,
        }
    }

    /// Get as raw token
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            PdfValue::Token(t) => Some(t),
            _ => None,
        }
    }

    /// Get as a bare name: a token starting with `/`, slash stripped
    pub fn as_name(&self) -> Option<String> {
        match self {
            PdfValue::Token(t) if t.as_bytes().starts_with(b"/") => {
                Some(String::from_utf8_lossy(&t.as_bytes()[1..]).into_owned())
            }
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as dictionary; streams and object declarations expose theirs
    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfValue::Dictionary(d) => Some(d),
            PdfValue::Stream(s) => Some(&s.dict),
            PdfValue::ObjectDecl(d) => d.dict(),
            _ => None,
        }
    }

    /// Get as stream; object declarations expose theirs
    pub fn as_stream(&self) -> Option<&PdfStream> {
        match self {
            PdfValue::Stream(s) => Some(s),
            PdfValue::ObjectDecl(d) => d.stream(),
            _ => None,
        }
    }

    /// Get as indirect reference
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            PdfValue::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Coerce to an integer; 0 when the conversion is undefined
    pub fn to_integer(&self) -> i64 {
        match self {
            PdfValue::Integer(i) => *i,
            PdfValue::Real(r) => *r as i64,
            _ => 0,
        }
    }

    /// Coerce to a real; NaN when the conversion is undefined
    pub fn to_real(&self) -> f64 {
        match self {
            PdfValue::Real(r) => *r,
            PdfValue::Integer(i) => *i as f64,
            _ => f64::NAN,
        }
    }

    /// Coerce to text; empty when the conversion is undefined
    pub fn to_text(&self) -> String {
        match self {
            PdfValue::String(s) | PdfValue::HexString(s) => {
                String::from_utf8_lossy(&s.0).into_owned()
            }
            PdfValue::Token(t) => t.to_text(),
            PdfValue::Integer(i) => i.to_string(),
            PdfValue::Real(r) => r.to_string(),
            _ => String::new(),
        }
    }
}

/// Render the value back into PDF syntax.
///
/// Together with the parser this round-trips every scalar and container
/// shape the importer produces.
impl fmt::Display for PdfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfValue::Null => f.write_str("null"),
            PdfValue::Boolean(b) => write!(f, "{b}"),
            PdfValue::Integer(i) => write!(f, "{i}"),
            PdfValue::Real(r) => {
                // Keep a decimal point so the rendering lexes as a real.
                if r.fract() == 0.0 && r.is_finite() {
                    write!(f, "{r:.1}")
                } else {
                    write!(f, "{r}")
                }
            }
            PdfValue::Token(t) => write!(f, "{t}"),
            PdfValue::String(s) => {
                let mut escaped = Vec::with_capacity(s.0.len());
                for &b in &s.0 {
                    if matches!(b, b'\\' | b'(' | b')') {
                        escaped.push(b'\\');
                    }
                    escaped.push(b);
                }
                write!(f, "({})", String::from_utf8_lossy(&escaped))
            }
            PdfValue::HexString(s) => write!(f, "<{}>", String::from_utf8_lossy(&s.0)),
            PdfValue::Array(a) => {
                f.write_str("[")?;
                for (i, value) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            PdfValue::Dictionary(d) => {
                f.write_str("<<")?;
                for (key, value) in d.iter() {
                    write!(f, " {key} {value}")?;
                }
                f.write_str(" >>")
            }
            PdfValue::Reference(r) => write!(f, "{r}"),
            PdfValue::ObjectDecl(d) => {
                write!(f, "{} {} obj", d.reference.obj, d.reference.gen)?;
                for value in &d.values {
                    write!(f, " {value}")?;
                }
                f.write_str(" endobj")
            }
            PdfValue::Stream(s) => {
                write!(f, "{}", PdfValue::Dictionary(s.dict.clone()))?;
                write!(f, " stream\n{}\nendstream", String::from_utf8_lossy(&s.data))
            }
        }
    }
}
