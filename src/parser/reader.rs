//! PDF Reader
//!
//! The xref-directed document model: owns the lexer, parses values by
//! recursive descent, resolves indirect references by seeking to xref
//! offsets, and walks the page tree with attribute inheritance.

use super::byte_source::ByteSource;
use super::lexer::{is_pdf_whitespace, Lexer};
use super::objects::{
    ObjectDeclaration, ObjectRef, PdfArray, PdfDictionary, PdfStream, PdfString, PdfValue,
};
use super::trailer::PdfTrailer;
use super::xref::XRefTable;
use super::{ParseError, ParseOptions, ParseResult, Warning};
use crate::boxes::{BoxKind, PageBox, PageBoxes};
use crate::template::FontDescriptor;
use log::warn;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// Recursion guard for `/Parent` chains and page tree descent
const MAX_TREE_DEPTH: usize = 64;

/// An object body is at most a dictionary followed by its stream
const MAX_OBJECT_VALUES: usize = 2;

/// Low-level reader for one open PDF document.
///
/// All cursor movement funnels through this type; operations that seek away
/// mid-parse (resolving an indirect `/Length`, dereferencing during a page
/// walk) save and restore the position, so callers never observe a moved
/// cursor.
pub struct PdfReader<R: Read + Seek> {
    lexer: Lexer<R>,
    xref: XRefTable,
    trailer: PdfTrailer,
    catalog: PdfDictionary,
    options: ParseOptions,
    /// Dictionary of the object currently being assembled; a stream body
    /// takes its `/Length` from here
    current_dict: Option<PdfDictionary>,
    object_cache: HashMap<ObjectRef, ObjectDeclaration>,
    warnings: Vec<Warning>,
}

impl PdfReader<File> {
    /// Open a PDF file from a path
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file from a path with explicit options
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> ParseResult<Self> {
        let file = File::open(path)?;
        Self::new_with_options(file, options)
    }
}

impl<R: Read + Seek> PdfReader<R> {
    /// Construct a reader over any seekable input
    pub fn new(input: R) -> ParseResult<Self> {
        Self::new_with_options(input, ParseOptions::default())
    }

    /// Construct a reader with explicit options.
    ///
    /// Runs the whole open sequence: header check, `startxref` location,
    /// xref and trailer parsing, encryption detection, root resolution.
    pub fn new_with_options(input: R, options: ParseOptions) -> ParseResult<Self> {
        let lexer = Lexer::new(ByteSource::new(input)?)?;
        if !lexer.header_present() {
            return Err(ParseError::InvalidHeader);
        }

        let mut reader = PdfReader {
            lexer,
            xref: XRefTable::new(),
            trailer: PdfTrailer::default(),
            catalog: PdfDictionary::new(),
            options,
            current_dict: None,
            object_cache: HashMap::new(),
            warnings: Vec::new(),
        };

        let offset = reader.lexer.find_startxref()?;
        reader.read_xref_table(offset)?;
        reader.trailer.validate()?;

        let root = reader.trailer.root()?;
        let catalog = reader
            .resolve_ref(root)?
            .and_then(|decl| decl.dict().cloned())
            .ok_or(ParseError::RootUnresolvable)?;
        reader.catalog = catalog;

        Ok(reader)
    }

    /// PDF version from the file header
    pub fn version(&self) -> &str {
        self.lexer.pdf_version()
    }

    /// The options the reader was opened with
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// The trailer dictionary wrapper
    pub fn trailer(&self) -> &PdfTrailer {
        &self.trailer
    }

    /// The cross-reference table
    pub fn xref(&self) -> &XRefTable {
        &self.xref
    }

    /// The document catalog
    pub fn catalog(&self) -> &PdfDictionary {
        &self.catalog
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Seek to the xref table, index its entries and parse the trailer.
    fn read_xref_table(&mut self, offset: u64) -> ParseResult<()> {
        self.lexer.seek_to(offset)?;
        let (lines, found) = self.lexer.read_lines_to_token(b"trailer")?;
        if !found {
            return Err(ParseError::TrailerMissing);
        }

        self.xref.set_location(offset);
        let mut running: u32 = 0;
        for line in &lines {
            let text = String::from_utf8_lossy(line);
            let text = text.trim();
            if text.is_empty() || text == "xref" {
                continue;
            }

            if let Some((first, count)) = XRefTable::parse_subsection(text) {
                running = first;
                self.xref.note_subsection(first, count);
                continue;
            }

            let (entry_offset, generation, in_use) = XRefTable::parse_entry(text)?;
            if in_use {
                self.xref
                    .insert_entry(ObjectRef::new(running, generation), entry_offset);
            }
            // Free entries still occupy a slot in the subsection.
            running = running.saturating_add(1);
        }

        match self.lexer.next_token()? {
            Some(token) if token.is(b"trailer") => {}
            _ => return Err(ParseError::TrailerMissing),
        }
        match self.read_value()? {
            Some(PdfValue::Dictionary(dict)) => {
                self.trailer = PdfTrailer::new(dict, offset);
                Ok(())
            }
            _ => Err(ParseError::TrailerNotDictionary),
        }
    }

    /// Read the next value from the token stream.
    ///
    /// `None` means the input ran out before a value started.
    pub fn read_value(&mut self) -> ParseResult<Option<PdfValue>> {
        let token = match self.lexer.next_token()? {
            Some(token) => token,
            None => return Ok(None),
        };

        let value = if token.is(b"<") {
            self.read_hex_string()?
        } else if token.is(b"<<") {
            self.read_dictionary()?
        } else if token.is(b"[") {
            self.read_array()?
        } else if token.is(b"(") {
            self.read_literal_string()?
        } else if token.is(b"stream") {
            self.read_stream()?
        } else if token.is(b"true") {
            PdfValue::Boolean(true)
        } else if token.is(b"false") {
            PdfValue::Boolean(false)
        } else if token.is(b"null") {
            PdfValue::Null
        } else if let Some(integer) = token.parse_integer() {
            self.read_numeric(integer)?
        } else if let Some(real) = token.parse_real() {
            PdfValue::Real(real)
        } else {
            PdfValue::Token(token)
        };

        Ok(Some(value))
    }

    /// Hex string: everything up to the closing `>`, kept undecoded.
    fn read_hex_string(&mut self) -> ParseResult<PdfValue> {
        let (bytes, found) = self.lexer.read_bytes_to_token(b">")?;
        if found {
            self.lexer.read_byte()?;
        }
        Ok(PdfValue::HexString(PdfString::new(bytes)))
    }

    /// Dictionary: alternating name and value until `>>`.
    fn read_dictionary(&mut self) -> ParseResult<PdfValue> {
        let mut dict = PdfDictionary::new();
        loop {
            let key = match self.lexer.next_token()? {
                Some(token) => token,
                None => break,
            };
            if key.is(b">>") {
                break;
            }
            let value = match self.read_value()? {
                Some(value) => value,
                None => break,
            };
            if value.is_token(b">>") {
                // Malformed source with a missing value; keep what we saw
                // and stop.
                dict.insert(key.to_text(), value);
                break;
            }
            dict.insert(key.to_text(), value);
        }
        Ok(PdfValue::Dictionary(dict))
    }

    /// Array: values until the matching `]`.
    fn read_array(&mut self) -> ParseResult<PdfValue> {
        let mut values = Vec::new();
        loop {
            let value = match self.read_value()? {
                Some(value) => value,
                None => break,
            };
            if value.is_token(b"]") {
                break;
            }
            values.push(value);
        }
        Ok(PdfValue::Array(PdfArray(values)))
    }

    /// Literal string: byte-level descent tracking nested parentheses.
    /// A backslash makes the following byte literal.
    fn read_literal_string(&mut self) -> ParseResult<PdfValue> {
        let mut depth = 1usize;
        let mut buf = Vec::new();
        while depth > 0 {
            let b = match self.lexer.read_byte()? {
                Some(b) => b,
                None => break,
            };
            match b {
                b'(' => {
                    depth += 1;
                    buf.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth > 0 {
                        buf.push(b);
                    }
                }
                b'\\' => match self.lexer.read_byte()? {
                    Some(next) => buf.push(next),
                    None => break,
                },
                _ => buf.push(b),
            }
        }
        Ok(PdfValue::String(PdfString::new(buf)))
    }

    /// Stream body: sized by the enclosing dictionary's `/Length`.
    fn read_stream(&mut self) -> ParseResult<PdfValue> {
        // Content starts at the first non-whitespace byte after the keyword.
        while let Some(b) = self.lexer.peek_byte()? {
            if !is_pdf_whitespace(b) {
                break;
            }
            self.lexer.read_byte()?;
        }

        let dict = self.current_dict.clone().unwrap_or_default();
        let length = self.stream_length(&dict)?;
        let data = self.lexer.read_bytes(length)?;

        // Consume a following endstream if it is there; otherwise the cursor
        // stays right after the declared length.
        let after_data = self.lexer.position()?;
        match self.lexer.next_token()? {
            Some(token) if token.is(b"endstream") => {}
            _ => {
                self.lexer.seek_to(after_data)?;
                if !self.options.lenient_streams {
                    return Err(ParseError::syntax("missing endstream keyword"));
                }
            }
        }

        Ok(PdfValue::Stream(PdfStream { dict, data }))
    }

    /// Resolve the `/Length` of the object currently being assembled.
    ///
    /// An indirect length seeks away mid-parse; `resolve_ref` restores the
    /// cursor. An unresolvable length downgrades to zero with a warning.
    fn stream_length(&mut self, dict: &PdfDictionary) -> ParseResult<usize> {
        match dict.get("/Length") {
            Some(PdfValue::Integer(n)) if *n >= 0 => Ok(*n as usize),
            Some(PdfValue::Reference(reference)) => {
                let reference = *reference;
                match self.resolve_ref(reference)? {
                    Some(decl) => match decl.first() {
                        Some(PdfValue::Integer(n)) if *n >= 0 => Ok(*n as usize),
                        _ => {
                            self.warn(Warning::StreamLengthUnresolvable);
                            Ok(0)
                        }
                    },
                    None => {
                        self.warn(Warning::StreamLengthUnresolvable);
                        Ok(0)
                    }
                }
            }
            _ => {
                self.warn(Warning::StreamLengthUnresolvable);
                Ok(0)
            }
        }
    }

    /// An integer token needs two tokens of look-ahead: `n g obj` starts an
    /// object declaration, `n g R` is an indirect reference, anything else
    /// leaves a bare integer with the peeked tokens still unread.
    fn read_numeric(&mut self, integer: i64) -> ParseResult<PdfValue> {
        let ahead = self.lexer.peek_tokens(2)?;
        if ahead.len() == 2 {
            if let (Ok(obj), Some(second)) = (u32::try_from(integer), ahead[0].parse_integer()) {
                if let Ok(gen) = u16::try_from(second) {
                    if ahead[1].is(b"obj") {
                        self.lexer.read_tokens(2)?;
                        return self.read_object_declaration(ObjectRef::new(obj, gen));
                    }
                    if ahead[1].is(b"R") {
                        self.lexer.read_tokens(2)?;
                        return Ok(PdfValue::Reference(ObjectRef::new(obj, gen)));
                    }
                }
            }
        }
        Ok(PdfValue::Integer(integer))
    }

    /// Collect an object body after its `obj` keyword.
    ///
    /// Stops at `endobj`, at end of input, or once the widest legal body
    /// (dictionary plus stream) has been read. While the body is open its
    /// dictionary is exposed to stream parsing through `current_dict`.
    fn read_object_declaration(&mut self, reference: ObjectRef) -> ParseResult<PdfValue> {
        let saved = self.current_dict.take();
        let mut values = Vec::new();
        loop {
            if values.len() >= MAX_OBJECT_VALUES {
                break;
            }
            let value = match self.read_value()? {
                Some(value) => value,
                None => break,
            };
            if value.is_token(b"endobj") {
                break;
            }
            if let PdfValue::Dictionary(dict) = &value {
                if values.is_empty() {
                    self.current_dict = Some(dict.clone());
                }
            }
            values.push(value);
        }
        self.current_dict = saved;
        Ok(PdfValue::ObjectDecl(ObjectDeclaration { reference, values }))
    }

    /// Dereference a value to its object declaration.
    ///
    /// Declarations pass through; references go through the xref table; any
    /// other kind logs a warning and resolves to nothing.
    pub fn resolve(&mut self, value: &PdfValue) -> ParseResult<Option<ObjectDeclaration>> {
        match value {
            PdfValue::ObjectDecl(decl) => Ok(Some(decl.clone())),
            PdfValue::Reference(reference) => self.resolve_ref(*reference),
            other => {
                warn!("resolve on a {:?} value resolves to nothing", other.kind());
                Ok(None)
            }
        }
    }

    /// Resolve a reference through the xref table, caching the result.
    ///
    /// The cursor position on entry is restored before returning, so this is
    /// safe to call mid-parse.
    pub fn resolve_ref(&mut self, reference: ObjectRef) -> ParseResult<Option<ObjectDeclaration>> {
        if let Some(cached) = self.object_cache.get(&reference) {
            return Ok(Some(cached.clone()));
        }
        let offset = match self.xref.offset_of(reference) {
            Some(offset) => offset,
            None => {
                self.warn(Warning::UnresolvedReference { reference });
                return Ok(None);
            }
        };

        let saved = self.lexer.position()?;
        let parsed = self.parse_object_at(offset, reference);
        self.lexer.seek_to(saved)?;

        let decl = parsed?;
        if let Some(decl) = &decl {
            self.object_cache.insert(reference, decl.clone());
        }
        Ok(decl)
    }

    fn parse_object_at(
        &mut self,
        offset: u64,
        reference: ObjectRef,
    ) -> ParseResult<Option<ObjectDeclaration>> {
        self.lexer.seek_to(offset)?;
        if let Some(PdfValue::ObjectDecl(decl)) = self.read_value()? {
            if decl.reference == reference {
                return Ok(Some(decl));
            }
        }

        // The offset did not land on the declaration; scan ahead for its
        // header as a recovery path.
        self.lexer.seek_to(offset)?;
        let marker = format!("{} {} obj", reference.obj, reference.gen);
        if self.lexer.skip_to_token(marker.as_bytes())? {
            if let Some(PdfValue::ObjectDecl(decl)) = self.read_value()? {
                if decl.reference == reference {
                    return Ok(Some(decl));
                }
            }
        }

        self.warn(Warning::UnresolvedReference { reference });
        Ok(None)
    }

    /// Follow a possible reference down to its first body value.
    fn materialize(&mut self, value: &PdfValue) -> ParseResult<PdfValue> {
        match value {
            PdfValue::Reference(_) => match self.resolve(value)? {
                Some(decl) => Ok(decl.first().cloned().unwrap_or(PdfValue::Null)),
                None => Ok(PdfValue::Null),
            },
            other => Ok(other.clone()),
        }
    }

    /// Follow a possible reference down to a dictionary.
    fn resolve_to_dict(&mut self, value: &PdfValue) -> ParseResult<Option<PdfDictionary>> {
        match value {
            PdfValue::Dictionary(dict) => Ok(Some(dict.clone())),
            PdfValue::Reference(_) => Ok(self.resolve(value)?.and_then(|d| d.dict().cloned())),
            _ => Ok(None),
        }
    }

    /// The root `/Pages` node of the page tree
    pub fn pages_root(&mut self) -> ParseResult<PdfDictionary> {
        let pages = self
            .catalog
            .get("/Pages")
            .cloned()
            .ok_or_else(|| ParseError::MissingKey("/Pages".to_string()))?;
        self.resolve_to_dict(&pages)?
            .ok_or_else(|| ParseError::MissingKey("/Pages".to_string()))
    }

    /// Total number of pages, from the root node's `/Count`
    pub fn page_count(&mut self) -> ParseResult<u32> {
        let root = self.pages_root()?;
        let count = root
            .get("/Count")
            .cloned()
            .ok_or_else(|| ParseError::MissingKey("/Count".to_string()))?;
        Ok(self.materialize(&count)?.to_integer().max(0) as u32)
    }

    /// Fetch a page dictionary by 1-indexed page number.
    pub fn page_dict(&mut self, number: u32) -> ParseResult<PdfDictionary> {
        let count = self.page_count()?;
        if number == 0 || number > count {
            return Err(ParseError::PageOutOfRange {
                page: number,
                count,
            });
        }
        let root = self.pages_root()?;
        self.find_page(&root, number - 1, 0)
    }

    /// Descend the page tree to the page at `index`, counting intermediate
    /// `/Pages` nodes by their `/Count`.
    fn find_page(
        &mut self,
        node: &PdfDictionary,
        mut index: u32,
        depth: usize,
    ) -> ParseResult<PdfDictionary> {
        if depth > MAX_TREE_DEPTH {
            return Err(ParseError::syntax("page tree deeper than the guard allows"));
        }
        let kids = node
            .get("/Kids")
            .cloned()
            .ok_or_else(|| ParseError::MissingKey("/Kids".to_string()))?;
        let kids = match self.materialize(&kids)? {
            PdfValue::Array(array) => array,
            _ => return Err(ParseError::syntax("/Kids is not an array")),
        };

        for kid in kids.iter() {
            let dict = self
                .resolve_to_dict(kid)?
                .ok_or_else(|| ParseError::syntax("page tree kid is not a dictionary"))?;
            let is_pages_node =
                dict.type_name().as_deref() == Some("Pages") || dict.contains_key("/Kids");
            if is_pages_node {
                let node_count = match dict.get("/Count") {
                    Some(value) => {
                        let value = value.clone();
                        self.materialize(&value)?.to_integer().max(0) as u32
                    }
                    None => 0,
                };
                if index < node_count {
                    return self.find_page(&dict, index, depth + 1);
                }
                index -= node_count;
            } else {
                if index == 0 {
                    return Ok(dict);
                }
                index -= 1;
            }
        }
        Err(ParseError::syntax("page not found in page tree"))
    }

    /// Look a key up on a page, walking `/Parent` links for inheritable
    /// attributes. Bounded by the tree-depth guard against cyclic parents.
    fn inherited_value(
        &mut self,
        page: &PdfDictionary,
        key: &str,
    ) -> ParseResult<Option<PdfValue>> {
        let mut current = page.clone();
        for _ in 0..=MAX_TREE_DEPTH {
            if let Some(value) = current.get(key) {
                return Ok(Some(value.clone()));
            }
            let parent = match current.get("/Parent") {
                Some(parent) => parent.clone(),
                None => return Ok(None),
            };
            current = match self.resolve_to_dict(&parent)? {
                Some(dict) => dict,
                None => return Ok(None),
            };
        }
        Ok(None)
    }

    /// Read one bounding box from a page, with parental inheritance.
    ///
    /// `k` is the caller's user-unit-to-point factor; every coordinate is
    /// divided by it.
    pub fn page_box(
        &mut self,
        page: &PdfDictionary,
        kind: BoxKind,
        k: f64,
    ) -> ParseResult<Option<PageBox>> {
        let value = match self.inherited_value(page, kind.dict_key())? {
            Some(value) => value,
            None => return Ok(None),
        };
        let value = self.materialize(&value)?;
        let array = match value.as_array() {
            Some(array) if array.len() == 4 => array.clone(),
            _ => {
                warn!("{} is not a four-number array", kind.dict_key());
                return Ok(None);
            }
        };

        let corner = |i: usize| array.get(i).map(|v| v.to_real()).unwrap_or(f64::NAN);
        Ok(Some(PageBox::from_corners(
            corner(0),
            corner(1),
            corner(2),
            corner(3),
            k,
        )))
    }

    /// All five standard boxes of a page, ready for fallback lookups.
    pub fn page_boxes(&mut self, page: &PdfDictionary, k: f64) -> ParseResult<PageBoxes> {
        let mut boxes = PageBoxes::new();
        for kind in BoxKind::ALL {
            if let Some(found) = self.page_box(page, kind, k)? {
                boxes.insert(kind, found);
            }
        }
        Ok(boxes)
    }

    /// Raw `/Contents` bytes of a page, verbatim.
    ///
    /// A single stream gives its bytes; an array of streams concatenates
    /// them in order. No filter is applied at this layer.
    pub fn page_contents(&mut self, page: &PdfDictionary) -> ParseResult<Vec<u8>> {
        let contents = match page.get("/Contents") {
            Some(contents) => contents.clone(),
            None => return Ok(Vec::new()),
        };
        let mut out = Vec::new();
        self.append_content(&contents, &mut out, 0)?;
        Ok(out)
    }

    fn append_content(
        &mut self,
        value: &PdfValue,
        out: &mut Vec<u8>,
        depth: usize,
    ) -> ParseResult<()> {
        if depth > MAX_TREE_DEPTH {
            return Ok(());
        }
        match value {
            PdfValue::Stream(stream) => out.extend_from_slice(&stream.data),
            PdfValue::Array(items) => {
                for item in items.iter() {
                    self.append_content(item, out, depth + 1)?;
                }
            }
            PdfValue::Reference(_) => {
                if let Some(decl) = self.resolve(value)? {
                    if let Some(stream) = decl.stream() {
                        out.extend_from_slice(&stream.data);
                    } else if let Some(PdfValue::Array(items)) = decl.first() {
                        let items = items.clone();
                        for item in items.iter() {
                            self.append_content(item, out, depth + 1)?;
                        }
                    } else {
                        warn!("/Contents object is neither a stream nor an array");
                    }
                }
            }
            _ => warn!("/Contents value is neither a stream, array nor reference"),
        }
        Ok(())
    }

    /// Fonts named by the page's (possibly inherited) resource dictionary.
    ///
    /// Entries that do not resolve to a `/Type /Font` dictionary with a
    /// `/BaseFont` are skipped with a warning, never fatal.
    pub fn page_fonts(
        &mut self,
        page: &PdfDictionary,
    ) -> ParseResult<HashMap<String, FontDescriptor>> {
        let mut fonts = HashMap::new();

        let resources = match self.inherited_value(page, "/Resources")? {
            Some(resources) => resources,
            None => return Ok(fonts),
        };
        let resources = match self.resolve_to_dict(&resources)? {
            Some(dict) => dict,
            None => return Ok(fonts),
        };
        let font_dict = match resources.get("/Font") {
            Some(fonts) => fonts.clone(),
            None => return Ok(fonts),
        };
        let font_dict = match self.resolve_to_dict(&font_dict)? {
            Some(dict) => dict,
            None => return Ok(fonts),
        };

        for (name, entry) in font_dict.iter() {
            let resource_name = name.trim_start_matches('/').to_string();
            let dict = match self.resolve_to_dict(entry)? {
                Some(dict) => dict,
                None => {
                    self.warn(Warning::MalformedFontResource {
                        name: resource_name,
                    });
                    continue;
                }
            };
            if dict.type_name().as_deref() != Some("Font") {
                self.warn(Warning::MalformedFontResource {
                    name: resource_name,
                });
                continue;
            }
            let base_font = match dict.get("/BaseFont").and_then(|v| v.as_name()) {
                Some(base_font) => base_font,
                None => {
                    self.warn(Warning::MalformedFontResource {
                        name: resource_name,
                    });
                    continue;
                }
            };
            let subtype = dict
                .get("/Subtype")
                .and_then(|v| v.as_name())
                .unwrap_or_default();
            fonts.insert(resource_name, FontDescriptor { base_font, subtype });
        }
        Ok(fonts)
    }

    /// Run a stream's filter chain, recording every unrecognized filter
    /// name as a document warning. The bytes come back unchanged either
    /// way; real decoding is the collaborator's job.
    pub fn decode_stream(&mut self, stream: &PdfStream) -> ParseResult<Vec<u8>> {
        let (data, unknown) = super::filters::decode_stream(&stream.dict, &stream.data)?;
        for name in unknown {
            self.warn(Warning::UnknownFilter { name });
        }
        Ok(data)
    }

    /// Inherited `/Rotate` value of a page, 0 when absent
    pub fn page_rotation(&mut self, page: &PdfDictionary) -> ParseResult<i32> {
        match self.inherited_value(page, "/Rotate")? {
            Some(value) => {
                let value = self.materialize(&value)?;
                Ok(value.to_integer() as i32)
            }
            None => Ok(0),
        }
    }
}
