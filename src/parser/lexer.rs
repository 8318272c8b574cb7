//! PDF Lexer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2. One lexer
//! serves every splitting strategy the document model needs -- PDF tokens,
//! raw bytes, calibrated lines, fixed-length reads, scan-until-token and
//! non-advancing peeks -- because the underlying [`ByteSource`] position is
//! the only state, so strategies can change between calls without losing
//! data.

use super::byte_source::ByteSource;
use super::{ParseError, ParseResult};
use std::fmt;
use std::io::{Read, Seek, SeekFrom};

/// Fallback version when the header carries no parseable number
const DEFAULT_PDF_VERSION: &str = "1.3";

/// How many trailing bytes to search for the `startxref` keyword
const STARTXREF_WINDOW: u64 = 1024;

/// How many leading bytes to sample for line-ending calibration
const CALIBRATION_WINDOW: usize = 100;

/// Chunk size for scan-until-token searches
const SCAN_CHUNK: usize = 4096;

/// One unit of PDF syntax as raw bytes.
///
/// Tokens are not always valid UTF-8; comparisons and classification work on
/// the byte level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(Vec<u8>);

impl Token {
    /// Wrap raw token bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Token(bytes.into())
    }

    /// The raw bytes of the token
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lossy text form, for keys and diagnostics
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// Byte-level equality against a literal
    pub fn is(&self, literal: &[u8]) -> bool {
        self.0 == literal
    }

    /// Parse the token as a signed integer
    pub fn parse_integer(&self) -> Option<i64> {
        std::str::from_utf8(&self.0).ok()?.parse().ok()
    }

    /// Parse the token as a real number
    pub fn parse_real(&self) -> Option<f64> {
        std::str::from_utf8(&self.0).ok()?.parse().ok()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl AsRef<[u8]> for Token {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// PDF whitespace: NUL, TAB, LF, FF, CR, SPACE
pub(crate) fn is_pdf_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// Whitespace plus the characters that terminate a regular token.
///
/// `/` is deliberately absent: a name token keeps its leading slash and runs
/// to the next break character.
pub(crate) fn is_pdf_whitespace_or_break(b: u8) -> bool {
    is_pdf_whitespace(b) || matches!(b, b'%' | b'(' | b')' | b'[' | b']' | b'<' | b'>')
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Mode-switching token reader over a seekable byte source.
pub struct Lexer<R: Read + Seek> {
    source: ByteSource<R>,
    line_ending: Vec<u8>,
    version: String,
    header_present: bool,
}

impl<R: Read + Seek> Lexer<R> {
    /// Construct a lexer: calibrate the line ending from the first bytes of
    /// the file, then read the `%PDF-` header line.
    ///
    /// A missing header is not an error here -- the cursor is rewound to the
    /// start and [`header_present`](Self::header_present) reports false, so
    /// the document model can decide whether that is fatal.
    pub fn new(source: ByteSource<R>) -> ParseResult<Self> {
        let mut lexer = Lexer {
            source,
            line_ending: vec![b'\n'],
            version: DEFAULT_PDF_VERSION.to_string(),
            header_present: false,
        };
        lexer.calibrate_line_ending()?;
        lexer.read_version()?;
        Ok(lexer)
    }

    /// Sample the first bytes and record the first line ending seen.
    fn calibrate_line_ending(&mut self) -> ParseResult<()> {
        let sample = self.source.peek(CALIBRATION_WINDOW)?;
        for (i, &b) in sample.iter().enumerate() {
            if b == b'\n' {
                self.line_ending = vec![b'\n'];
                break;
            }
            if b == b'\r' {
                if sample.get(i + 1) == Some(&b'\n') {
                    self.line_ending = vec![b'\r', b'\n'];
                } else {
                    self.line_ending = vec![b'\r'];
                }
                break;
            }
        }
        Ok(())
    }

    /// Read the `%PDF-<d>.<d>` header line and store the version.
    fn read_version(&mut self) -> ParseResult<()> {
        self.source.seek(SeekFrom::Start(0))?;
        let line = match self.read_line()? {
            Some(line) => line,
            None => return Ok(()),
        };
        if !line.starts_with(b"%PDF-") {
            self.source.seek(SeekFrom::Start(0))?;
            return Ok(());
        }
        self.header_present = true;
        if let Some(version) = Self::extract_version(&line[5..]) {
            self.version = version;
        }
        Ok(())
    }

    fn extract_version(rest: &[u8]) -> Option<String> {
        rest.windows(3)
            .find(|w| w[0].is_ascii_digit() && w[1] == b'.' && w[2].is_ascii_digit())
            .map(|w| format!("{}.{}", w[0] as char, w[2] as char))
    }

    /// The version from the header, or "1.3" when it could not be parsed
    pub fn pdf_version(&self) -> &str {
        &self.version
    }

    /// Whether the first line carried the `%PDF-` prefix
    pub fn header_present(&self) -> bool {
        self.header_present
    }

    /// Total input length in bytes
    pub fn len(&self) -> u64 {
        self.source.len()
    }

    /// True for zero-length input
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Current absolute cursor position
    pub fn position(&mut self) -> ParseResult<u64> {
        self.source.position()
    }

    /// Move the cursor to an absolute offset
    pub fn seek_to(&mut self, offset: u64) -> ParseResult<u64> {
        self.source.seek(SeekFrom::Start(offset))
    }

    /// Consume one byte
    pub fn read_byte(&mut self) -> ParseResult<Option<u8>> {
        self.source.read_byte()
    }

    /// Look at the next byte without consuming it
    pub fn peek_byte(&mut self) -> ParseResult<Option<u8>> {
        self.source.peek_byte()
    }

    /// Read up to `n` raw bytes
    pub fn read_bytes(&mut self, n: usize) -> ParseResult<Vec<u8>> {
        self.source.read(n)
    }

    /// Advance the cursor by up to `n` bytes; true when all `n` were
    /// available before end of input
    pub fn skip_bytes(&mut self, n: usize) -> ParseResult<bool> {
        let skipped = self.source.read(n)?.len();
        Ok(skipped == n)
    }

    /// Read up to `n` bytes without advancing
    pub fn peek_bytes(&mut self, n: usize) -> ParseResult<Vec<u8>> {
        self.source.peek(n)
    }

    /// Read one line using the calibrated terminator; a trailing CR is
    /// stripped. `None` at end of input.
    pub fn read_line(&mut self) -> ParseResult<Option<Vec<u8>>> {
        if self.source.peek_byte()?.is_none() {
            return Ok(None);
        }
        let terminator = self.line_ending.clone();
        let mut buf = Vec::new();
        while let Some(b) = self.source.read_byte()? {
            buf.push(b);
            if buf.ends_with(&terminator) {
                buf.truncate(buf.len() - terminator.len());
                break;
            }
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    /// Split in-memory data into lines with the calibrated terminator
    pub fn split_lines(&self, data: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        if data.is_empty() {
            return lines;
        }
        let mut start = 0;
        loop {
            match find_subslice(&data[start..], &self.line_ending) {
                Some(idx) => {
                    let mut line = data[start..start + idx].to_vec();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    lines.push(line);
                    start += idx + self.line_ending.len();
                    if start >= data.len() {
                        break;
                    }
                }
                None => {
                    let mut line = data[start..].to_vec();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    lines.push(line);
                    break;
                }
            }
        }
        lines
    }

    /// Get the next PDF token, skipping leading whitespace.
    ///
    /// Single-pass with one byte of look-ahead: delimiters come back as one-
    /// or two-byte tokens, a `%` comment is consumed through its line and
    /// yielded whole, and anything else runs to the next whitespace-or-break
    /// character.
    pub fn next_token(&mut self) -> ParseResult<Option<Token>> {
        let first = loop {
            match self.source.read_byte()? {
                None => return Ok(None),
                Some(b) if is_pdf_whitespace(b) => continue,
                Some(b) => break b,
            }
        };

        let token = match first {
            b'(' | b')' | b'[' | b']' => Token::new(vec![first]),

            b'<' | b'>' => {
                // Doubled angle brackets open or close a dictionary; a
                // single one delimits a hex string.
                if self.source.peek_byte()? == Some(first) {
                    self.source.read_byte()?;
                    Token::new(vec![first, first])
                } else {
                    Token::new(vec![first])
                }
            }

            b'%' => {
                let mut buf = vec![first];
                while let Some(b) = self.source.peek_byte()? {
                    if b == b'\n' || b == b'\r' {
                        break;
                    }
                    self.source.read_byte()?;
                    buf.push(b);
                }
                Token::new(buf)
            }

            _ => {
                let mut buf = vec![first];
                while let Some(b) = self.source.peek_byte()? {
                    if is_pdf_whitespace_or_break(b) {
                        break;
                    }
                    self.source.read_byte()?;
                    buf.push(b);
                }
                Token::new(buf)
            }
        };

        Ok(Some(token))
    }

    /// Read up to `n` tokens
    pub fn read_tokens(&mut self, n: usize) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity(n);
        while tokens.len() < n {
            match self.next_token()? {
                Some(token) => tokens.push(token),
                None => break,
            }
        }
        Ok(tokens)
    }

    /// Read up to `n` tokens and restore the cursor afterwards.
    ///
    /// A subsequent token read returns exactly the peeked tokens.
    pub fn peek_tokens(&mut self, n: usize) -> ParseResult<Vec<Token>> {
        let saved = self.source.position()?;
        let tokens = self.read_tokens(n)?;
        self.source.seek(SeekFrom::Start(saved))?;
        Ok(tokens)
    }

    /// Advance the cursor to the next occurrence of `target`.
    ///
    /// On success the cursor sits at the first byte of the match. Returns
    /// false when the target does not occur before end of input; the cursor
    /// is then parked at the end.
    pub fn skip_to_token(&mut self, target: &[u8]) -> ParseResult<bool> {
        if target.is_empty() {
            return Ok(true);
        }
        let mut window_start = self.source.position()?;
        loop {
            self.source.seek(SeekFrom::Start(window_start))?;
            let chunk = self.source.read(SCAN_CHUNK.max(target.len()))?;
            if chunk.len() < target.len() {
                return Ok(false);
            }
            if let Some(idx) = find_subslice(&chunk, target) {
                self.source.seek(SeekFrom::Start(window_start + idx as u64))?;
                return Ok(true);
            }
            // Overlap the window by one token length so a match spanning a
            // chunk boundary is still seen.
            window_start += (chunk.len() - target.len() + 1) as u64;
        }
    }

    /// Read every byte up to (not including) the next occurrence of `target`.
    ///
    /// The boolean reports whether the target was actually found; on failure
    /// the bytes read are everything to end of input and no success is
    /// claimed.
    pub fn read_bytes_to_token(&mut self, target: &[u8]) -> ParseResult<(Vec<u8>, bool)> {
        let start = self.source.position()?;
        if self.skip_to_token(target)? {
            let end = self.source.position()?;
            self.source.seek(SeekFrom::Start(start))?;
            let bytes = self.source.read((end - start) as usize)?;
            Ok((bytes, true))
        } else {
            self.source.seek(SeekFrom::Start(start))?;
            let remaining = (self.source.len() - start) as usize;
            let bytes = self.source.read(remaining)?;
            Ok((bytes, false))
        }
    }

    /// Read the lines between the cursor and the next occurrence of `target`
    pub fn read_lines_to_token(&mut self, target: &[u8]) -> ParseResult<(Vec<Vec<u8>>, bool)> {
        let (bytes, found) = self.read_bytes_to_token(target)?;
        Ok((self.split_lines(&bytes), found))
    }

    /// Locate the xref table offset from the `startxref` keyword near the
    /// end of the file.
    ///
    /// Searches the last [`STARTXREF_WINDOW`] bytes for the final
    /// `startxref <digits>` occurrence and parses the offset.
    pub fn find_startxref(&mut self) -> ParseResult<u64> {
        let len = self.source.len();
        let window = STARTXREF_WINDOW.min(len);
        self.source.seek(SeekFrom::Start(len - window))?;
        let tail = self.source.read(window as usize)?;

        let needle = b"startxref";
        let mut result = None;
        let mut from = 0;
        while let Some(idx) = find_subslice(&tail[from..], needle) {
            let at = from + idx;
            let mut j = at + needle.len();
            while j < tail.len() && is_pdf_whitespace(tail[j]) {
                j += 1;
            }
            let digits_start = j;
            while j < tail.len() && tail[j].is_ascii_digit() {
                j += 1;
            }
            if j > digits_start {
                if let Ok(offset) = String::from_utf8_lossy(&tail[digits_start..j]).parse::<u64>() {
                    result = Some(offset);
                }
            }
            from = at + needle.len();
        }
        result.ok_or(ParseError::XrefNotFound)
    }
}
