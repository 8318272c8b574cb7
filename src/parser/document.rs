//! PDF Document facade
//!
//! High-level entry point for template extraction. A document owns a single
//! file cursor, so every reader access is serialized through a `RefCell`;
//! callers that want parallelism open independent documents over separate
//! handles.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdf_import::{BoxKind, PdfDocument};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = PdfDocument::open("source.pdf")?;
//! println!("version {}", document.version());
//! println!("{} pages", document.page_count()?);
//!
//! let template = document.import_page(1, BoxKind::MediaBox)?;
//! let (_, size) = template.size();
//! println!("page 1 is {}x{} points", size.width, size.height);
//! # Ok(())
//! # }
//! ```

use super::reader::PdfReader;
use super::{ParseError, ParseOptions, ParseResult, Warning};
use crate::boxes::BoxKind;
use crate::geometry::{Point, Size};
use crate::template::TemplatePage;
use log::warn;
use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// An open PDF document ready to hand out page templates.
///
/// Fatal problems (bad header, missing xref, encryption, unresolvable root)
/// surface from [`open`](Self::open). After that the document stays usable;
/// the first error any operation hits is additionally kept in a sticky slot
/// readable through [`error`](Self::error).
pub struct PdfDocument<R: Read + Seek> {
    reader: RefCell<PdfReader<R>>,
    error: RefCell<Option<ParseError>>,
    last_used_page_box: Cell<Option<BoxKind>>,
}

impl PdfDocument<File> {
    /// Open a PDF file for template extraction
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with explicit options
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> ParseResult<Self> {
        Ok(Self::new(PdfReader::open_with_options(path, options)?))
    }
}

impl<R: Read + Seek> PdfDocument<R> {
    /// Open a document over any seekable input.
    ///
    /// Runs the same open sequence as `open` without going through the
    /// filesystem.
    pub fn from_reader(input: R) -> ParseResult<Self> {
        Ok(Self::new(PdfReader::new(input)?))
    }

    /// Wrap an already-opened reader
    pub fn new(reader: PdfReader<R>) -> Self {
        PdfDocument {
            reader: RefCell::new(reader),
            error: RefCell::new(None),
            last_used_page_box: Cell::new(None),
        }
    }

    /// PDF version from the file header, e.g. `"1.4"`
    pub fn version(&self) -> String {
        self.reader.borrow().version().to_string()
    }

    /// Number of pages in the document
    pub fn page_count(&self) -> ParseResult<u32> {
        let result = self.reader.borrow_mut().page_count();
        self.record(result)
    }

    /// Import a page with the default bounding box selector (1-indexed)
    pub fn page(&self, number: u32) -> ParseResult<TemplatePage> {
        let default_box = self.reader.borrow().options().default_box;
        self.import_page(number, default_box)
    }

    /// Import a page measured against a specific bounding box (1-indexed).
    ///
    /// The template owns every byte it needs, so it outlives the document.
    pub fn import_page(&self, number: u32, box_kind: BoxKind) -> ParseResult<TemplatePage> {
        let result = self.import_page_inner(number, box_kind);
        self.record(result)
    }

    fn import_page_inner(&self, number: u32, box_kind: BoxKind) -> ParseResult<TemplatePage> {
        let mut reader = self.reader.borrow_mut();
        let k = reader.options().scale;

        let page = reader.page_dict(number)?;
        let mut boxes = reader.page_boxes(&page, k)?;
        let (origin, size) = match boxes.get(box_kind) {
            Some(found) => (found.lower, found.size),
            None => {
                warn!("page {number} carries no usable bounding box");
                (Point::origin(), Size::default())
            }
        };
        let last_used = boxes.last_used().unwrap_or(box_kind);
        self.last_used_page_box.set(Some(last_used));

        let content = reader.page_contents(&page)?;
        let fonts = reader.page_fonts(&page)?;
        let rotation = reader.page_rotation(&page)?;

        Ok(TemplatePage::new(
            origin, size, k, rotation, content, fonts, last_used,
        ))
    }

    /// The box selector the most recent import actually used
    pub fn last_used_page_box(&self) -> Option<BoxKind> {
        self.last_used_page_box.get()
    }

    /// The first error any operation on this document hit, if any
    pub fn error(&self) -> Option<ParseError> {
        self.error.borrow().clone()
    }

    /// Warnings accumulated while reading
    pub fn warnings(&self) -> Vec<Warning> {
        self.reader.borrow().warnings().to_vec()
    }

    /// Release the underlying file handle.
    ///
    /// Templates already extracted stay valid; they own their bytes.
    pub fn close(self) {
        drop(self);
    }

    fn record<T>(&self, result: ParseResult<T>) -> ParseResult<T> {
        if let Err(err) = &result {
            let mut slot = self.error.borrow_mut();
            if slot.is_none() {
                *slot = Some(err.clone());
            }
        }
        result
    }
}
