//! # pdf-import
//!
//! A pure Rust reader for existing PDF files that extracts pages as reusable
//! templates: the raw content stream, the fonts the page's resources name,
//! and the five standard bounding boxes (MediaBox, CropBox, BleedBox,
//! TrimBox, ArtBox) with parental inheritance and fallback resolution.
//!
//! The crate opens a document, locates and parses its cross-reference table,
//! resolves indirect object references by seeking to their byte offsets, and
//! walks the `Catalog -> Pages -> Kids` tree on demand. It deliberately does
//! not decompress stream filters, decrypt documents, or render anything --
//! the [`TemplatePage`] it produces is raw page material for a separately
//! produced PDF to re-embed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_import::PdfDocument;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = PdfDocument::open("existing.pdf")?;
//! println!("PDF version {}", document.version());
//!
//! for number in 1..=document.page_count()? {
//!     let template = document.page(number)?;
//!     let (_, size) = template.size();
//!     println!(
//!         "page {number}: {}x{} points, {} content bytes, measured by {}",
//!         size.width,
//!         size.height,
//!         template.bytes().len(),
//!         template.last_used_box_name(),
//!     );
//!     for (name, font) in template.fonts() {
//!         println!("  font {name}: {} ({})", font.base_font, font.subtype);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`parser`] - the lexical and syntactic layer: byte source, tokenizer,
//!   value parser, xref table, trailer and the document model
//! - [`boxes`] - bounding box kinds, scaled boxes and the fallback ladder
//! - [`template`] - the extracted [`TemplatePage`] and its resources
//! - [`geometry`] - points and sizes
//!
//! ## Scope
//!
//! Classic xref tables only; cross-reference streams and object streams
//! (PDF 1.5) are out of scope, as are text extraction and write support.
//! Encrypted documents are detected and refused.

pub mod boxes;
pub mod geometry;
pub mod parser;
pub mod template;

pub use boxes::{BoxKind, PageBox, PageBoxes};
pub use geometry::{Point, Size};
pub use parser::{
    ObjectDeclaration, ObjectRef, ParseError, ParseOptions, ParseResult, PdfArray, PdfDictionary,
    PdfDocument, PdfReader, PdfStream, PdfString, PdfValue, ValueKind, Warning, XRefTable,
};
pub use template::{FontDescriptor, ImageResource, TemplatePage};

/// Current version of pdf-import
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
