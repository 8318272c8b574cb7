//! Page templates extracted from an existing document
//!
//! A [`TemplatePage`] is a self-contained snapshot of one page: its raw
//! content stream, the fonts its resource dictionary names, and the bounding
//! box it was measured against. Everything is owned, so a template stays
//! valid after the source document is closed.

use crate::boxes::BoxKind;
use crate::geometry::{Point, Size};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

static NEXT_TEMPLATE_ID: AtomicI64 = AtomicI64::new(1);

/// Hand out the next process-global template identifier.
///
/// IDs are monotonic and never reused during the lifetime of the process.
pub fn next_template_id() -> i64 {
    NEXT_TEMPLATE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Minimal description of a font named by a page's resource dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDescriptor {
    /// Value of `/BaseFont`, e.g. `Helvetica`
    pub base_font: String,
    /// Value of `/Subtype`, e.g. `Type1` or `TrueType`
    pub subtype: String,
}

/// An image resource slot.
///
/// The importer does not materialize image data; the collection exists so the
/// template shape is stable for consumers that do.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ImageResource {}

/// A reusable page template read from an existing PDF.
#[derive(Debug, Clone)]
pub struct TemplatePage {
    id: i64,
    origin: Point,
    size: Size,
    scale: f64,
    rotation: i32,
    content: Vec<u8>,
    fonts: HashMap<String, FontDescriptor>,
    images: HashMap<String, ImageResource>,
    templates: Vec<TemplatePage>,
    last_used_box: BoxKind,
}

impl TemplatePage {
    pub(crate) fn new(
        origin: Point,
        size: Size,
        scale: f64,
        rotation: i32,
        content: Vec<u8>,
        fonts: HashMap<String, FontDescriptor>,
        last_used_box: BoxKind,
    ) -> Self {
        TemplatePage {
            id: next_template_id(),
            origin,
            size,
            scale,
            rotation,
            content,
            fonts,
            images: HashMap::new(),
            templates: Vec::new(),
            last_used_box,
        }
    }

    /// The process-global template identifier
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Bounding origin and dimensions of this template
    pub fn size(&self) -> (Point, Size) {
        (self.origin, self.size)
    }

    /// The user-unit-to-point factor the page was measured with
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Inherited `/Rotate` value in degrees, 0 when absent
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Raw content stream bytes, exactly as stored in the file.
    ///
    /// No filter is applied; a consumer that needs the decoded operators
    /// runs the stream's filter chain itself.
    pub fn bytes(&self) -> &[u8] {
        &self.content
    }

    /// Fonts named by the page's resource dictionary
    pub fn fonts(&self) -> &HashMap<String, FontDescriptor> {
        &self.fonts
    }

    /// Image resources used by this template; currently always empty
    pub fn images(&self) -> &HashMap<String, ImageResource> {
        &self.images
    }

    /// Templates nested within this template; currently always empty
    pub fn templates(&self) -> &[TemplatePage] {
        &self.templates
    }

    /// Name of the bounding box selector the template was built from
    pub fn last_used_box_name(&self) -> &'static str {
        self.last_used_box.as_str()
    }

    /// The bounding box selector the template was built from
    pub fn last_used_box(&self) -> BoxKind {
        self.last_used_box
    }
}
