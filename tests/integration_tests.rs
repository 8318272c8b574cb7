//! End-to-end tests over generated PDF files.
//!
//! Every fixture is built with computed xref offsets so the files are valid
//! by construction, written into a TempDir, and opened through the public
//! API.

use pdf_import::{
    BoxKind, ObjectRef, ParseError, ParseOptions, PdfDocument, PdfReader, Warning,
};
use std::path::PathBuf;
use tempfile::TempDir;

/// Builds a classic-xref PDF with correct byte offsets.
struct PdfBuilder {
    buf: Vec<u8>,
    offsets: Vec<(u32, usize)>,
}

impl PdfBuilder {
    fn new() -> Self {
        PdfBuilder {
            buf: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    /// Append `number 0 obj <body> endobj`, recording its offset
    fn object(&mut self, number: u32, body: &str) {
        self.offsets.push((number, self.buf.len()));
        self.buf
            .extend_from_slice(format!("{number} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    /// Append a stream object with the given extra dictionary entries
    fn stream_object(&mut self, number: u32, dict_extra: &str, content: &[u8]) {
        self.offsets.push((number, self.buf.len()));
        self.buf.extend_from_slice(
            format!(
                "{number} 0 obj\n<< /Length {}{dict_extra} >>\nstream\n",
                content.len()
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(content);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    /// Append a stream object whose `/Length` is an indirect reference
    fn stream_object_indirect_length(&mut self, number: u32, length_ref: u32, content: &[u8]) {
        self.offsets.push((number, self.buf.len()));
        self.buf.extend_from_slice(
            format!("{number} 0 obj\n<< /Length {length_ref} 0 R >>\nstream\n").as_bytes(),
        );
        self.buf.extend_from_slice(content);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    /// Write the xref table, trailer and startxref pointer
    fn finish(mut self, trailer_extra: &str) -> Vec<u8> {
        self.offsets.sort_by_key(|(number, _)| *number);
        let size = self.offsets.last().map(|(n, _)| n + 1).unwrap_or(1);

        let xref_offset = self.buf.len();
        self.buf
            .extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for (_, offset) in &self.offsets {
            self.buf
                .extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        self.buf.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root 1 0 R{trailer_extra} >>\nstartxref\n{xref_offset}\n%%EOF\n")
                .as_bytes(),
        );
        self.buf
    }
}

const CONTENT: &[u8] = b"BT /F1 12 Tf (Hello) Tj ET";

/// One page, MediaBox on the Pages node, one font, one content stream.
fn minimal_pdf() -> Vec<u8> {
    let mut pdf = PdfBuilder::new();
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(
        2,
        "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 595 842] >>",
    );
    pdf.object(
        3,
        "<< /Type /Page /Parent 2 0 R /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>",
    );
    pdf.stream_object(4, "", CONTENT);
    pdf.object(
        5,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>",
    );
    pdf.finish("")
}

fn write_pdf(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_minimal_document() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "minimal.pdf", &minimal_pdf());

    let doc = PdfDocument::open(&path).unwrap();
    assert_eq!(doc.version(), "1.4");
    assert_eq!(doc.page_count().unwrap(), 1);

    let template = doc.page(1).unwrap();
    let (_, size) = template.size();
    assert_eq!(size.width, 595.0);
    assert_eq!(size.height, 842.0);
    assert_eq!(template.bytes(), CONTENT);
    assert_eq!(template.rotation(), 0);
    assert!(template.images().is_empty());
    assert!(template.templates().is_empty());
    assert!(doc.warnings().is_empty());

    let font = &template.fonts()["F1"];
    assert_eq!(font.base_font, "Helvetica");
    assert_eq!(font.subtype, "Type1");
}

#[test]
fn test_encrypted_document_is_refused() {
    let dir = TempDir::new().unwrap();
    let mut pdf = PdfBuilder::new();
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [] /Count 0 >>");
    let path = write_pdf(&dir, "encrypted.pdf", &pdf.finish(" /Encrypt 6 0 R"));

    assert!(matches!(
        PdfDocument::open(&path),
        Err(ParseError::Encrypted)
    ));
}

#[test]
fn test_page_out_of_range() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "minimal.pdf", &minimal_pdf());

    let doc = PdfDocument::open(&path).unwrap();
    assert!(matches!(
        doc.page(99),
        Err(ParseError::PageOutOfRange { page: 99, count: 1 })
    ));
    assert!(matches!(
        doc.error(),
        Some(ParseError::PageOutOfRange { page: 99, count: 1 })
    ));
    // The failure is not fatal for the document.
    assert!(doc.page(1).is_ok());
}

#[test]
fn test_box_inheritance_matches_parent() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "minimal.pdf", &minimal_pdf());

    let doc = PdfDocument::open(&path).unwrap();
    let template = doc.import_page(1, BoxKind::MediaBox).unwrap();
    let (_, size) = template.size();
    // The page has no MediaBox of its own; the value comes from /Parent.
    assert_eq!(size.width, 595.0);
    assert_eq!(size.height, 842.0);
    assert_eq!(template.last_used_box_name(), "MediaBox");
}

#[test]
fn test_fallback_ladder_records_requested_box() {
    let dir = TempDir::new().unwrap();
    let mut pdf = PdfBuilder::new();
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    pdf.object(
        3,
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] /CropBox [10 20 310 420] >>",
    );
    let path = write_pdf(&dir, "boxes.pdf", &pdf.finish(""));

    let doc = PdfDocument::open(&path).unwrap();

    let crop = doc.import_page(1, BoxKind::CropBox).unwrap();
    let (origin, size) = crop.size();
    assert_eq!(size.width, 300.0);
    assert_eq!(size.height, 400.0);
    assert_eq!(origin.x, 10.0);
    assert_eq!(origin.y, 20.0);

    // BleedBox is absent and falls back to CropBox, but the requested
    // selector is what gets reported.
    let bleed = doc.import_page(1, BoxKind::BleedBox).unwrap();
    let (_, size) = bleed.size();
    assert_eq!(size.width, 300.0);
    assert_eq!(bleed.last_used_box_name(), "BleedBox");
    assert_eq!(doc.last_used_page_box(), Some(BoxKind::BleedBox));
}

#[test]
fn test_scale_factor() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "minimal.pdf", &minimal_pdf());

    let options = ParseOptions {
        scale: 2.0,
        ..ParseOptions::default()
    };
    let doc = PdfDocument::open_with_options(&path, options).unwrap();
    let template = doc.page(1).unwrap();
    let (_, size) = template.size();
    assert_eq!(size.width, 595.0 / 2.0);
    assert_eq!(size.height, 842.0 / 2.0);
}

#[test]
fn test_xref_entries_point_at_declarations() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "minimal.pdf", &minimal_pdf());

    let mut reader = PdfReader::open(&path).unwrap();
    let entries: Vec<ObjectRef> = reader.xref().iter().map(|(r, _)| *r).collect();
    // Every declared object got an in-use entry.
    assert_eq!(entries.len(), 5);
    // And every entry resolves to a declaration with the matching identity.
    for reference in entries {
        let decl = reader.resolve_ref(reference).unwrap().unwrap();
        assert_eq!(decl.reference, reference);
    }
}

#[test]
fn test_indirect_stream_length() {
    let dir = TempDir::new().unwrap();
    let mut pdf = PdfBuilder::new();
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] >>");
    pdf.object(3, "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>");
    pdf.stream_object_indirect_length(4, 5, CONTENT);
    pdf.object(5, &CONTENT.len().to_string());
    let path = write_pdf(&dir, "indirect.pdf", &pdf.finish(""));

    let doc = PdfDocument::open(&path).unwrap();
    let template = doc.page(1).unwrap();
    assert_eq!(template.bytes(), CONTENT);
    assert!(doc.warnings().is_empty());
}

#[test]
fn test_contents_array_concatenates() {
    let dir = TempDir::new().unwrap();
    let mut pdf = PdfBuilder::new();
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] >>");
    pdf.object(3, "<< /Type /Page /Parent 2 0 R /Contents [4 0 R 5 0 R] >>");
    pdf.stream_object(4, "", b"q 1 0 0 1 0 0 cm ");
    pdf.stream_object(5, "", b"Q");
    let path = write_pdf(&dir, "array.pdf", &pdf.finish(""));

    let doc = PdfDocument::open(&path).unwrap();
    let template = doc.page(1).unwrap();
    assert_eq!(template.bytes(), b"q 1 0 0 1 0 0 cm Q");
}

#[test]
fn test_unresolved_contents_warns() {
    let dir = TempDir::new().unwrap();
    let mut pdf = PdfBuilder::new();
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] >>");
    pdf.object(3, "<< /Type /Page /Parent 2 0 R /Contents 9 0 R >>");
    let path = write_pdf(&dir, "dangling.pdf", &pdf.finish(""));

    let doc = PdfDocument::open(&path).unwrap();
    let template = doc.page(1).unwrap();
    assert!(template.bytes().is_empty());
    assert!(doc.warnings().contains(&Warning::UnresolvedReference {
        reference: ObjectRef::new(9, 0)
    }));
}

#[test]
fn test_rotation_is_inherited() {
    let dir = TempDir::new().unwrap();
    let mut pdf = PdfBuilder::new();
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(
        2,
        "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] /Rotate 90 >>",
    );
    pdf.object(3, "<< /Type /Page /Parent 2 0 R >>");
    let path = write_pdf(&dir, "rotated.pdf", &pdf.finish(""));

    let doc = PdfDocument::open(&path).unwrap();
    let template = doc.page(1).unwrap();
    assert_eq!(template.rotation(), 90);
}

#[test]
fn test_nested_page_tree() {
    let dir = TempDir::new().unwrap();
    let mut pdf = PdfBuilder::new();
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 3 /MediaBox [0 0 100 100] >>");
    pdf.object(3, "<< /Type /Pages /Parent 2 0 R /Kids [5 0 R 6 0 R] /Count 2 >>");
    pdf.object(4, "<< /Type /Page /Parent 2 0 R /Contents 7 0 R >>");
    pdf.object(5, "<< /Type /Page /Parent 3 0 R /Contents 8 0 R >>");
    pdf.object(6, "<< /Type /Page /Parent 3 0 R /Contents 9 0 R >>");
    pdf.stream_object(7, "", b"third");
    pdf.stream_object(8, "", b"first");
    pdf.stream_object(9, "", b"second");
    let path = write_pdf(&dir, "nested.pdf", &pdf.finish(""));

    let doc = PdfDocument::open(&path).unwrap();
    assert_eq!(doc.page_count().unwrap(), 3);
    assert_eq!(doc.page(1).unwrap().bytes(), b"first");
    assert_eq!(doc.page(2).unwrap().bytes(), b"second");
    assert_eq!(doc.page(3).unwrap().bytes(), b"third");
}

#[test]
fn test_template_ids_are_unique() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "minimal.pdf", &minimal_pdf());

    let doc = PdfDocument::open(&path).unwrap();
    let a = doc.page(1).unwrap();
    let b = doc.page(1).unwrap();
    assert_ne!(a.id(), b.id());
    assert!(a.id() < b.id());
}

#[test]
fn test_template_outlives_closed_document() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "minimal.pdf", &minimal_pdf());

    let doc = PdfDocument::open(&path).unwrap();
    let template = doc.page(1).unwrap();
    doc.close();
    assert_eq!(template.bytes(), CONTENT);
    assert_eq!(template.fonts().len(), 1);
}

#[test]
fn test_missing_header_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "bad.pdf", b"not a pdf at all\n");

    assert!(matches!(
        PdfDocument::open(&path),
        Err(ParseError::InvalidHeader)
    ));
}

#[test]
fn test_missing_startxref_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "bad.pdf", b"%PDF-1.4\nsome body with no pointer\n%%EOF\n");

    assert!(matches!(
        PdfDocument::open(&path),
        Err(ParseError::XrefNotFound)
    ));
}

#[test]
fn test_missing_trailer_is_fatal() {
    let dir = TempDir::new().unwrap();
    let bytes = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \nstartxref\n9\n%%EOF\n";
    let path = write_pdf(&dir, "bad.pdf", bytes);

    assert!(matches!(
        PdfDocument::open(&path),
        Err(ParseError::TrailerMissing)
    ));
}

#[test]
fn test_malformed_xref_is_fatal() {
    let dir = TempDir::new().unwrap();
    let bytes =
        b"%PDF-1.4\nxref\n0 2\n0000000000 65535 f \nthis is not an entry\ntrailer\n<< /Size 2 /Root 1 0 R >>\nstartxref\n9\n%%EOF\n";
    let path = write_pdf(&dir, "bad.pdf", bytes);

    assert!(matches!(
        PdfDocument::open(&path),
        Err(ParseError::InvalidXref { .. })
    ));
}

#[test]
fn test_trailer_not_a_dictionary_is_fatal() {
    let dir = TempDir::new().unwrap();
    let bytes = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \ntrailer\n42\nstartxref\n9\n%%EOF\n";
    let path = write_pdf(&dir, "bad.pdf", bytes);

    assert!(matches!(
        PdfDocument::open(&path),
        Err(ParseError::TrailerNotDictionary)
    ));
}

#[test]
fn test_unresolvable_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    // /Root names an object the xref table does not know.
    let bytes = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Root 1 0 R >>\nstartxref\n9\n%%EOF\n";
    let path = write_pdf(&dir, "bad.pdf", bytes);

    assert!(matches!(
        PdfDocument::open(&path),
        Err(ParseError::RootUnresolvable)
    ));
}
