//! Test fixtures and PDF builders.
//!
//! [`TestPdfBuilder`] writes the object graph by hand so run geometry is
//! known exactly: its font advances every glyph by one em and spans
//! 1.2 em vertically, so text at size 10 is 10 points per character and
//! 12 points tall.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// One `Tj` at a baseline position.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

/// Builder for creating test PDFs with positioned text.
///
/// # Example
///
/// ```no_run
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// let bytes = TestPdfBuilder::new()
///     .with_line("Invoice #123", 50.0, 700.0, 10.0)
///     .with_page()
///     .with_line("Page two", 72.0, 720.0, 10.0)
///     .build_bytes()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    pages: Vec<Vec<TextLine>>,
    page_width: f32,
    page_height: f32,
}

impl TestPdfBuilder {
    /// Creates a builder for one empty US Letter page.
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            page_width: 612.0,
            page_height: 792.0,
        }
    }

    /// Adds a line of text to the current (last) page.
    pub fn with_line(mut self, text: &str, x: f32, y: f32, size: f32) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(TextLine {
                text: text.to_string(),
                x,
                y,
                size,
            });
        }
        self
    }

    /// Starts a new page.
    pub fn with_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Sets page dimensions in points.
    pub fn with_dimensions(mut self, width: f32, height: f32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    /// Builds the PDF in memory.
    pub fn build_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let descriptor_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"FontDescriptor".to_vec())),
            ("FontName", Object::Name(b"RetextTestMono".to_vec())),
            ("Flags", Object::Integer(32)),
            ("Ascent", Object::Integer(1200)),
            ("Descent", Object::Integer(0)),
        ]));
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"RetextTestMono".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            ("FirstChar", Object::Integer(32)),
            ("LastChar", Object::Integer(126)),
            ("Widths", Object::Array(vec![Object::Integer(1000); 95])),
            ("FontDescriptor", Object::Reference(descriptor_id)),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "F1",
                Object::Reference(font_id),
            )])),
        )]));

        let mut kids = Vec::new();
        for lines in &self.pages {
            let mut operations = Vec::new();
            for line in lines {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Real(line.size)],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Real(line.x), Object::Real(line.y)],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(
                        line.text.as_bytes().to_vec(),
                        StringFormat::Literal,
                    )],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations }.encode()?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(kids.len() as i64)),
            ("Kids", Object::Array(kids)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(self.page_width),
                    Object::Real(self.page_height),
                ]),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(&self, output_path: &Path) -> Result<PathBuf> {
        std::fs::write(output_path, self.build_bytes()?)?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The one-page invoice: "Invoice #123" with its box at
/// `{x: 50, y: 700, width: 120, height: 12}` on a Letter page.
pub fn invoice_pdf() -> Result<Vec<u8>> {
    TestPdfBuilder::new()
        .with_line("Invoice #123", 50.0, 700.0, 10.0)
        .with_line("Total due: 42.00", 50.0, 660.0, 10.0)
        .build_bytes()
}

/// A one-page document whose only font is `font`, showing `shown` once
/// as a hex string at (100, 500) with size `size`.
pub fn single_font_pdf(font: Dictionary, shown: &[u8], size: f32) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font);

    let operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Real(size)]),
        Operation::new("Td", vec![Object::Integer(100), Object::Integer(500)]),
        Operation::new(
            "Tj",
            vec![Object::String(shown.to_vec(), StringFormat::Hexadecimal)],
        ),
        Operation::new("ET", vec![]),
    ];
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        Content { operations }.encode()?,
    ));
    let page_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
        (
            "Resources",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "Font",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "F1",
                    Object::Reference(font_id),
                )])),
            )])),
        ),
    ]));

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(1)),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// A document produced by a real generator, using the built-in
/// Helvetica without explicit widths.
pub fn printpdf_document(lines: &[&str]) -> Result<Vec<u8>> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    let (doc, page, layer) = PdfDocument::new("Retext Test", Mm(215.9), Mm(279.4), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let current_layer = doc.get_page(page).get_layer(layer);
    for (i, line) in lines.iter().enumerate() {
        current_layer.use_text(*line, 12.0, Mm(20.0), Mm(250.0 - 10.0 * i as f32), &font);
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)?;
    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let builder = TestPdfBuilder::new()
            .with_line("a", 0.0, 0.0, 10.0)
            .with_page()
            .with_line("b", 0.0, 0.0, 10.0)
            .with_line("c", 0.0, 20.0, 10.0);
        assert_eq!(builder.pages.len(), 2);
        assert_eq!(builder.pages[1].len(), 2);
    }
}
