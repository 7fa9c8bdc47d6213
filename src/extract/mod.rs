//! Text run extraction.
//!
//! Turns each page into an ordered sequence of [`TextRun`]s, one per
//! text-showing operator, in content-stream order. Runs come out in
//! document space; [`extract_render_runs`] projects them for display.

mod fonts;
mod interpreter;

use crate::document::{EditableDocument, PdfDocument};
use crate::error::{DecodeError, DecodeResult};
use crate::geometry::{DocumentSpace, Rect, RenderSpace, RenderTransform, Space};
use interpreter::TextInterpreter;
use lopdf::content::Content;
use std::ops::Range;

/// A contiguous span of glyphs shown by one operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun<S: Space> {
    pub page_index: usize,
    pub content: String,
    pub bbox: Rect<S>,
    /// Render pixels per document unit the box was expressed with; `1.0`
    /// for document space.
    pub source_scale: f32,
    glyph_spans: Vec<(f32, f32)>,
}

impl<S: Space> TextRun<S> {
    /// Number of characters in the run.
    pub fn char_count(&self) -> usize {
        self.glyph_spans.len()
    }

    /// Box around the characters `chars` (character indices, not bytes).
    ///
    /// Exact along the baseline for unrotated text; an approximation
    /// otherwise.
    pub fn span_box(&self, chars: Range<usize>) -> Rect<S> {
        let last = self.glyph_spans.len();
        let start = chars.start.min(last);
        let end = chars.end.clamp(start, last);
        if start == end {
            let at = self
                .glyph_spans
                .get(start)
                .map_or(1.0, |(span_start, _)| *span_start);
            return self.bbox.horizontal_slice(at, at);
        }
        let from = self.glyph_spans[start].0;
        let to = self.glyph_spans[end - 1].1;
        self.bbox.horizontal_slice(from, to)
    }
}

impl TextRun<DocumentSpace> {
    /// Projects the run into render space.
    pub fn to_render(&self, transform: &RenderTransform) -> TextRun<RenderSpace> {
        TextRun {
            page_index: self.page_index,
            content: self.content.clone(),
            bbox: transform.to_render(self.bbox),
            source_scale: transform.scale(),
            glyph_spans: self.glyph_spans.clone(),
        }
    }

    /// A run with evenly spaced glyphs, for callers that obtain runs from
    /// another text layer.
    pub fn new(page_index: usize, content: impl Into<String>, bbox: Rect<DocumentSpace>) -> Self {
        let content = content.into();
        let n = content.chars().count().max(1) as f32;
        let glyph_spans = (0..content.chars().count())
            .map(|i| (i as f32 / n, (i + 1) as f32 / n))
            .collect();
        Self {
            page_index,
            content,
            bbox,
            source_scale: 1.0,
            glyph_spans,
        }
    }
}

/// Extracts the runs of one page in document space.
pub fn extract_runs(doc: &PdfDocument, page: usize) -> DecodeResult<Vec<TextRun<DocumentSpace>>> {
    let (origin_x, origin_y) = doc.page_origin(page).ok_or_else(|| DecodeError::Page {
        page,
        reason: "no such page".to_string(),
    })?;

    let data = doc.page_content(page)?;
    let content = Content::decode(&data).map_err(|e| DecodeError::Content {
        page,
        reason: e.to_string(),
    })?;

    let page_fonts = doc.page_fonts(page);
    let fonts = fonts::page_font_table(doc.lopdf(), &page_fonts);

    let runs: Vec<TextRun<DocumentSpace>> = TextInterpreter::new(&fonts)
        .run(&content.operations)
        .into_iter()
        .filter_map(|raw| {
            let bbox = Rect::bounding(
                raw.corners
                    .iter()
                    .map(|(x, y)| (x - origin_x, y - origin_y)),
            )?;
            Some(TextRun {
                page_index: page,
                content: raw.content,
                bbox,
                source_scale: 1.0,
                glyph_spans: raw.glyph_spans,
            })
        })
        .collect();

    log::debug!("Page {}: extracted {} text run(s)", page, runs.len());
    Ok(runs)
}

/// Extracts the runs of one page in render space at `render_width` pixels.
pub fn extract_render_runs(
    doc: &PdfDocument,
    page: usize,
    render_width: f32,
) -> DecodeResult<Vec<TextRun<RenderSpace>>> {
    let size = doc.page_size(page).ok_or_else(|| DecodeError::Page {
        page,
        reason: "no such page".to_string(),
    })?;
    let transform =
        RenderTransform::new(size, render_width).ok_or(DecodeError::RenderWidth(render_width))?;

    Ok(extract_runs(doc, page)?
        .iter()
        .map(|run| run.to_render(&transform))
        .collect())
}

/// Extracts the runs of every page, in page order.
pub fn extract_all_runs(doc: &PdfDocument) -> DecodeResult<Vec<TextRun<DocumentSpace>>> {
    let mut runs = Vec::new();
    for page in 0..doc.page_count() {
        runs.extend(extract_runs(doc, page)?);
    }
    Ok(runs)
}
