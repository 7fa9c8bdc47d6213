//! The cover-and-draw replacement engine.

use super::placement::{Placement, ReplaceConfig};
use crate::document::EditableDocument;
use crate::error::{EditError, EditResult};
use crate::geometry::{DocumentSpace, Point, Rect};
use crate::search::MatchInstance;

/// Font size of inserted free text when none is given.
pub const DEFAULT_INSERT_FONT_SIZE: f32 = 12.0;

/// Replace the run of `target` with `new_text`. Consumed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementSpec {
    pub target: MatchInstance,
    pub new_text: String,
}

impl ReplacementSpec {
    pub fn new(target: MatchInstance, new_text: impl Into<String>) -> Self {
        Self {
            target,
            new_text: new_text.into(),
        }
    }
}

/// Draw free text on a page without covering anything.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSpec {
    pub page: usize,
    pub origin: Point<DocumentSpace>,
    pub font_size: f32,
    pub text: String,
}

impl InsertSpec {
    pub fn new(page: usize, origin: Point<DocumentSpace>, text: impl Into<String>) -> Self {
        Self {
            page,
            origin,
            font_size: DEFAULT_INSERT_FONT_SIZE,
            text: text.into(),
        }
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }
}

/// Paints over a run and draws substitute text in its place.
///
/// Every public operation works on a clone of the document and only
/// swaps it into the caller's value once serialization succeeded, so a
/// failed call leaves the document exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct ReplacementEngine {
    config: ReplaceConfig,
}

impl ReplacementEngine {
    pub fn new(config: ReplaceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReplaceConfig {
        &self.config
    }

    /// Applies one replacement and returns the edited document's bytes.
    pub fn apply<D: EditableDocument>(
        &self,
        doc: &mut D,
        spec: ReplacementSpec,
    ) -> EditResult<Vec<u8>> {
        let ReplacementSpec { target, new_text } = spec;
        self.apply_at(doc, target.page_index(), target.run.bbox, &new_text)
    }

    /// Replaces whatever is drawn inside `bbox` on `page`.
    pub fn apply_at<D: EditableDocument>(
        &self,
        doc: &mut D,
        page: usize,
        bbox: Rect<DocumentSpace>,
        new_text: &str,
    ) -> EditResult<Vec<u8>> {
        self.commit(doc, |staged| {
            self.stage(staged, page, bbox, new_text).map(|_| ())
        })
    }

    /// Applies several replacements; either all of them land or none.
    pub fn apply_all<D: EditableDocument>(
        &self,
        doc: &mut D,
        specs: Vec<ReplacementSpec>,
    ) -> EditResult<Vec<u8>> {
        self.commit(doc, |staged| {
            for spec in &specs {
                self.stage(
                    staged,
                    spec.target.page_index(),
                    spec.target.run.bbox,
                    &spec.new_text,
                )?;
            }
            Ok(())
        })
    }

    /// Draws free text at a position.
    pub fn insert<D: EditableDocument>(&self, doc: &mut D, spec: InsertSpec) -> EditResult<Vec<u8>> {
        self.commit(doc, |staged| {
            let InsertSpec {
                page,
                origin,
                font_size,
                text,
            } = spec;
            validate(staged, page, &text)?;
            let font = staged.embed_font(page, self.config.font)?;
            font.encode(&text)?;
            let size = if font_size > 0.0 {
                font_size.max(self.config.min_font_size)
            } else {
                DEFAULT_INSERT_FONT_SIZE
            };
            staged.draw_text(page, &text, &font, size, origin, self.config.text_color)
        })
    }

    /// Checks a request without touching the document: empty text first,
    /// then the page index.
    pub fn validate<D: EditableDocument>(&self, doc: &D, page: usize, text: &str) -> EditResult<()> {
        validate(doc, page, text)
    }

    /// Queues the cover and the text of one replacement on `doc`.
    fn stage<D: EditableDocument>(
        &self,
        doc: &mut D,
        page: usize,
        bbox: Rect<DocumentSpace>,
        new_text: &str,
    ) -> EditResult<Placement> {
        validate(doc, page, new_text)?;

        let font = doc.embed_font(page, self.config.font)?;
        font.encode(new_text)?;

        let placement = Placement::plan(bbox, &self.config);
        log::debug!(
            "Page {}: cover {:?}, text at ({}, {}) size {}",
            page,
            placement.cover,
            placement.text_origin.x,
            placement.text_origin.y,
            placement.font_size
        );

        doc.draw_rect(page, placement.cover, self.config.background)?;
        doc.draw_text(
            page,
            new_text,
            &font,
            placement.font_size,
            placement.text_origin,
            self.config.text_color,
        )?;
        Ok(placement)
    }

    fn commit<D, F>(&self, doc: &mut D, edit: F) -> EditResult<Vec<u8>>
    where
        D: EditableDocument,
        F: FnOnce(&mut D) -> EditResult<()>,
    {
        let mut staged = doc.clone();
        edit(&mut staged)?;
        let bytes = staged.serialize()?;
        *doc = staged;
        log::info!("Committed edit ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

fn validate<D: EditableDocument>(doc: &D, page: usize, text: &str) -> EditResult<()> {
    if text.is_empty() {
        return Err(EditError::EmptyReplacement);
    }
    let page_count = doc.page_count();
    if page >= page_count {
        return Err(EditError::PageOutOfRange {
            index: page,
            page_count,
        });
    }
    Ok(())
}
