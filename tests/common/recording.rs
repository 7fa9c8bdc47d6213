//! An in-memory [`EditableDocument`] that records drawing calls.

use retext::{
    DocumentSpace, EditError, EditResult, EditableDocument, FontError, FontHandle, PageSize,
    Point, Rect, Rgb, StandardFont,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Rect {
        page: usize,
        rect: Rect<DocumentSpace>,
        fill: Rgb,
    },
    Text {
        page: usize,
        text: String,
        font: StandardFont,
        size: f32,
        origin: Point<DocumentSpace>,
        color: Rgb,
    },
}

/// Pages of a fixed size; drawing is recorded and committed on
/// `serialize`, mirroring how a real document buffers edits.
#[derive(Debug, Clone)]
pub struct RecordingDocument {
    pub page_size: PageSize,
    pub page_count: usize,
    pub pending: Vec<DrawCall>,
    pub committed: Vec<DrawCall>,
    pub serializations: usize,
    pub refuse_fonts: bool,
}

impl RecordingDocument {
    pub fn letter(page_count: usize) -> Self {
        Self {
            page_size: PageSize::new(612.0, 792.0),
            page_count,
            pending: Vec::new(),
            committed: Vec::new(),
            serializations: 0,
            refuse_fonts: false,
        }
    }

    pub fn refusing_fonts(mut self) -> Self {
        self.refuse_fonts = true;
        self
    }

    pub fn rects(&self) -> Vec<Rect<DocumentSpace>> {
        self.committed
            .iter()
            .filter_map(|call| match call {
                DrawCall::Rect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<(String, f32, Point<DocumentSpace>)> {
        self.committed
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text {
                    text, size, origin, ..
                } => Some((text.clone(), *size, *origin)),
                _ => None,
            })
            .collect()
    }
}

impl EditableDocument for RecordingDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, page: usize) -> Option<PageSize> {
        (page < self.page_count).then_some(self.page_size)
    }

    fn embed_font(&mut self, page: usize, font: StandardFont) -> Result<FontHandle, FontError> {
        if self.refuse_fonts {
            return Err(FontError::Resources {
                page,
                reason: "read-only resources".to_string(),
            });
        }
        Ok(FontHandle {
            resource_name: format!("RtF{}", page + 1),
            font,
        })
    }

    fn draw_rect(&mut self, page: usize, rect: Rect<DocumentSpace>, fill: Rgb) -> EditResult<()> {
        self.check(page)?;
        self.pending.push(DrawCall::Rect { page, rect, fill });
        Ok(())
    }

    fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        font: &FontHandle,
        size: f32,
        origin: Point<DocumentSpace>,
        color: Rgb,
    ) -> EditResult<()> {
        self.check(page)?;
        self.pending.push(DrawCall::Text {
            page,
            text: text.to_string(),
            font: font.font,
            size,
            origin,
            color,
        });
        Ok(())
    }

    fn serialize(&mut self) -> EditResult<Vec<u8>> {
        self.committed.append(&mut self.pending);
        self.serializations += 1;
        Ok(format!("{:?}", self.committed).into_bytes())
    }
}

impl RecordingDocument {
    fn check(&self, page: usize) -> EditResult<()> {
        if page < self.page_count {
            Ok(())
        } else {
            Err(EditError::PageOutOfRange {
                index: page,
                page_count: self.page_count,
            })
        }
    }
}
