//! Document model boundary.
//!
//! [`EditableDocument`] is the narrow surface the replacement engine needs
//! from a document library: page geometry, a substitute font, two drawing
//! primitives and serialization. [`PdfDocument`] implements it on top of
//! `lopdf`.

pub mod font;
pub mod metrics;

pub use font::{FontHandle, StandardFont};

use crate::error::{DecodeError, DecodeResult, EditError, EditResult, FontError};
use crate::geometry::{DocumentSpace, PageSize, Point, Rect};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, HashMap};

/// Page tree inheritance depth after which lookups give up.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Page size assumed when a page declares no usable `/MediaBox` (US Letter).
const FALLBACK_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    fn operands(&self) -> Vec<Object> {
        vec![
            Object::Real(self.r),
            Object::Real(self.g),
            Object::Real(self.b),
        ]
    }
}

/// What the replacement engine needs from a document.
///
/// Drawing calls may be buffered; nothing has to reach the underlying
/// representation before [`serialize`](EditableDocument::serialize).
pub trait EditableDocument: Clone {
    fn page_count(&self) -> usize;

    /// Size of page `page` in document units, `None` when out of range.
    fn page_size(&self, page: usize) -> Option<PageSize>;

    /// Makes `font` usable for [`draw_text`](EditableDocument::draw_text) on `page`.
    fn embed_font(&mut self, page: usize, font: StandardFont) -> Result<FontHandle, FontError>;

    /// Fills `rect` with an opaque color.
    fn draw_rect(&mut self, page: usize, rect: Rect<DocumentSpace>, fill: Rgb) -> EditResult<()>;

    /// Draws `text` with its baseline starting at `origin`.
    fn draw_text(
        &mut self,
        page: usize,
        text: &str,
        font: &FontHandle,
        size: f32,
        origin: Point<DocumentSpace>,
        color: Rgb,
    ) -> EditResult<()>;

    /// Commits buffered drawing and writes the document out.
    fn serialize(&mut self) -> EditResult<Vec<u8>>;
}

/// Media box of a page: lower-left corner in user space plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageBox {
    origin_x: f32,
    origin_y: f32,
    size: PageSize,
}

/// Drawing buffered for one page until the next serialization.
#[derive(Debug, Clone, Default)]
struct PendingPage {
    operations: Vec<Operation>,
    fonts: Vec<FontHandle>,
}

/// A PDF document decoded with `lopdf`.
///
/// Document space is the page's user space shifted so the media box's
/// lower-left corner is the origin.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    inner: lopdf::Document,
    pages: Vec<ObjectId>,
    boxes: Vec<PageBox>,
    pending: BTreeMap<usize, PendingPage>,
    font_objects: HashMap<StandardFont, ObjectId>,
}

impl PdfDocument {
    /// Decodes a document from bytes.
    pub fn from_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        let inner =
            lopdf::Document::load_mem(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Self::from_lopdf(inner)
    }

    /// Wraps an already decoded `lopdf` document.
    pub fn from_lopdf(inner: lopdf::Document) -> DecodeResult<Self> {
        let pages: Vec<ObjectId> = inner.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(DecodeError::NoPages);
        }

        let boxes = pages
            .iter()
            .enumerate()
            .map(|(index, &page_id)| media_box(&inner, index, page_id))
            .collect::<DecodeResult<Vec<_>>>()?;

        log::debug!("Decoded document with {} page(s)", pages.len());

        Ok(Self {
            inner,
            pages,
            boxes,
            pending: BTreeMap::new(),
            font_objects: HashMap::new(),
        })
    }

    /// The underlying `lopdf` document.
    pub fn lopdf(&self) -> &lopdf::Document {
        &self.inner
    }

    pub(crate) fn page_id(&self, page: usize) -> Option<ObjectId> {
        self.pages.get(page).copied()
    }

    /// Lower-left corner of the media box in user space.
    pub(crate) fn page_origin(&self, page: usize) -> Option<(f32, f32)> {
        self.boxes.get(page).map(|b| (b.origin_x, b.origin_y))
    }

    /// The page's (possibly inherited) `/Rotate`, normalized to 0, 90, 180 or 270.
    pub fn page_rotation(&self, page: usize) -> i64 {
        self.page_id(page)
            .and_then(|id| inherited(&self.inner, id, b"Rotate"))
            .and_then(|rotate| rotate.as_i64().ok())
            .map_or(0, |degrees| degrees.rem_euclid(360) / 90 * 90)
    }

    /// Concatenated, decompressed content streams of a page.
    pub(crate) fn page_content(&self, page: usize) -> DecodeResult<Vec<u8>> {
        let page_id = self.page_id(page).ok_or_else(|| DecodeError::Page {
            page,
            reason: "no such page".to_string(),
        })?;
        match self.inner.get_page_content(page_id) {
            Ok(content) => Ok(content),
            // A page without /Contents is blank, not broken.
            Err(_) if page_contents(&self.inner, page_id).is_empty() => Ok(Vec::new()),
            Err(e) => Err(DecodeError::Content {
                page,
                reason: e.to_string(),
            }),
        }
    }

    /// The font dictionaries of a page's (possibly inherited) resources,
    /// keyed by resource name.
    pub(crate) fn page_fonts(&self, page: usize) -> BTreeMap<Vec<u8>, &Dictionary> {
        let Some(page_id) = self.page_id(page) else {
            return BTreeMap::new();
        };
        let Some(fonts) = inherited(&self.inner, page_id, b"Resources")
            .and_then(|res| res.as_dict().ok())
            .and_then(|res| res.get(b"Font").ok())
            .map(|fonts| resolve(&self.inner, fonts))
            .and_then(|fonts| fonts.as_dict().ok())
        else {
            return BTreeMap::new();
        };

        fonts
            .iter()
            .filter_map(|(name, font)| {
                resolve(&self.inner, font)
                    .as_dict()
                    .ok()
                    .map(|dict| (name.clone(), dict))
            })
            .collect()
    }

    fn check_page(&self, page: usize) -> EditResult<()> {
        if page < self.pages.len() {
            Ok(())
        } else {
            Err(EditError::PageOutOfRange {
                index: page,
                page_count: self.pages.len(),
            })
        }
    }

    fn font_object(&mut self, font: StandardFont) -> ObjectId {
        if let Some(id) = self.font_objects.get(&font) {
            return *id;
        }
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(font.base_name().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]);
        let id = self.inner.add_object(Object::Dictionary(dict));
        self.font_objects.insert(font, id);
        id
    }

    /// Writes one page's buffered fonts and operators into the object graph.
    fn commit_page(&mut self, page: usize, pending: PendingPage) -> EditResult<()> {
        let page_id = self.page_id(page).ok_or(EditError::PageOutOfRange {
            index: page,
            page_count: self.pages.len(),
        })?;

        if !pending.fonts.is_empty() {
            let font_refs: Vec<(String, ObjectId)> = pending
                .fonts
                .iter()
                .map(|handle| (handle.resource_name.clone(), self.font_object(handle.font)))
                .collect();
            self.register_fonts(page_id, &font_refs);
        }

        let mut operations = vec![Operation::new("Q", vec![])];
        operations.extend(pending.operations);
        // Readers concatenate content streams verbatim; keep the first
        // operator off the previous stream's last token.
        let mut body = b"\n".to_vec();
        body.extend(
            Content { operations }
                .encode()
                .map_err(|e| EditError::Serialization(e.to_string()))?,
        );

        let existing = page_contents(&self.inner, page_id);
        let prefix = self
            .inner
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let suffix = self.inner.add_object(Stream::new(Dictionary::new(), body));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(prefix));
        contents.extend(existing);
        contents.push(Object::Reference(suffix));

        let page_dict = self
            .inner
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| EditError::Serialization(e.to_string()))?;
        page_dict.set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Gives the page its own copy of the effective resources with the
    /// substitute fonts added; sibling pages sharing the original
    /// dictionary are left alone.
    fn register_fonts(&mut self, page_id: ObjectId, fonts: &[(String, ObjectId)]) {
        let mut resources = inherited(&self.inner, page_id, b"Resources")
            .and_then(|res| res.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);
        let mut font_dict = resources
            .get(b"Font")
            .ok()
            .map(|fonts| resolve(&self.inner, fonts))
            .and_then(|fonts| fonts.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);

        for (name, id) in fonts {
            font_dict.set(name.as_bytes().to_vec(), Object::Reference(*id));
        }
        resources.set("Font", Object::Dictionary(font_dict));

        if let Ok(page_dict) = self
            .inner
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
        {
            page_dict.set("Resources", Object::Dictionary(resources));
        }
    }
}

impl EditableDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> Option<PageSize> {
        self.boxes.get(page).map(|b| b.size)
    }

    fn embed_font(&mut self, page: usize, font: StandardFont) -> Result<FontHandle, FontError> {
        if let Some(handle) = self
            .pending
            .get(&page)
            .and_then(|p| p.fonts.iter().find(|h| h.font == font))
        {
            return Ok(handle.clone());
        }

        let page_id = self.page_id(page).ok_or_else(|| FontError::Resources {
            page,
            reason: "no such page".to_string(),
        })?;

        if let Some(resources) = inherited(&self.inner, page_id, b"Resources") {
            if resources.as_dict().is_err() {
                return Err(FontError::Resources {
                    page,
                    reason: "/Resources is not a dictionary".to_string(),
                });
            }
        }

        let pending = self.pending.entry(page).or_default();
        let taken: Vec<Vec<u8>> = {
            let existing = inherited(&self.inner, page_id, b"Resources")
                .and_then(|res| res.as_dict().ok())
                .and_then(|res| res.get(b"Font").ok())
                .map(|fonts| resolve(&self.inner, fonts))
                .and_then(|fonts| fonts.as_dict().ok());
            existing
                .into_iter()
                .flat_map(|fonts| fonts.iter().map(|(name, _)| name.clone()))
                .chain(
                    pending
                        .fonts
                        .iter()
                        .map(|h| h.resource_name.as_bytes().to_vec()),
                )
                .collect()
        };

        let resource_name = (1..)
            .map(|n| format!("RtF{}", n))
            .find(|name| !taken.iter().any(|t| t == name.as_bytes()))
            .unwrap_or_else(|| "RtF".to_string());

        let handle = FontHandle {
            resource_name,
            font,
        };
        pending.fonts.push(handle.clone());
        log::debug!(
            "Registered {} as /{} on page {}",
            font,
            handle.resource_name,
            page
        );
        Ok(handle)
    }

    fn draw_rect(&mut self, page: usize, rect: Rect<DocumentSpace>, fill: Rgb) -> EditResult<()> {
        self.check_page(page)?;
        let (ox, oy) = self.page_origin(page).unwrap_or((0.0, 0.0));
        let operations = &mut self.pending.entry(page).or_default().operations;
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new("rg", fill.operands()));
        operations.push(Operation::new(
            "re",
            vec![
                Object::Real(rect.x + ox),
                Object::Real(rect.y + oy),
                Object::Real(rect.width),
                Object::Real(rect.height),
            ],
        ));
        operations.push(Operation::new("f", vec![]));
        operations.push(Operation::new("Q", vec![]));
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
        self.check_page(page)?;
        let encoded = font.encode(text)?;
        let (ox, oy) = self.page_origin(page).unwrap_or((0.0, 0.0));
        let operations = &mut self.pending.entry(page).or_default().operations;
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new("rg", color.operands()));
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font.resource_name.as_bytes().to_vec()),
                Object::Real(size),
            ],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(origin.x + ox), Object::Real(origin.y + oy)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encoded, StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
        operations.push(Operation::new("Q", vec![]));
        Ok(())
    }

    fn serialize(&mut self) -> EditResult<Vec<u8>> {
        let pending = std::mem::take(&mut self.pending);
        for (page, page_ops) in pending {
            if page_ops.operations.is_empty() && page_ops.fonts.is_empty() {
                continue;
            }
            self.commit_page(page, page_ops)?;
        }

        let mut output = Vec::new();
        self.inner
            .save_to(&mut output)
            .map_err(|e| EditError::Serialization(e.to_string()))?;
        Ok(output)
    }
}

/// Follows an indirect reference, returning the object itself otherwise.
pub(crate) fn resolve<'a>(doc: &'a lopdf::Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Looks `key` up on a page, walking `/Parent` links for inheritable entries.
pub(crate) fn inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Reads an integer or real as `f32`.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// The page's `/Contents` entries as references, flattened one level.
fn page_contents(doc: &lopdf::Document, page_id: ObjectId) -> Vec<Object> {
    let Some(contents) = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Contents").ok())
    else {
        return Vec::new();
    };
    match contents {
        Object::Array(items) => items.clone(),
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        _ => Vec::new(),
    }
}

fn media_box(doc: &lopdf::Document, index: usize, page_id: ObjectId) -> DecodeResult<PageBox> {
    let corners = match inherited(doc, page_id, b"MediaBox") {
        None => {
            log::debug!("Page {} has no /MediaBox, assuming US Letter", index);
            FALLBACK_MEDIA_BOX
        }
        Some(object) => {
            let values: Vec<f32> = object
                .as_array()
                .map_err(|_| DecodeError::Page {
                    page: index,
                    reason: "/MediaBox is not an array".to_string(),
                })?
                .iter()
                .map(|v| number(resolve(doc, v)))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| DecodeError::Page {
                    page: index,
                    reason: "/MediaBox has non-numeric entries".to_string(),
                })?;
            match values.as_slice() {
                [a, b, c, d] => [*a, *b, *c, *d],
                _ => {
                    return Err(DecodeError::Page {
                        page: index,
                        reason: format!("/MediaBox has {} entries", values.len()),
                    })
                }
            }
        }
    };

    let [x0, y0, x1, y1] = corners;
    Ok(PageBox {
        origin_x: x0.min(x1),
        origin_y: y0.min(y1),
        size: PageSize::new((x1 - x0).abs(), (y1 - y0).abs()),
    })
}
