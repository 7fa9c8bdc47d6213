//! Conversions between coordinate spaces.

use super::{DocumentSpace, OverlaySpace, PageSize, Point, Rect, RenderSpace};

/// Maps one page between document space and render space.
///
/// The page is rendered `render_width` pixels wide, so
/// `scale = render_width / page.width` and render space is the
/// document space flipped vertically and scaled uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    page: PageSize,
    render_width: f32,
}

impl RenderTransform {
    /// Returns `None` when the render width or the page extent is not
    /// strictly positive.
    pub fn new(page: PageSize, render_width: f32) -> Option<Self> {
        let valid = render_width > 0.0
            && page.width > 0.0
            && page.height > 0.0
            && render_width.is_finite();
        valid.then_some(Self { page, render_width })
    }

    /// Identity scale: one render pixel per document unit.
    pub fn unscaled(page: PageSize) -> Option<Self> {
        Self::new(page, page.width)
    }

    pub fn page(&self) -> PageSize {
        self.page
    }

    pub fn render_width(&self) -> f32 {
        self.render_width
    }

    pub fn render_height(&self) -> f32 {
        self.page.height * self.scale()
    }

    pub fn scale(&self) -> f32 {
        self.render_width / self.page.width
    }

    /// `yRender = pageHeight*scale - yDoc*scale - height*scale`
    pub fn to_render(&self, rect: Rect<DocumentSpace>) -> Rect<RenderSpace> {
        let scale = self.scale();
        Rect::new(
            rect.x * scale,
            self.page.height * scale - rect.y * scale - rect.height * scale,
            rect.width * scale,
            rect.height * scale,
        )
    }

    /// `yDoc = pageHeight - yRender/scale - height/scale`
    pub fn to_document(&self, rect: Rect<RenderSpace>) -> Rect<DocumentSpace> {
        let scale = self.scale();
        Rect::new(
            rect.x / scale,
            self.page.height - rect.y / scale - rect.height / scale,
            rect.width / scale,
            rect.height / scale,
        )
    }

    pub fn point_to_render(&self, point: Point<DocumentSpace>) -> Point<RenderSpace> {
        let scale = self.scale();
        Point::new(point.x * scale, (self.page.height - point.y) * scale)
    }

    pub fn point_to_document(&self, point: Point<RenderSpace>) -> Point<DocumentSpace> {
        let scale = self.scale();
        Point::new(point.x / scale, self.page.height - point.y / scale)
    }
}

/// The on-screen container a page is displayed in.
///
/// Overlay rectangles (DOM client rects of a selection or of a highlighted
/// hit) are measured against the viewport; subtracting the container's
/// offset makes them render-space rectangles of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayFrame {
    left: f32,
    top: f32,
    displayed_width: Option<f32>,
}

impl OverlayFrame {
    /// A container whose top-left corner is at `(left, top)` in client pixels
    /// and which shows the page at the transform's render width.
    pub fn new(left: f32, top: f32) -> Self {
        Self {
            left,
            top,
            displayed_width: None,
        }
    }

    /// Declares that the container shows the page `width` pixels wide
    /// (CSS zoom), which may differ from the render width.
    pub fn displayed_at(mut self, width: f32) -> Self {
        self.displayed_width = (width > 0.0).then_some(width);
        self
    }

    pub fn to_render(
        &self,
        rect: Rect<OverlaySpace>,
        transform: &RenderTransform,
    ) -> Rect<RenderSpace> {
        let zoom = self
            .displayed_width
            .map_or(1.0, |shown| transform.render_width() / shown);
        Rect::new(
            (rect.x - self.left) * zoom,
            (rect.y - self.top) * zoom,
            rect.width * zoom,
            rect.height * zoom,
        )
    }

    /// Overlay → render → document in one auditable step.
    pub fn to_document(
        &self,
        rect: Rect<OverlaySpace>,
        transform: &RenderTransform,
    ) -> Rect<DocumentSpace> {
        transform.to_document(self.to_render(rect, transform))
    }
}

/// Keeps the first of every group of items whose render boxes intersect on
/// the same page, preserving order.
///
/// This stands in for real layout awareness: glyphs painted twice (fake
/// bold, shadows) produce two runs at nearly the same spot and only one of
/// them should surface as a match.
pub fn retain_non_overlapping<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (usize, Rect<RenderSpace>),
{
    let mut kept: Vec<(usize, Rect<RenderSpace>)> = Vec::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let (page, rect) = key(&item);
        let clashes = kept
            .iter()
            .any(|(kept_page, kept_rect)| *kept_page == page && kept_rect.intersects(&rect));
        if clashes {
            log::debug!("Dropping overlapping candidate on page {}: {:?}", page, rect);
            continue;
        }
        kept.push((page, rect));
        out.push(item);
    }

    out
}
