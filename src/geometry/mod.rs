//! Space-tagged geometry.
//!
//! Three coordinate spaces meet in this crate:
//!
//! - [`DocumentSpace`]: the page's native system. Origin at the page's
//!   bottom-left corner, y grows upward, unscaled document units.
//! - [`RenderSpace`]: pixels of a page rendered at a chosen width. Origin
//!   top-left, y grows downward.
//! - [`OverlaySpace`]: client pixels measured on a displayed page container
//!   (user selections, highlighted search hits). Same orientation as render
//!   space but offset by the container position.
//!
//! Every [`Rect`] and [`Point`] carries its space as a type parameter. The
//! only way to move a value between spaces is through [`RenderTransform`] or
//! [`OverlayFrame`], so a render-space box can never reach the replacement
//! engine without an explicit conversion.

mod transform;

pub use transform::{retain_non_overlapping, OverlayFrame, RenderTransform};

use std::fmt;
use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// Marker trait implemented by the coordinate-space tags.
pub trait Space: sealed::Sealed + Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Short name used in debug output.
    const NAME: &'static str;
}

/// Page-native coordinates, origin bottom-left, y up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentSpace;

/// Render pixels, origin top-left, y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderSpace;

/// Client pixels on a displayed page container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlaySpace;

impl sealed::Sealed for DocumentSpace {}
impl sealed::Sealed for RenderSpace {}
impl sealed::Sealed for OverlaySpace {}

impl Space for DocumentSpace {
    const NAME: &'static str = "doc";
}

impl Space for RenderSpace {
    const NAME: &'static str = "render";
}

impl Space for OverlaySpace {
    const NAME: &'static str = "overlay";
}

/// Width and height of a page in document units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A point in space `S`.
#[derive(Clone, Copy, PartialEq)]
pub struct Point<S: Space> {
    pub x: f32,
    pub y: f32,
    space: PhantomData<S>,
}

impl<S: Space> Point<S> {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            space: PhantomData,
        }
    }
}

impl<S: Space> fmt::Debug for Point<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point<{}>({}, {})", S::NAME, self.x, self.y)
    }
}

/// An axis-aligned rectangle in space `S` with non-negative extent.
///
/// `(x, y)` is the corner with the smallest coordinates in the space's own
/// orientation: bottom-left in document space, top-left in render and
/// overlay space. In both cases the rectangle covers `[x, x + width]` by
/// `[y, y + height]`.
#[derive(Clone, Copy, PartialEq)]
pub struct Rect<S: Space> {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    space: PhantomData<S>,
}

impl<S: Space> Rect<S> {
    /// Creates a rectangle, flipping negative extents so width and height
    /// are never negative.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let (x, width) = if width < 0.0 {
            (x + width, -width)
        } else {
            (x, width)
        };
        let (y, height) = if height < 0.0 {
            (y + height, -height)
        } else {
            (y, height)
        };
        Self {
            x,
            y,
            width,
            height,
            space: PhantomData,
        }
    }

    /// Smallest rectangle containing all `points`, or `None` when empty.
    pub fn bounding(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Self> {
        let mut points = points.into_iter();
        let (x0, y0) = points.next()?;
        let (min_x, min_y, max_x, max_y) =
            points.fold((x0, y0, x0, y0), |(ax, ay, bx, by), (x, y)| {
                (ax.min(x), ay.min(y), bx.max(x), by.max(y))
            });
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn far_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point<S> {
        Point::new(self.x, self.y)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when the two rectangles share a region of positive area.
    ///
    /// Rectangles that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &Rect<S>) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.far_y()
            && other.y < self.far_y()
    }

    /// Grows the rectangle by `dx` on the left and right and `dy` on both
    /// vertical sides.
    pub fn inflate(&self, dx: f32, dy: f32) -> Self {
        Self::new(
            self.x - dx,
            self.y - dy,
            self.width + 2.0 * dx,
            self.height + 2.0 * dy,
        )
    }

    /// Horizontal slice covering the fractions `[start, end)` of the width.
    pub fn horizontal_slice(&self, start: f32, end: f32) -> Self {
        let start = start.clamp(0.0, 1.0);
        let end = end.clamp(start, 1.0);
        Self::new(
            self.x + self.width * start,
            self.y,
            self.width * (end - start),
            self.height,
        )
    }
}

impl<S: Space> fmt::Debug for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect<{}>{{x: {}, y: {}, w: {}, h: {}}}",
            S::NAME,
            self.x,
            self.y,
            self.width,
            self.height
        )
    }
}

impl<S: Space> fmt::Display for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}) {:.1}x{:.1}",
            self.x, self.y, self.width, self.height
        )
    }
}
