//! Search and in-place text replacement for PDF documents.
//!
//! Text in a PDF is a stream of drawing instructions, not an editable
//! string. This library finds where a piece of text is drawn, paints an
//! opaque rectangle over it and draws the substitute text on top. The
//! original glyphs stay in the content stream underneath the cover.
//!
//! # Architecture
//!
//! - [`document`]: decoded documents and the drawing surface the engine writes to
//! - [`extract`]: text runs with bounding boxes, read from page content streams
//! - [`geometry`]: rectangles tagged with their coordinate space and the
//!   conversions between document, render and overlay space
//! - [`search`]: case-insensitive matching with overlap de-duplication
//! - [`replace`]: cover placement, the replacement engine and the service layer
//! - [`error`]: typed errors per stage
//!
//! # Quick Start
//!
//! ```no_run
//! use retext::{MatchSelection, ReplacementService};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ReplacementService::default();
//!
//! for hit in service.search_file(Path::new("invoice.pdf"), "invoice #123")? {
//!     println!("#{} on page {}: {}", hit.id, hit.page_index(), hit.run.content);
//! }
//!
//! service.replace_file(
//!     Path::new("invoice.pdf"),
//!     Path::new("invoice-fixed.pdf"),
//!     "Invoice #123",
//!     MatchSelection::Id(0),
//!     "Invoice #456",
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Cover geometry
//!
//! ```
//! use retext::geometry::Rect;
//! use retext::{Placement, ReplaceConfig};
//!
//! let placement = Placement::plan(Rect::new(50.0, 700.0, 120.0, 12.0), &ReplaceConfig::default());
//! assert_eq!(placement.cover, Rect::new(48.0, 694.0, 124.0, 24.0));
//! ```

pub mod document;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod replace;
pub mod search;

pub use document::{EditableDocument, FontHandle, PdfDocument, Rgb, StandardFont};
pub use error::{
    DecodeError, DecodeResult, EditError, EditResult, FontError, RetextError, RetextResult,
};
pub use extract::{extract_all_runs, extract_render_runs, extract_runs, TextRun};
pub use geometry::{DocumentSpace, OverlaySpace, PageSize, Point, Rect, RenderSpace};
pub use replace::{
    InsertSpec, MatchSelection, Placement, ReplaceConfig, ReplacementEngine, ReplacementOutcome,
    ReplacementService, ReplacementSpec,
};
pub use search::{search, MatchInstance, Searcher};
