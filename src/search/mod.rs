//! Search over extracted runs.
//!
//! Matches are recomputed from scratch for every query; a
//! [`MatchInstance`] is never updated in place.

mod matcher;

pub use matcher::QueryMatcher;

use crate::document::{EditableDocument, PdfDocument};
use crate::error::DecodeResult;
use crate::extract::{extract_all_runs, TextRun};
use crate::geometry::{
    retain_non_overlapping, DocumentSpace, PageSize, Rect, RenderSpace, RenderTransform,
};
use std::ops::Range;

/// Width in pixels pages are projected at for overlap checks.
pub const DEFAULT_RENDER_WIDTH: f32 = 800.0;

/// One occurrence of the query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchInstance {
    pub id: usize,
    /// The whole run the occurrence lives in; replacement covers all of it.
    pub run: TextRun<DocumentSpace>,
    /// The text exactly as it appears in the run.
    pub matched_substring: String,
    /// Character range of the occurrence within `run.content`.
    pub char_range: Range<usize>,
    /// Box of just the matched glyphs, for highlighting.
    pub highlight: Rect<DocumentSpace>,
}

impl MatchInstance {
    pub fn page_index(&self) -> usize {
        self.run.page_index
    }

    pub fn render_highlight(&self, transform: &RenderTransform) -> Rect<RenderSpace> {
        transform.to_render(self.highlight)
    }
}

/// Finds query occurrences and drops duplicates produced by overlapping
/// runs.
#[derive(Debug, Clone)]
pub struct Searcher {
    render_width: f32,
}

impl Searcher {
    pub fn new() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
        }
    }

    /// Sets the render width used to project matches for the overlap check.
    pub fn with_render_width(mut self, render_width: f32) -> Self {
        if render_width > 0.0 {
            self.render_width = render_width;
        }
        self
    }

    pub fn render_width(&self) -> f32 {
        self.render_width
    }

    /// Searches every page of `doc`.
    pub fn search(&self, doc: &PdfDocument, query: &str) -> DecodeResult<Vec<MatchInstance>> {
        let runs = extract_all_runs(doc)?;
        Ok(self.search_runs(&runs, |page| doc.page_size(page), query))
    }

    /// Searches already extracted runs.
    pub fn search_runs<F>(
        &self,
        runs: &[TextRun<DocumentSpace>],
        page_size: F,
        query: &str,
    ) -> Vec<MatchInstance>
    where
        F: Fn(usize) -> Option<PageSize>,
    {
        let Some(matcher) = QueryMatcher::new(query) else {
            return Vec::new();
        };

        let candidates: Vec<(MatchInstance, Rect<RenderSpace>)> = runs
            .iter()
            .flat_map(|run| {
                matcher.find_all(&run.content).into_iter().map(move |bytes| {
                    let chars = char_range(&run.content, &bytes);
                    let highlight = run.span_box(chars.clone());
                    MatchInstance {
                        id: 0,
                        run: run.clone(),
                        matched_substring: run.content[bytes].to_string(),
                        char_range: chars,
                        highlight,
                    }
                })
            })
            .map(|candidate| {
                let projected = page_size(candidate.page_index())
                    .and_then(|size| RenderTransform::new(size, self.render_width))
                    .map_or_else(
                        || Rect::new(0.0, 0.0, 0.0, 0.0),
                        |transform| candidate.render_highlight(&transform),
                    );
                (candidate, projected)
            })
            .collect();

        let provisional = candidates.len();
        let matches: Vec<MatchInstance> =
            retain_non_overlapping(candidates, |(candidate, rect)| (candidate.page_index(), *rect))
                .into_iter()
                .enumerate()
                .map(|(id, (mut candidate, _))| {
                    candidate.id = id;
                    candidate
                })
                .collect();

        log::debug!(
            "Query '{}': {} match(es), {} dropped as overlapping",
            matcher.query(),
            matches.len(),
            provisional - matches.len()
        );
        matches
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Searches `doc` for `query` with default settings.
pub fn search(doc: &PdfDocument, query: &str) -> DecodeResult<Vec<MatchInstance>> {
    Searcher::default().search(doc, query)
}

fn char_range(text: &str, bytes: &Range<usize>) -> Range<usize> {
    let start = text[..bytes.start].chars().count();
    let len = text[bytes.clone()].chars().count();
    start..start + len
}
