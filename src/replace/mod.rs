//! Replacement engine and the service layer on top of it.
//!
//! [`ReplacementEngine`] works on any [`EditableDocument`]; the
//! [`ReplacementService`] wires it to [`PdfDocument`] and the
//! [`Searcher`] for byte-buffer and file based callers.

mod engine;
mod placement;

pub use engine::{InsertSpec, ReplacementEngine, ReplacementSpec, DEFAULT_INSERT_FONT_SIZE};
pub use placement::{Placement, ReplaceConfig};

use crate::document::{EditableDocument, PdfDocument};
use crate::error::{DecodeError, EditError, RetextError, RetextResult};
use crate::extract::{extract_all_runs, TextRun};
use crate::geometry::{DocumentSpace, OverlayFrame, OverlaySpace, Rect, RenderTransform};
use crate::search::{MatchInstance, Searcher};
use std::collections::BTreeSet;
use std::path::Path;

/// Which matches of a query to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSelection {
    /// The match with this id
    Id(usize),

    /// Every match
    All,
}

/// Statistics about a replacement request.
#[derive(Debug, Clone, Default)]
pub struct ReplacementOutcome {
    /// The resulting document
    pub bytes: Vec<u8>,

    /// Number of matches selected
    pub matched: usize,

    /// Number of runs covered; several matches in one run share a cover
    pub replaced: usize,

    /// Pages that received a cover
    pub pages_modified: usize,
}

impl ReplacementOutcome {
    /// Returns true if any match was replaced.
    pub fn has_replacements(&self) -> bool {
        self.replaced > 0
    }
}

/// High-level search and replace over PDF bytes and files.
#[derive(Debug, Clone, Default)]
pub struct ReplacementService {
    engine: ReplacementEngine,
    searcher: Searcher,
}

impl ReplacementService {
    pub fn new(engine: ReplacementEngine, searcher: Searcher) -> Self {
        Self { engine, searcher }
    }

    pub fn with_config(config: ReplaceConfig) -> Self {
        Self::new(ReplacementEngine::new(config), Searcher::default())
    }

    pub fn with_searcher(mut self, searcher: Searcher) -> Self {
        self.searcher = searcher;
        self
    }

    pub fn engine(&self) -> &ReplacementEngine {
        &self.engine
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    /// All text runs of the document in document space.
    pub fn runs_bytes(&self, bytes: &[u8]) -> RetextResult<Vec<TextRun<DocumentSpace>>> {
        let doc = PdfDocument::from_bytes(bytes)?;
        Ok(extract_all_runs(&doc)?)
    }

    pub fn search_bytes(&self, bytes: &[u8], query: &str) -> RetextResult<Vec<MatchInstance>> {
        let doc = PdfDocument::from_bytes(bytes)?;
        Ok(self.searcher.search(&doc, query)?)
    }

    /// Searches for `query` and replaces the selected matches with `new_text`.
    ///
    /// With [`MatchSelection::All`] and no match the input is returned
    /// unchanged.
    pub fn replace_bytes(
        &self,
        bytes: &[u8],
        query: &str,
        selection: MatchSelection,
        new_text: &str,
    ) -> RetextResult<ReplacementOutcome> {
        let mut doc = PdfDocument::from_bytes(bytes)?;
        let matches = self.searcher.search(&doc, query)?;

        let targets: Vec<MatchInstance> = match selection {
            MatchSelection::Id(id) => {
                let found = matches
                    .into_iter()
                    .find(|m| m.id == id)
                    .ok_or_else(|| RetextError::MatchNotFound {
                        query: query.to_string(),
                        id,
                    })?;
                vec![found]
            }
            MatchSelection::All => matches,
        };

        if targets.is_empty() {
            log::info!("No match for '{}', document unchanged", query);
            return Ok(ReplacementOutcome {
                bytes: bytes.to_vec(),
                ..ReplacementOutcome::default()
            });
        }

        let matched = targets.len();
        let targets = distinct_runs(targets);
        let pages: BTreeSet<usize> = targets.iter().map(MatchInstance::page_index).collect();
        let replaced = targets.len();
        if replaced < matched {
            log::debug!("{} match(es) of '{}' fall in {} run(s)", matched, query, replaced);
        }
        let specs = targets
            .into_iter()
            .map(|target| ReplacementSpec::new(target, new_text))
            .collect();
        let bytes = self.engine.apply_all(&mut doc, specs)?;

        Ok(ReplacementOutcome {
            bytes,
            matched,
            replaced,
            pages_modified: pages.len(),
        })
    }

    /// Replaces whatever lies under a rectangle drawn over the rendered page.
    ///
    /// The page is assumed to be rendered at the searcher's render width.
    pub fn replace_selection_bytes(
        &self,
        bytes: &[u8],
        page: usize,
        selection: Rect<OverlaySpace>,
        frame: OverlayFrame,
        new_text: &str,
    ) -> RetextResult<Vec<u8>> {
        let mut doc = PdfDocument::from_bytes(bytes)?;
        self.engine.validate(&doc, page, new_text)?;
        let size = doc.page_size(page).ok_or(EditError::PageOutOfRange {
            index: page,
            page_count: doc.page_count(),
        })?;
        let rotation = doc.page_rotation(page);
        if rotation != 0 {
            log::warn!(
                "Page {} is rotated by {} degrees; the selection is mapped as if unrotated",
                page,
                rotation
            );
        }
        let transform = RenderTransform::new(size, self.searcher.render_width())
            .ok_or_else(|| DecodeError::RenderWidth(self.searcher.render_width()))?;

        let target = frame.to_document(selection, &transform);
        log::debug!("Selection {} on page {} maps to {}", selection, page, target);
        Ok(self.engine.apply_at(&mut doc, page, target, new_text)?)
    }

    pub fn insert_bytes(&self, bytes: &[u8], spec: InsertSpec) -> RetextResult<Vec<u8>> {
        let mut doc = PdfDocument::from_bytes(bytes)?;
        Ok(self.engine.insert(&mut doc, spec)?)
    }

    /// Plain text of the whole document, as a reader would copy it.
    pub fn plain_text_bytes(&self, bytes: &[u8]) -> RetextResult<String> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DecodeError::Malformed(e.to_string()).into())
    }

    pub fn runs_file(&self, input: &Path) -> RetextResult<Vec<TextRun<DocumentSpace>>> {
        self.runs_bytes(&read_file(input)?)
    }

    pub fn search_file(&self, input: &Path, query: &str) -> RetextResult<Vec<MatchInstance>> {
        self.search_bytes(&read_file(input)?, query)
    }

    pub fn replace_file(
        &self,
        input: &Path,
        output: &Path,
        query: &str,
        selection: MatchSelection,
        new_text: &str,
    ) -> RetextResult<ReplacementOutcome> {
        let outcome = self.replace_bytes(&read_file(input)?, query, selection, new_text)?;
        write_file(output, &outcome.bytes)?;
        Ok(outcome)
    }

    pub fn replace_selection_file(
        &self,
        input: &Path,
        output: &Path,
        page: usize,
        selection: Rect<OverlaySpace>,
        frame: OverlayFrame,
        new_text: &str,
    ) -> RetextResult<()> {
        let bytes =
            self.replace_selection_bytes(&read_file(input)?, page, selection, frame, new_text)?;
        write_file(output, &bytes)
    }

    pub fn insert_file(&self, input: &Path, output: &Path, spec: InsertSpec) -> RetextResult<()> {
        let bytes = self.insert_bytes(&read_file(input)?, spec)?;
        write_file(output, &bytes)
    }

    pub fn plain_text_file(&self, input: &Path) -> RetextResult<String> {
        self.plain_text_bytes(&read_file(input)?)
    }
}

/// Keeps the first match of every run, since a replacement covers the whole run.
fn distinct_runs(targets: Vec<MatchInstance>) -> Vec<MatchInstance> {
    let mut kept: Vec<MatchInstance> = Vec::with_capacity(targets.len());
    for target in targets {
        let seen = kept.iter().any(|other| {
            other.page_index() == target.page_index() && other.run.bbox == target.run.bbox
        });
        if !seen {
            kept.push(target);
        }
    }
    kept
}

fn read_file(path: &Path) -> RetextResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| RetextError::io(path, e))
}

fn write_file(path: &Path, bytes: &[u8]) -> RetextResult<()> {
    std::fs::write(path, bytes).map_err(|e| RetextError::io(path, e))
}
