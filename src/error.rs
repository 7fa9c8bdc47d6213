//! Error types for the search-and-replace library.
//!
//! Errors are split by the stage that raises them: decoding the input
//! document, embedding the substitute font, and applying an edit. The
//! umbrella [`RetextError`] adds the file-system and lookup failures of the
//! high-level service.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for document decoding and extraction.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type alias for replacement operations.
pub type EditResult<T> = Result<T, EditError>;

/// Result type alias for the high-level service.
pub type RetextResult<T> = Result<T, RetextError>;

/// The input bytes could not be read as a document.
///
/// Fatal for the current request and never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream is not a readable PDF
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// The page tree is empty
    #[error("Document has no pages")]
    NoPages,

    /// A page dictionary is missing or unreadable
    #[error("Page {page} is unreadable: {reason}")]
    Page { page: usize, reason: String },

    /// A page content stream could not be decoded into operators
    #[error("Content stream of page {page} could not be decoded: {reason}")]
    Content { page: usize, reason: String },

    /// Runs were requested in render space at a width that is not positive
    #[error("Cannot project runs at render width {0}")]
    RenderWidth(f32),
}

/// The substitute font could not be embedded or cannot encode the text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FontError {
    /// The requested name is not one of the 14 standard fonts
    #[error("Unknown standard font '{0}'")]
    UnknownFont(String),

    /// The text contains a character the font encoding cannot represent
    #[error("Character {ch:?} cannot be encoded in {font}")]
    Unencodable { font: String, ch: char },

    /// The page resources are not a dictionary the font can be registered in
    #[error("Cannot register font on page {page}: {reason}")]
    Resources { page: usize, reason: String },
}

/// A replacement could not be applied.
///
/// When any of these is returned the caller's document is unchanged.
#[derive(Debug, Error)]
pub enum EditError {
    /// The target page index is not below the document's page count
    #[error("Page index {index} is out of range (document has {page_count} pages)")]
    PageOutOfRange { index: usize, page_count: usize },

    /// The replacement text is empty
    #[error("Replacement text is empty")]
    EmptyReplacement,

    /// The substitute font could not be used for the replacement text
    #[error("Substitute font unavailable: {0}")]
    FontUnavailable(#[source] FontError),

    /// Writing the edited document to bytes failed
    #[error("Failed to serialize document: {0}")]
    Serialization(String),
}

impl From<FontError> for EditError {
    fn from(err: FontError) -> Self {
        Self::FontUnavailable(err)
    }
}

/// Error type of the high-level [`ReplacementService`](crate::ReplacementService).
#[derive(Debug, Error)]
pub enum RetextError {
    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Edit(#[from] EditError),

    /// No match with the requested id exists for the query
    #[error("No match #{id} for query '{query}'")]
    MatchNotFound { query: String, id: usize },
}

impl RetextError {
    /// Wraps an I/O failure with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
