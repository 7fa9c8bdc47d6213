//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - PDF fixtures built directly as `lopdf` object graphs or with `printpdf`
//! - A recording [`retext::EditableDocument`] for engine tests
//! - Inspection helpers and assertions over written documents

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod recording;

pub use assertions::*;
pub use fixtures::*;
pub use recording::*;
