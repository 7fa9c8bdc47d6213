//! Cover rectangle and substitute text geometry.
//!
//! The original font metrics are not recoverable from the rendered page,
//! so the cover band is a heuristic: it is widened by a fixed pad, pushed
//! below the box by a fraction of its height to catch descenders, and made
//! taller than the box to catch ascenders. All factors are configurable.

use crate::document::{Rgb, StandardFont};
use crate::geometry::{DocumentSpace, Point, Rect};

/// Tunable constants of a replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceConfig {
    /// Horizontal padding on each side of the cover, in document units.
    pub pad: f32,
    /// How far below the box the cover starts, as a fraction of its height.
    pub v_offset_factor: f32,
    /// Cover height as a multiple of the box height.
    pub height_multiplier: f32,
    /// Substitute font size as a fraction of the box height.
    pub font_size_ratio: f32,
    pub min_font_size: f32,
    pub background: Rgb,
    pub text_color: Rgb,
    pub font: StandardFont,
}

impl ReplaceConfig {
    pub fn new() -> Self {
        Self {
            pad: 2.0,
            v_offset_factor: 0.5,
            height_multiplier: 2.0,
            font_size_ratio: 0.8,
            min_font_size: 1.0,
            background: Rgb::WHITE,
            text_color: Rgb::BLACK,
            font: StandardFont::Helvetica,
        }
    }

    pub fn with_pad(mut self, pad: f32) -> Self {
        self.pad = pad.max(0.0);
        self
    }

    pub fn with_v_offset_factor(mut self, factor: f32) -> Self {
        self.v_offset_factor = factor.max(0.0);
        self
    }

    pub fn with_height_multiplier(mut self, multiplier: f32) -> Self {
        self.height_multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_font_size_ratio(mut self, ratio: f32) -> Self {
        if ratio > 0.0 {
            self.font_size_ratio = ratio;
        }
        self
    }

    pub fn with_background(mut self, color: Rgb) -> Self {
        self.background = color;
        self
    }

    pub fn with_text_color(mut self, color: Rgb) -> Self {
        self.text_color = color;
        self
    }

    pub fn with_font(mut self, font: StandardFont) -> Self {
        self.font = font;
        self
    }
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the cover goes and where the new text is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub cover: Rect<DocumentSpace>,
    pub font_size: f32,
    /// Start of the substitute text's baseline.
    pub text_origin: Point<DocumentSpace>,
}

impl Placement {
    /// Computes the placement for a run box. Pure and deterministic.
    pub fn plan(bbox: Rect<DocumentSpace>, config: &ReplaceConfig) -> Self {
        let cover = Rect::new(
            bbox.x - config.pad,
            bbox.y - bbox.height * config.v_offset_factor,
            bbox.width + 2.0 * config.pad,
            bbox.height * config.height_multiplier,
        );
        let font_size = (bbox.height * config.font_size_ratio).max(config.min_font_size);
        let text_origin = Point::new(bbox.x, cover.y + (cover.height - font_size) / 2.0);

        Self {
            cover,
            font_size,
            text_origin,
        }
    }
}
