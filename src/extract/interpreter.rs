//! Content-stream interpretation for text positioning.
//!
//! Only the operators that move the pen or change what glyphs look like
//! are tracked: the graphics state stack with its CTM, the text state
//! parameters, and the text and line matrices.

use super::fonts::{string_bytes, Glyph, RunFont};
use crate::document::number;
use lopdf::content::Operation;
use lopdf::Object;
use std::collections::HashMap;

/// An affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix([f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f32> = operands.iter().take(6).map(number).collect::<Option<_>>()?;
        let array: [f32; 6] = values.try_into().ok()?;
        Some(Matrix(array))
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

/// Text state parameters that live in the graphics state.
#[derive(Debug, Clone)]
struct TextParams {
    font: Option<Vec<u8>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextParams,
}

/// One shown string, positioned in page user space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRun {
    pub content: String,
    /// Corners of the run's text-space box mapped to user space.
    pub corners: [(f32, f32); 4],
    /// Per character `[start, end)` as fractions of the run's advance.
    pub glyph_spans: Vec<(f32, f32)>,
}

/// Walks a page's operators and collects every shown string.
pub(crate) struct TextInterpreter<'a> {
    fonts: &'a HashMap<Vec<u8>, RunFont>,
    fallback_font: RunFont,
    stack: Vec<GraphicsState>,
    state: GraphicsState,
    text_matrix: Matrix,
    line_matrix: Matrix,
    runs: Vec<RawRun>,
}

impl<'a> TextInterpreter<'a> {
    pub fn new(fonts: &'a HashMap<Vec<u8>, RunFont>) -> Self {
        Self {
            fonts,
            fallback_font: RunFont::default(),
            stack: Vec::new(),
            state: GraphicsState {
                ctm: Matrix::IDENTITY,
                text: TextParams::default(),
            },
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            runs: Vec::new(),
        }
    }

    pub fn run(mut self, operations: &[Operation]) -> Vec<RawRun> {
        for op in operations {
            self.step(op);
        }
        self.runs
    }

    fn step(&mut self, op: &Operation) {
        let operands = op.operands.as_slice();
        let num = |i: usize| operands.get(i).and_then(number);

        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                    self.state.text.font = Some(name.to_vec());
                }
                if let Some(size) = num(1) {
                    self.state.text.size = size;
                }
            }
            "Tc" => self.state.text.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.state.text.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.state.text.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
            "TL" => self.state.text.leading = num(0).unwrap_or(0.0),
            "Ts" => self.state.text.rise = num(0).unwrap_or(0.0),
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.state.text.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(0.0, -self.state.text.leading),
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "'" => {
                self.next_line(0.0, -self.state.text.leading);
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (num(0), num(1)) {
                    self.state.text.word_spacing = aw;
                    self.state.text.char_spacing = ac;
                }
                self.next_line(0.0, -self.state.text.leading);
                if let Some(bytes) = operands.get(2).and_then(string_bytes) {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "TJ" => {
                if let Some(Ok(items)) = operands.first().map(Object::as_array) {
                    let items: Vec<ShowItem> = items
                        .iter()
                        .filter_map(|item| match item {
                            Object::String(bytes, _) => Some(ShowItem::Text(bytes)),
                            other => number(other).map(ShowItem::Adjust),
                        })
                        .collect();
                    self.show(&items);
                }
            }
            _ => {}
        }
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn show(&mut self, items: &[ShowItem<'_>]) {
        let params = &self.state.text;
        let font = params
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback_font);
        let size = params.size;
        let scale = params.horizontal_scale;

        let mut pen = 0.0f32;
        let mut content = String::new();
        let mut spans: Vec<(f32, f32)> = Vec::new();

        for item in items {
            match item {
                ShowItem::Adjust(amount) => pen -= amount / 1000.0 * size * scale,
                ShowItem::Text(bytes) => {
                    for Glyph {
                        text,
                        width,
                        is_space,
                    } in font.decode(bytes)
                    {
                        let glyph_advance = width / 1000.0 * size * scale;
                        let chars = text.chars().count().max(1) as f32;
                        for (i, ch) in text.chars().enumerate() {
                            let start = pen + glyph_advance * i as f32 / chars;
                            let end = pen + glyph_advance * (i + 1) as f32 / chars;
                            spans.push((start, end));
                            content.push(ch);
                        }
                        let spacing = params.char_spacing
                            + if is_space { params.word_spacing } else { 0.0 };
                        pen += glyph_advance + spacing * scale;
                    }
                }
            }
        }

        let placement = self.text_matrix.then(&self.state.ctm);
        let bottom = params.rise;
        let top = params.rise + size * font.height_factor();
        let corners = [
            placement.apply(0.0, bottom),
            placement.apply(pen, bottom),
            placement.apply(0.0, top),
            placement.apply(pen, top),
        ];

        self.text_matrix = Matrix::translate(pen, 0.0).then(&self.text_matrix);

        if content.trim().is_empty() {
            return;
        }

        let glyph_spans = spans
            .iter()
            .enumerate()
            .map(|(i, (start, end))| {
                if pen.abs() > f32::EPSILON {
                    (start / pen, end / pen)
                } else {
                    let n = spans.len() as f32;
                    (i as f32 / n, (i + 1) as f32 / n)
                }
            })
            .collect();

        self.runs.push(RawRun {
            content,
            corners,
            glyph_spans,
        });
    }
}

enum ShowItem<'b> {
    Text(&'b [u8]),
    Adjust(f32),
}
