//! Glyph metrics of the standard fonts.
//!
//! Documents commonly reference the standard fonts without a `/Widths`
//! array, so run widths fall back to these AFM values (1/1000 em).

/// Helvetica and Helvetica-Oblique, codes 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

/// Helvetica-Bold and Helvetica-BoldOblique, codes 0x20..=0x7E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 0x70
];

/// Times-Roman, also used for the other Times faces, codes 0x20..=0x7E.
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // 0x20
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // 0x30
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // 0x40
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // 0x50
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // 0x60
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, // 0x70
];

/// Width used when nothing better is known.
pub const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Widths {
    Table(&'static [u16; 95], f32),
    Fixed(f32),
}

/// Metrics of one standard font family member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Base14Metrics {
    widths: Widths,
    pub ascent: f32,
    pub descent: f32,
}

impl Base14Metrics {
    /// Matches a `/BaseFont` name, tolerating subset prefixes
    /// (`ABCDEF+Helvetica`) and the `Arial` aliases.
    pub fn for_base_font(base_font: &str) -> Option<Self> {
        let name = base_font
            .split_once('+')
            .map_or(base_font, |(_, rest)| rest)
            .replace(',', "-");
        let bold = name.contains("Bold");

        let metrics = if name.starts_with("Helvetica") || name.starts_with("Arial") {
            let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
            Self {
                widths: Widths::Table(table, 556.0),
                ascent: 718.0,
                descent: -207.0,
            }
        } else if name.starts_with("Times") {
            Self {
                widths: Widths::Table(&TIMES_ROMAN, DEFAULT_GLYPH_WIDTH),
                ascent: if bold { 676.0 } else { 683.0 },
                descent: if bold { -205.0 } else { -217.0 },
            }
        } else if name.starts_with("Courier") {
            Self {
                widths: Widths::Fixed(600.0),
                ascent: if bold { 626.0 } else { 629.0 },
                descent: if bold { -142.0 } else { -157.0 },
            }
        } else {
            return None;
        };
        Some(metrics)
    }

    /// Advance width of `ch` in 1/1000 em.
    pub fn width(&self, ch: char) -> f32 {
        match self.widths {
            Widths::Fixed(width) => width,
            Widths::Table(table, fallback) => match ch as u32 {
                code @ 0x20..=0x7E => table[(code - 0x20) as usize] as f32,
                _ => fallback,
            },
        }
    }

    /// Ascent minus descent in em.
    pub fn height_factor(&self) -> f32 {
        (self.ascent - self.descent) / 1000.0
    }
}
