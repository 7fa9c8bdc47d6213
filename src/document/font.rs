//! Substitute fonts and the WinAnsi text codec.
//!
//! Replacement text is always drawn with one of the standard PDF text
//! fonts. These need no font program in the file, only a font dictionary
//! declaring `/WinAnsiEncoding`, so every string drawn with them must be
//! representable in that single-byte encoding.

use crate::error::FontError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The standard PDF text fonts that can serve as the substitute font.
///
/// `Symbol` and `ZapfDingbats` are not offered because they carry their own
/// built-in encodings instead of WinAnsi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    pub const ALL: [StandardFont; 12] = [
        Self::Helvetica,
        Self::HelveticaBold,
        Self::HelveticaOblique,
        Self::HelveticaBoldOblique,
        Self::TimesRoman,
        Self::TimesBold,
        Self::TimesItalic,
        Self::TimesBoldItalic,
        Self::Courier,
        Self::CourierBold,
        Self::CourierOblique,
        Self::CourierBoldOblique,
    ];

    /// The PostScript name used as `/BaseFont`.
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Looks a font up by its PostScript name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Self, FontError> {
        Self::ALL
            .iter()
            .copied()
            .find(|font| font.base_name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| FontError::UnknownFont(name.to_string()))
    }

    /// Encodes `text` as WinAnsi bytes for a `Tj` operand.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, FontError> {
        text.chars()
            .map(|ch| {
                encode_win_ansi(ch).ok_or_else(|| FontError::Unencodable {
                    font: self.base_name().to_string(),
                    ch,
                })
            })
            .collect()
    }
}

impl fmt::Display for StandardFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

impl FromStr for StandardFont {
    type Err = FontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// A substitute font registered on one page under a resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontHandle {
    pub resource_name: String,
    pub font: StandardFont,
}

impl FontHandle {
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, FontError> {
        self.font.encode(text)
    }
}

/// WinAnsi code points 0x80..=0x9F; `None` marks unassigned codes.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

static WIN_ANSI_REVERSE: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    WIN_ANSI_HIGH
        .iter()
        .enumerate()
        .filter_map(|(offset, ch)| ch.map(|c| (c, 0x80 + offset as u8)))
        .collect()
});

/// Decodes one byte of a WinAnsi string.
pub fn decode_win_ansi(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WIN_ANSI_HIGH[(byte - 0x80) as usize].unwrap_or('\u{FFFD}'),
        _ => byte as char,
    }
}

/// Encodes one character as WinAnsi, or `None` if it has no code.
pub fn encode_win_ansi(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(ch as u8),
        _ => WIN_ANSI_REVERSE.get(&ch).copied(),
    }
}
