//! Per-font decoding and width lookup for run extraction.

use crate::document::font::decode_win_ansi;
use crate::document::metrics::{Base14Metrics, DEFAULT_GLYPH_WIDTH};
use crate::document::{number, resolve};
use lopdf::{Dictionary, Object};
use std::collections::HashMap;

/// Width of a CID glyph when the font declares no `/DW`.
const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// Glyph space of every font except Type3 is 1/1000 em.
const GLYPH_UNIT: f32 = 0.001;

/// Largest CID range accepted from a `cfirst clast w` entry of `/W`.
const MAX_CID_RANGE: u32 = 0xFFFF;

/// One decoded character code: the text it stands for and its advance in
/// 1/1000 em.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    pub text: String,
    pub width: f32,
    pub is_space: bool,
}

/// What the extractor needs to know about one font resource.
#[derive(Debug, Clone)]
pub(crate) struct RunFont {
    two_byte: bool,
    first_char: u32,
    widths: Vec<f32>,
    missing_width: Option<f32>,
    default_cid_width: f32,
    cid_widths: HashMap<u32, f32>,
    base14: Option<Base14Metrics>,
    height_factor: f32,
    to_unicode: Option<ToUnicode>,
}

impl Default for RunFont {
    fn default() -> Self {
        Self {
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            missing_width: None,
            default_cid_width: DEFAULT_CID_WIDTH,
            cid_widths: HashMap::new(),
            base14: None,
            height_factor: 1.0,
            to_unicode: None,
        }
    }
}

impl RunFont {
    pub fn from_dict(doc: &lopdf::Document, dict: &Dictionary) -> Self {
        let name_of = |dict: &Dictionary, key: &[u8]| {
            dict.get(key)
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned())
        };

        let subtype = name_of(dict, b"Subtype");
        let two_byte = subtype.as_deref() == Some("Type0");

        // Type3 glyph space is whatever /FontMatrix maps to text space.
        let (width_scale, height_unit) = match subtype.as_deref() {
            Some("Type3") => numbers(doc, dict, b"FontMatrix")
                .filter(|m| m.len() == 6 && m[0] != 0.0)
                .map_or((1.0, GLYPH_UNIT), |m| (m[0].abs() / GLYPH_UNIT, m[3].abs())),
            _ => (1.0, GLYPH_UNIT),
        };
        let descendant = two_byte
            .then(|| {
                dict.get(b"DescendantFonts")
                    .ok()
                    .map(|o| resolve(doc, o))
                    .and_then(|o| o.as_array().ok())
                    .and_then(|fonts| fonts.first())
                    .map(|o| resolve(doc, o))
                    .and_then(|o| o.as_dict().ok())
            })
            .flatten();

        let base14 = name_of(dict, b"BaseFont")
            .as_deref()
            .and_then(Base14Metrics::for_base_font);

        let descriptor = descendant
            .unwrap_or(dict)
            .get(b"FontDescriptor")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok());

        let descriptor_number = |key: &[u8]| {
            descriptor
                .and_then(|d| d.get(key).ok())
                .map(|o| resolve(doc, o))
                .and_then(number)
        };

        let font_bbox_height = numbers(doc, dict, b"FontBBox")
            .filter(|b| b.len() == 4 && b[3] != b[1])
            .map(|b| (b[3] - b[1]).abs());

        let height_factor = match (descriptor_number(b"Ascent"), descriptor_number(b"Descent")) {
            (Some(ascent), Some(descent)) if ascent > descent => (ascent - descent) * height_unit,
            _ if subtype.as_deref() == Some("Type3") => {
                font_bbox_height.map_or(1.0, |h| h * height_unit)
            }
            _ => base14.map_or(1.0, |m| m.height_factor()),
        };

        // Stored in 1/1000 em whatever the font's glyph space.
        let widths: Vec<f32> = numbers(doc, dict, b"Widths")
            .map(|items| items.iter().map(|w| w * width_scale).collect())
            .unwrap_or_default();

        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(number)
            .map_or(0, |n| n.max(0.0) as u32);

        let default_cid_width = descendant
            .and_then(|d| d.get(b"DW").ok())
            .map(|o| resolve(doc, o))
            .and_then(number)
            .unwrap_or(DEFAULT_CID_WIDTH);

        let cid_widths = descendant
            .and_then(|d| d.get(b"W").ok())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|entries| parse_cid_widths(doc, entries))
            .unwrap_or_default();

        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
            .map(|stream| {
                stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone())
            })
            .and_then(|data| ToUnicode::parse(&data));

        if widths.is_empty() && base14.is_none() && !two_byte {
            log::warn!(
                "Font {:?} has no width information; run widths are estimated",
                name_of(dict, b"BaseFont").unwrap_or_default()
            );
        }

        Self {
            two_byte,
            first_char,
            widths,
            missing_width: descriptor_number(b"MissingWidth"),
            default_cid_width,
            cid_widths,
            base14,
            height_factor,
            to_unicode,
        }
    }

    /// Ascent minus descent in em.
    pub fn height_factor(&self) -> f32 {
        self.height_factor
    }

    /// Splits a shown string into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let code_len = match &self.to_unicode {
            Some(map) => map.code_len,
            None if self.two_byte => 2,
            None => 1,
        };

        bytes
            .chunks(code_len)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                let text = self
                    .to_unicode
                    .as_ref()
                    .and_then(|map| map.get(code))
                    .map(str::to_string)
                    .unwrap_or_else(|| self.fallback_text(code, chunk));
                let width = self.width(code, text.chars().next());
                Glyph {
                    is_space: chunk.len() == 1 && code == 32,
                    text,
                    width,
                }
            })
            .collect()
    }

    fn fallback_text(&self, code: u32, chunk: &[u8]) -> String {
        if chunk.len() == 1 {
            decode_win_ansi(chunk[0]).to_string()
        } else {
            char::decode_utf16([code as u16])
                .map(|r| r.unwrap_or('\u{FFFD}'))
                .collect()
        }
    }

    fn width(&self, code: u32, ch: Option<char>) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_cid_width);
        }
        if let Some(width) = code
            .checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
        {
            return *width;
        }
        if self.widths.is_empty() {
            if let (Some(metrics), Some(ch)) = (self.base14, ch) {
                return metrics.width(ch);
            }
        }
        self.missing_width.unwrap_or(DEFAULT_GLYPH_WIDTH)
    }
}

/// A parsed `/ToUnicode` CMap (`bfchar` and `bfrange` sections).
#[derive(Debug, Clone, Default)]
pub(crate) struct ToUnicode {
    code_len: usize,
    map: HashMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

impl ToUnicode {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let tokens = tokenize(data);
        let mut cmap = ToUnicode::default();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "begincodespacerange" => {
                    if let Some(Token::Hex(lo)) = tokens.get(i + 1) {
                        cmap.code_len = lo.len().max(1);
                    }
                }
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.note_len(src.len());
                        cmap.map.insert(code_of(src), utf16_text(dst));
                        i += 2;
                    }
                    continue;
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.note_len(lo.len());
                        let (lo, hi) = (code_of(lo), code_of(hi));
                        match tokens.get(i + 2) {
                            Some(Token::Hex(dst)) => {
                                let base = code_of(dst);
                                for (offset, code) in (lo..=hi.min(lo + 0xFFFF)).enumerate() {
                                    let value = base + offset as u32;
                                    let text = if dst.len() <= 2 {
                                        char::from_u32(value).map(String::from)
                                    } else {
                                        let mut bytes = dst.clone();
                                        let last = bytes.len() - 2;
                                        bytes[last..].copy_from_slice(
                                            &((code_of(&dst[last..]) + offset as u32) as u16)
                                                .to_be_bytes(),
                                        );
                                        Some(utf16_text(&bytes))
                                    };
                                    if let Some(text) = text {
                                        cmap.map.insert(code, text);
                                    }
                                }
                                i += 3;
                            }
                            Some(Token::ArrayStart) => {
                                let mut j = i + 3;
                                let mut code = lo;
                                while let Some(Token::Hex(dst)) = tokens.get(j) {
                                    if code <= hi {
                                        cmap.map.insert(code, utf16_text(dst));
                                    }
                                    code += 1;
                                    j += 1;
                                }
                                if tokens.get(j) == Some(&Token::ArrayEnd) {
                                    j += 1;
                                }
                                i = j;
                            }
                            _ => break,
                        }
                    }
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        if cmap.code_len == 0 {
            cmap.code_len = 1;
        }
        (!cmap.map.is_empty()).then_some(cmap)
    }

    fn note_len(&mut self, len: usize) {
        if self.code_len == 0 {
            self.code_len = len.max(1);
        }
    }

    fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }
}

/// Reads a numeric array entry, resolving references.
fn numbers(doc: &lopdf::Document, dict: &Dictionary, key: &[u8]) -> Option<Vec<f32>> {
    dict.get(key)
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(|items| {
            items
                .iter()
                .map(|o| number(resolve(doc, o)).unwrap_or(0.0))
                .collect()
        })
}

/// Parses a CIDFont `/W` array: `c [w1 w2 ...]` and `cfirst clast w` entries.
fn parse_cid_widths(doc: &lopdf::Document, entries: &[Object]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut items = entries.iter().map(|o| resolve(doc, o));

    while let Some(first) = items.next() {
        let Some(first) = number(first).filter(|n| *n >= 0.0) else {
            continue;
        };
        let first = first as u32;
        match items.next() {
            Some(Object::Array(list)) => {
                for (offset, width) in list.iter().enumerate() {
                    if let Some(width) = number(resolve(doc, width)) {
                        widths.insert(first + offset as u32, width);
                    }
                }
            }
            Some(last) => {
                let (Some(last), Some(width)) = (number(last), items.next().and_then(number))
                else {
                    break;
                };
                let last = (last.max(0.0) as u32).min(first.saturating_add(MAX_CID_RANGE));
                for cid in first..=last {
                    widths.insert(cid, width);
                }
            }
            None => break,
        }
    }
    widths
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'<' => {
                let end = data[i + 1..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| i + 1 + p);
                let digits: Vec<u8> = data[i + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                let bytes = digits
                    .chunks(2)
                    .map(|pair| {
                        let hi = (pair[0] as char).to_digit(16).unwrap_or(0);
                        let lo = pair
                            .get(1)
                            .and_then(|c| (*c as char).to_digit(16))
                            .unwrap_or(0);
                        (hi * 16 + lo) as u8
                    })
                    .collect();
                tokens.push(Token::Hex(bytes));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_alphanumeric() => {
                let start = i;
                while i < data.len() && data[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
            _ => i += 1,
        }
    }
    tokens
}

/// Resolves every font resource of a page once.
pub(crate) fn page_font_table(
    doc: &lopdf::Document,
    fonts: &std::collections::BTreeMap<Vec<u8>, &Dictionary>,
) -> HashMap<Vec<u8>, RunFont> {
    fonts
        .iter()
        .map(|(name, dict)| (name.clone(), RunFont::from_dict(doc, dict)))
        .collect()
}

/// Reads the string bytes of a `Tj`-style operand.
pub(crate) fn string_bytes(object: &Object) -> Option<&[u8]> {
    match object {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <0049>
endbfchar
2 beginbfrange
<0044> <0046> <0061>
<0050> <0051> [<0066006C> <0078>]
endbfrange
endcmap";

    #[test]
    fn test_to_unicode_sections() {
        let cmap = ToUnicode::parse(CMAP).unwrap();
        assert_eq!(cmap.code_len, 2);
        assert_eq!(cmap.get(0x0003), Some(" "));
        assert_eq!(cmap.get(0x0011), Some("I"));
        assert_eq!(cmap.get(0x0045), Some("b"));
        assert_eq!(cmap.get(0x0046), Some("c"));
        assert_eq!(cmap.get(0x0050), Some("fl"));
        assert_eq!(cmap.get(0x0051), Some("x"));
        assert_eq!(cmap.get(0x0047), None);
    }

    #[test]
    fn test_widths_table_then_missing_width() {
        let font = RunFont {
            first_char: 65,
            widths: vec![700.0, 600.0],
            missing_width: Some(250.0),
            ..RunFont::default()
        };
        let glyphs = font.decode(b"ABC");
        let widths: Vec<f32> = glyphs.iter().map(|g| g.width).collect();
        assert_eq!(widths, vec![700.0, 600.0, 250.0]);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "ABC");
    }

    #[test]
    fn test_base14_fallback_without_widths() {
        let font = RunFont {
            base14: Base14Metrics::for_base_font("Helvetica"),
            ..RunFont::default()
        };
        let glyphs = font.decode(b"Wi ");
        assert_eq!(glyphs[0].width, 944.0);
        assert_eq!(glyphs[1].width, 222.0);
        assert!(glyphs[2].is_space);
    }

    fn font_with(entries: Vec<(&str, Object)>) -> RunFont {
        let doc = lopdf::Document::with_version("1.7");
        RunFont::from_dict(&doc, &Dictionary::from_iter(entries))
    }

    #[test]
    fn test_cid_widths_both_forms() {
        let doc = lopdf::Document::with_version("1.7");
        let entries = vec![
            Object::Integer(3),
            Object::Array(vec![Object::Integer(250), Object::Real(333.5)]),
            Object::Integer(10),
            Object::Integer(12),
            Object::Integer(600),
        ];
        let widths = parse_cid_widths(&doc, &entries);
        assert_eq!(widths.get(&3), Some(&250.0));
        assert_eq!(widths.get(&4), Some(&333.5));
        assert_eq!(widths.get(&5), None);
        assert_eq!(widths.get(&10), Some(&600.0));
        assert_eq!(widths.get(&12), Some(&600.0));
        assert_eq!(widths.len(), 5);
    }

    #[test]
    fn test_type0_uses_descendant_widths() {
        let descendant = Dictionary::from_iter(vec![
            ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
            ("DW", Object::Integer(900)),
            (
                "W",
                Object::Array(vec![
                    Object::Integer(97),
                    Object::Array(vec![Object::Integer(500); 3]),
                ]),
            ),
        ]);
        let font = font_with(vec![
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("Encoding", Object::Name(b"Identity-H".to_vec())),
            (
                "DescendantFonts",
                Object::Array(vec![Object::Dictionary(descendant)]),
            ),
        ]);
        let glyphs = font.decode(&[0x00, 0x61, 0x00, 0x62, 0x00, 0x63, 0x00, 0x64]);
        let widths: Vec<f32> = glyphs.iter().map(|g| g.width).collect();
        assert_eq!(widths, vec![500.0, 500.0, 500.0, 900.0]);
    }

    #[test]
    fn test_type3_widths_follow_font_matrix() {
        let matrix = [0.01, 0.0, 0.0, 0.01, 0.0, 0.0];
        let font = font_with(vec![
            ("Subtype", Object::Name(b"Type3".to_vec())),
            (
                "FontMatrix",
                Object::Array(matrix.iter().map(|v| Object::Real(*v)).collect()),
            ),
            (
                "FontBBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(-20),
                    Object::Integer(100),
                    Object::Integer(80),
                ]),
            ),
            ("FirstChar", Object::Integer(97)),
            ("Widths", Object::Array(vec![Object::Integer(50); 3])),
        ]);
        let glyphs = font.decode(b"abc");
        for glyph in &glyphs {
            assert!((glyph.width - 500.0).abs() < 1e-3);
        }
        assert!((font.height_factor() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_two_byte_font_decodes_utf16() {
        let font = RunFont {
            two_byte: true,
            ..RunFont::default()
        };
        let glyphs = font.decode(&[0x00, 0x48, 0x00, 0x69]);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "Hi");
        assert_eq!(glyphs[0].width, DEFAULT_CID_WIDTH);
    }
}
