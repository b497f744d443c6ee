//! Reverse HTML escaping of the recorder payload.
//!
//! The recorder escapes the JSON text before compressing it, so the inflated
//! payload contains references such as `&quot;` and `&#39;`.
//!
//! Handled forms:
//! - named: `&amp;` `&lt;` `&gt;` `&quot;` `&apos;` `&nbsp;` `&copy;` `&reg;`
//! - legacy names without `;`: `&amp` `&lt` `&gt` `&quot` `&nbsp` `&copy` `&reg`
//!   (and their upper-case forms where HTML has them), matched as the longest
//!   prefix of the name, so `&ampx` is `&x`
//! - decimal: `&#39;` / `&#39`
//! - hex: `&#x27;` / `&#X27`
//!
//! Numeric references in 0x80..=0x9F are read as windows-1252, the way
//! browsers do. Unknown names and stray ampersands are copied through unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const REPLACEMENT: char = '\u{FFFD}';

// 1) decimal digits  2) hex digits  3) entity name  4) its semicolon, if any
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#([0-9]+);?|#[xX]([0-9a-fA-F]+);?|([A-Za-z][A-Za-z0-9]*)(;?))").unwrap()
});

/// (name, character, usable without a trailing semicolon)
const NAMED: [(&str, char, bool); 15] = [
    ("amp", '&', true),
    ("AMP", '&', true),
    ("lt", '<', true),
    ("LT", '<', true),
    ("gt", '>', true),
    ("GT", '>', true),
    ("quot", '"', true),
    ("QUOT", '"', true),
    ("apos", '\'', false),
    ("nbsp", '\u{A0}', true),
    ("copy", '\u{A9}', true),
    ("COPY", '\u{A9}', true),
    ("reg", '\u{AE}', true),
    ("REG", '\u{AE}', true),
    ("shy", '\u{AD}', true),
];

/// windows-1252 meaning of 0x80..=0x9F; the five unassigned slots keep their code point.
const WINDOWS_1252: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            if let Some(dec) = caps.get(1) {
                return numeric_reference(dec.as_str(), 10).to_string();
            }
            if let Some(hex) = caps.get(2) {
                return numeric_reference(hex.as_str(), 16).to_string();
            }
            let name = caps.get(3).map_or("", |m| m.as_str());
            let semicolon = caps.get(4).map_or("", |m| m.as_str());
            named_reference(name, semicolon).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn named_reference(name: &str, semicolon: &str) -> Option<String> {
    if !semicolon.is_empty() {
        if let Some(&(_, c, _)) = NAMED.iter().find(|(n, _, _)| *n == name) {
            return Some(c.to_string());
        }
    }

    // Longest legacy name the reference starts with; the rest is plain text.
    let (legacy, c, _) = NAMED
        .iter()
        .filter(|(n, _, legacy)| *legacy && name.starts_with(*n))
        .max_by_key(|(n, _, _)| n.len())?;
    Some(format!("{}{}{}", c, &name[legacy.len()..], semicolon))
}

fn numeric_reference(digits: &str, radix: u32) -> char {
    match u32::from_str_radix(digits, radix) {
        Ok(0) | Err(_) => REPLACEMENT,
        Ok(cp @ 0x80..=0x9F) => WINDOWS_1252[(cp - 0x80) as usize],
        Ok(cp) => char::from_u32(cp).unwrap_or(REPLACEMENT),
    }
}
