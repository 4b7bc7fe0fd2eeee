//! Text decoding for delimited uploads.
//!
//! Encodings are tried in order and the first one that decodes the whole buffer wins.

use std::fmt;

use crate::error::{IngestionError, IngestionResult};

/// Supported text encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8; a leading byte-order mark is stripped.
    Utf8,
    /// Windows code page 1252. Fails on its five unassigned bytes.
    Windows1252,
    /// ISO-8859-1. Every byte maps to a code point, so this never fails.
    Latin1,
}

/// Default fallback order.
pub const DEFAULT_ENCODINGS: [TextEncoding; 3] =
    [TextEncoding::Utf8, TextEncoding::Windows1252, TextEncoding::Latin1];

impl TextEncoding {
    /// Decode the full buffer, or `None` if it is not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_owned)
            }
            TextEncoding::Windows1252 => bytes.iter().map(|&b| windows_1252_char(b)).collect(),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1252 => "windows-1252",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode `bytes` with the first encoding in `encodings` that accepts them.
pub fn decode_text(bytes: &[u8], encodings: &[TextEncoding]) -> IngestionResult<(String, TextEncoding)> {
    for &enc in encodings {
        match enc.decode(bytes) {
            Some(text) => {
                tracing::debug!(encoding = %enc, "decoded upload");
                return Ok((text, enc));
            }
            None => tracing::debug!(encoding = %enc, "decode attempt failed"),
        }
    }

    Err(IngestionError::Decode {
        tried: encodings
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn windows_1252_char(b: u8) -> Option<char> {
    let c = match b {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        0x81 | 0x8D | 0x8F | 0x90 | 0x9D => return None,
        _ => char::from(b),
    };
    Some(c)
}
