// SPDX-License-Identifier: BSD-3-Clause

//! The message codec: an ordered sequence of byte fields, their wire encoding, and the text
//! sanitization rules applied before framing.

use crate::framing::FIELD_DELIMITER;
use crate::i18n::localize;

/// Field-0 codes that mark a message as a vendor error response.
pub const ERROR_CODES: [&str; 13] = [
    "ES", "NC", "NF", "OV", "EP", "EF", "TD", "ED", "EA", "OS", "EO", "EV", "EG",
];

/// An ordered sequence of opaque byte fields making up a protocol message.
///
/// A `Message` always has at least one field by construction from the wire (the command or error
/// code occupies field 0); an empty `Vec<Vec<u8>>` is a programmer error in the caller, not
/// something this type guards against at construction time (mirroring the original source, which
/// never validates field count at the `Message` level either).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub fields: Vec<Vec<u8>>,
}

impl Message {
    /// Builds a `Message` directly from a list of fields.
    pub fn from_fields(fields: Vec<Vec<u8>>) -> Self {
        Self { fields }
    }

    /// Encodes this message's fields into the delimiter-wrapped wire payload, without the
    /// STX/ETX/LRC framing that [`crate::transport`] adds.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for field in &self.fields {
            out.push(FIELD_DELIMITER);
            out.extend_from_slice(field);
        }
        out.push(FIELD_DELIMITER);
        out
    }

    /// Decodes a wire payload (as produced by [`Message::encode`]) back into a `Message`. The
    /// payload's leading and trailing delimiter flank every field by construction, so splitting on
    /// the delimiter and dropping the first and last (empty) fragments recovers the field list.
    pub fn decode(payload: &[u8]) -> Self {
        let mut parts: Vec<Vec<u8>> = payload
            .split(|&b| b == FIELD_DELIMITER)
            .map(|s| s.to_vec())
            .collect();

        if parts.len() >= 2 {
            parts.remove(0);
            parts.pop();
        }

        Self { fields: parts }
    }

    /// Transliterates `text` to an ASCII/Latin-1-safe byte string using a "short" transliteration
    /// (diacritics stripped, ligatures flattened, unrepresentable codepoints replaced with `?`),
    /// then neutralizes the field delimiter and carriage returns so the result can never corrupt
    /// framing.
    pub fn sanitize_text(text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());

        for ch in text.chars() {
            match deunicode::deunicode_char(ch) {
                Some(approx) => out.extend_from_slice(approx.as_bytes()),
                None => out.push(b'?'),
            }
        }

        for byte in out.iter_mut() {
            if *byte == FIELD_DELIMITER {
                *byte = b'|';
            }
        }

        out.retain(|&b| b != b'\r');
        out
    }

    /// Encodes `text` directly as Latin-1 bytes, with no transliteration. Intended for values the
    /// caller guarantees are representable (command names, numeric fields, enum tags); any
    /// codepoint above U+00FF is replaced with `?` rather than panicking.
    pub fn encode_str(text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
            .collect()
    }

    /// Interprets field `index` as a Latin-1 string. Negative indices count from the end, matching
    /// the original source's `str_field(-1)` convention for "last field".
    pub fn str_field(&self, index: isize) -> String {
        let field = self.field_at(index);
        field.iter().map(|&b| b as char).collect()
    }

    fn field_at(&self, index: isize) -> &[u8] {
        let len = self.fields.len() as isize;
        let resolved = if index < 0 { len + index } else { index };
        &self.fields[resolved as usize]
    }

    /// The command tag (field 0), or `None` if this message is an error response.
    pub fn command(&self) -> Option<String> {
        if self.is_error() {
            None
        } else {
            Some(self.str_field(0))
        }
    }

    /// `true` if field 0 is one of the 13 vendor error codes.
    pub fn is_error(&self) -> bool {
        self.fields.first().is_some_and(|f| {
            ERROR_CODES
                .iter()
                .any(|code| code.as_bytes() == f.as_slice())
        })
    }

    /// The localized human-readable error message, or `None` if this is not an error response.
    /// For the `EG` (general error) code, a suffix in the last field is appended when present.
    pub fn error_message(&self) -> Option<String> {
        if !self.is_error() {
            return None;
        }

        let code = self.str_field(0);
        if code == "EG" && self.fields.len() > 1 {
            Some(self.str_field(-1))
        } else {
            Some(localize(&format!("salto.errors.{code}")))
        }
    }
}
