// SPDX-License-Identifier: BSD-3-Clause

//! Decodes a read-card ("LT") response into its card type, rooms, validity window, and
//! authorization bitmap.

use crate::message::Message;
use crate::DecodeError;

/// The 62-symbol authorization alphabet, in encoding order (index 0 encodes authorization 1).
const AUTH_ALPHABET: &[u8] = b"123456789abcdefghijklmnopqrstuvwxyz!#$%&()*+,-./:;<=>?@[\\]^_{}";

/// Encodes a list of authorization numbers (each in `1..=62`) into its single-byte-per-entry wire
/// form. Panics if called with a value outside that range; callers are expected to validate
/// upstream (this mirrors [`Message::encode_str`]'s "caller guarantees representability" contract).
pub fn encode_authorizations(authorizations: &[u8]) -> Vec<u8> {
    authorizations
        .iter()
        .map(|&n| {
            assert!((1..=62).contains(&n), "authorization {n} out of range 1..=62");
            AUTH_ALPHABET[(n - 1) as usize]
        })
        .collect()
}

/// Decodes a wire authorization blob back into the list of authorization numbers. Any byte outside
/// [`AUTH_ALPHABET`] is a decode error.
pub fn decode_authorizations(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    bytes
        .iter()
        .map(|&b| {
            AUTH_ALPHABET
                .iter()
                .position(|&a| a == b)
                .map(|pos| (pos + 1) as u8)
                .ok_or(DecodeError::UnknownAuthorization(b))
        })
        .collect()
}

/// The classified card type, from field 2 of a read-card response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    /// "LM" — a staff card.
    Staff,
    /// "LR" — a spare guest card.
    SpareGuest,
    /// "LC" — an invalid guest card.
    InvalidGuest,
    /// "LD" — an unidentified card.
    Unidentified,
    /// Any other tag — a regular guest card.
    Guest,
}

impl CardType {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "LM" => CardType::Staff,
            "LR" => CardType::SpareGuest,
            "LC" => CardType::InvalidGuest,
            "LD" => CardType::Unidentified,
            _ => CardType::Guest,
        }
    }
}

/// A validity-window endpoint, parsed from the strict `HHMMddmmyy` wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityPoint {
    pub hour: u32,
    pub minute: u32,
    pub day: u32,
    pub month: u32,
    pub year: u32,
}

impl ValidityPoint {
    /// Formats as `HHMMddmmyy`, the exact field layout used by `EncodeCard`'s validity-window
    /// fields.
    pub fn to_wire(self) -> String {
        format!(
            "{:02}{:02}{:02}{:02}{:02}",
            self.hour, self.minute, self.day, self.month, self.year
        )
    }

    /// Parses a strict 10-digit `HHMMddmmyy` string.
    pub fn parse(s: &str) -> Result<Self, DecodeError> {
        if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::MalformedDatetime(s.to_string()));
        }
        let digit_pair = |at: usize| -> u32 { s[at..at + 2].parse().unwrap_or(0) };
        Ok(ValidityPoint {
            hour: digit_pair(0),
            minute: digit_pair(2),
            day: digit_pair(4),
            month: digit_pair(6),
            year: digit_pair(8),
        })
    }
}

/// `true` if the card is valid for the main room ("CI"), as opposed to checked-out ("CO").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainRoomValidity {
    CheckedIn,
    CheckedOut,
}

/// A view over a Message returned by a "LT" (read-card) request. See §3/§4.7 of the specification.
#[derive(Debug, Clone)]
pub struct CardDetails {
    message: Message,
}

impl CardDetails {
    pub fn new(message: Message) -> Self {
        Self { message }
    }

    fn field(&self, index: usize) -> Result<&[u8], DecodeError> {
        self.message
            .fields
            .get(index)
            .map(Vec::as_slice)
            .ok_or(DecodeError::UnexpectedFieldCount {
                expected: index + 1,
                got: self.message.fields.len(),
            })
    }

    fn str_field(&self, index: usize) -> Result<String, DecodeError> {
        Ok(self.field(index)?.iter().map(|&b| b as char).collect())
    }

    /// The classified card type, field 2.
    pub fn card_type(&self) -> Result<CardType, DecodeError> {
        Ok(CardType::from_tag(&self.str_field(2)?))
    }

    /// Room names, fields 2-5 for guest cards, with empty entries dropped.
    pub fn rooms(&self) -> Result<Vec<String>, DecodeError> {
        let mut rooms = Vec::new();
        for index in 2..=5 {
            let field = self.str_field(index)?;
            if !field.is_empty() {
                rooms.push(field);
            }
        }
        Ok(rooms)
    }

    /// Main-room validity, field 6: "CI" means the card is valid for the main room, anything else
    /// (including "CO") means it is not.
    pub fn main_room_validity(&self) -> Result<MainRoomValidity, DecodeError> {
        Ok(if self.str_field(6)? == "CI" {
            MainRoomValidity::CheckedIn
        } else {
            MainRoomValidity::CheckedOut
        })
    }

    /// Copy code, field 7, one of `{'0','1','2','I','A'}`.
    pub fn copy_code(&self) -> Result<char, DecodeError> {
        let field = self.field(7)?;
        field
            .first()
            .map(|&b| b as char)
            .ok_or(DecodeError::UnexpectedFieldCount {
                expected: 1,
                got: 0,
            })
    }

    /// Decodes the authorization bitmap, field 8.
    pub fn authorizations(&self) -> Result<Vec<u8>, DecodeError> {
        decode_authorizations(self.field(8)?)
    }

    /// Validity start, field 9, `HHMMddmmyy`.
    pub fn valid_from(&self) -> Result<ValidityPoint, DecodeError> {
        ValidityPoint::parse(&self.str_field(9)?)
    }

    /// Validity end, field 10, `HHMMddmmyy`.
    pub fn valid_until(&self) -> Result<ValidityPoint, DecodeError> {
        ValidityPoint::parse(&self.str_field(10)?)
    }

    /// Operator name, field 11.
    pub fn operator(&self) -> Result<String, DecodeError> {
        self.str_field(11)
    }
}
