// SPDX-License-Identifier: BSD-3-Clause

//! Typed constructors for the supported commands, each producing a [`Message`] with the
//! vendor-defined field layout described in §4.5 of the specification.

use crate::card_details::{encode_authorizations, ValidityPoint};
use crate::message::Message;

/// Per-operation policy for whether the encoder waits for the card to be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EjectStrategy {
    /// 'E' — eject the card immediately.
    Eject,
    /// 'R' — retain the card in the encoder.
    Retain,
    /// 'T' — "rear" ejection; aliased to [`EjectStrategy::Eject`] on the wire.
    Rear,
}

impl EjectStrategy {
    fn wire_byte(self) -> u8 {
        match self {
            EjectStrategy::Eject | EjectStrategy::Rear => b'E',
            EjectStrategy::Retain => b'R',
        }
    }
}

/// The serial-number-return policy for `EncodeCard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialNumberReturn {
    /// '0' — do not return serial numbers.
    None,
    /// '1' — return the last card's serial number.
    Last,
    /// '2' — return all serial numbers.
    All,
}

impl SerialNumberReturn {
    fn wire_byte(self) -> u8 {
        match self {
            SerialNumberReturn::None => b'0',
            SerialNumberReturn::Last => b'1',
            SerialNumberReturn::All => b'2',
        }
    }
}

/// Builds the Checkout ("CO") command: `["CO", "0", room]`.
pub fn checkout(room: &str) -> Message {
    Message::from_fields(vec![
        Message::encode_str("CO"),
        Message::encode_str("0"),
        Message::sanitize_text(room),
    ])
}

/// Parameters for [`encode_card`]. Rooms beyond the first four are silently truncated, matching
/// the original source's fixed four-room field layout.
#[derive(Debug, Clone, Default)]
pub struct EncodeCardRequest<'a> {
    pub amount: u32,
    pub encoder: &'a str,
    pub eject_strategy: Option<EjectStrategy>,
    pub rooms: &'a [&'a str],
    pub granted: &'a [u8],
    pub denied: &'a [u8],
    pub valid_from: Option<ValidityPoint>,
    pub valid_until: Option<ValidityPoint>,
    pub operator: &'a str,
    pub print_info: &'a str,
    pub serial_number_return: SerialNumberReturn,
}

// Defaults follow encode_card.py: eject_strategy defaults to RETAIN, serial_number_return to ALL.

impl Default for EjectStrategy {
    fn default() -> Self {
        EjectStrategy::Retain
    }
}

impl Default for SerialNumberReturn {
    fn default() -> Self {
        SerialNumberReturn::All
    }
}

/// Truncates `bytes` to at most `max` bytes, matching the original source's byte-oriented (not
/// character-oriented) truncation of operator names and print-info lines.
fn truncate_bytes(mut bytes: Vec<u8>, max: usize) -> Vec<u8> {
    bytes.truncate(max);
    bytes
}

/// Builds the EncodeCard ("CN") command: a fixed 16-field message. See §4.5 for the full field
/// layout.
pub fn encode_card(req: &EncodeCardRequest<'_>) -> Message {
    let mut fields: Vec<Vec<u8>> = vec![Vec::new(); 16];

    fields[0] = if req.amount > 0 {
        Message::encode_str(&format!("CN{}", req.amount))
    } else {
        Message::encode_str("CN")
    };
    fields[1] = Message::sanitize_text(req.encoder);
    fields[2] = vec![req.eject_strategy.unwrap_or_default().wire_byte()];

    for (slot, room) in fields[3..=6].iter_mut().zip(req.rooms.iter()) {
        *slot = Message::sanitize_text(room);
    }

    fields[7] = encode_authorizations(req.granted);
    fields[8] = encode_authorizations(req.denied);

    fields[9] = req
        .valid_from
        .map(|v| Message::encode_str(&v.to_wire()))
        .unwrap_or_default();
    fields[10] = req
        .valid_until
        .map(|v| Message::encode_str(&v.to_wire()))
        .unwrap_or_default();

    fields[11] = truncate_bytes(Message::encode_str(req.operator), 24);

    for (slot, line) in fields[12..=14]
        .iter_mut()
        .zip(req.print_info.lines().take(3))
    {
        *slot = truncate_bytes(Message::sanitize_text(line), 24);
    }

    fields[15] = vec![req.serial_number_return.wire_byte()];

    Message::from_fields(fields)
}

/// Parameters for [`encode_mobile`].
#[derive(Debug, Clone, Default)]
pub struct EncodeMobileRequest<'a> {
    pub phone_number: &'a str,
    pub rooms: &'a [&'a str],
    pub granted: &'a [u8],
    pub denied: &'a [u8],
    pub valid_from: Option<ValidityPoint>,
    pub valid_until: Option<ValidityPoint>,
    pub operator: &'a str,
    pub print_info: &'a str,
    pub text_message: &'a str,
}

/// Builds the EncodeMobile ("CNM") command directly as its 15-field wire layout — the same layout
/// `EncodeCard` would produce with `amount=0`, minus the eject-strategy field, with the sanitized
/// text message placed at field 14. The original source built this by constructing an `EncodeCard`
/// and mutating its field list in place (removing index 2, assigning index 14); this crate builds
/// the field vector directly from the specification, producing the identical wire layout without
/// the differential-edit indirection (see SPEC_FULL.md §4.5/§9).
pub fn encode_mobile(req: &EncodeMobileRequest<'_>) -> Message {
    let mut fields: Vec<Vec<u8>> = vec![Vec::new(); 15];

    fields[0] = Message::encode_str("CNM");
    fields[1] = Message::sanitize_text(req.phone_number);

    for (slot, room) in fields[2..=5].iter_mut().zip(req.rooms.iter()) {
        *slot = Message::sanitize_text(room);
    }

    fields[6] = encode_authorizations(req.granted);
    fields[7] = encode_authorizations(req.denied);

    fields[8] = req
        .valid_from
        .map(|v| Message::encode_str(&v.to_wire()))
        .unwrap_or_default();
    fields[9] = req
        .valid_until
        .map(|v| Message::encode_str(&v.to_wire()))
        .unwrap_or_default();

    fields[10] = truncate_bytes(Message::encode_str(req.operator), 24);

    for (slot, line) in fields[11..=13]
        .iter_mut()
        .zip(req.print_info.lines().take(3))
    {
        *slot = truncate_bytes(Message::sanitize_text(line), 24);
    }

    fields[14] = truncate_bytes(Message::sanitize_text(req.text_message), 256);

    Message::from_fields(fields)
}

/// Builds the ReadCard ("LT") command: `["LT", encoder, eject_strategy]`.
pub fn read_card(encoder: &str, eject_strategy: EjectStrategy) -> Message {
    Message::from_fields(vec![
        Message::encode_str("LT"),
        Message::sanitize_text(encoder),
        vec![eject_strategy.wire_byte()],
    ])
}

/// Builds the ReadTrack ("L\<n\>") command: `["L"+track, encoder, eject_strategy]`. `track` must
/// be a single ASCII digit.
pub fn read_track(track: char, encoder: &str, eject_strategy: EjectStrategy) -> Message {
    Message::from_fields(vec![
        Message::encode_str(&format!("L{track}")),
        Message::sanitize_text(encoder),
        vec![eject_strategy.wire_byte()],
    ])
}

/// Builds the WriteTrack ("P\<n\>") command: `["P"+track, encoder, eject_strategy,
/// sanitize(text)]`. `track` must be a single ASCII digit.
pub fn write_track(track: char, encoder: &str, eject_strategy: EjectStrategy, text: &str) -> Message {
    Message::from_fields(vec![
        Message::encode_str(&format!("P{track}")),
        Message::sanitize_text(encoder),
        vec![eject_strategy.wire_byte()],
        Message::sanitize_text(text),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_matches_scenario_fields() {
        let msg = checkout("Room 1");
        assert_eq!(
            msg.fields,
            vec![b"CO".to_vec(), b"0".to_vec(), b"Room 1".to_vec()]
        );
    }

    #[test]
    fn encode_card_with_three_rooms_and_authorizations_matches_scenario() {
        let rooms = ["R1", "R2", "R3"];
        let req = EncodeCardRequest {
            amount: 1,
            encoder: "E1",
            rooms: &rooms,
            granted: &[1, 10, 36],
            valid_from: Some(ValidityPoint {
                hour: 5,
                minute: 6,
                day: 4,
                month: 3,
                year: 24,
            }),
            ..Default::default()
        };
        let msg = encode_card(&req);

        assert_eq!(msg.fields.len(), 16);
        assert_eq!(msg.fields[0], b"CN1");
        assert_eq!(msg.fields[1], b"E1");
        assert_eq!(msg.fields[2], b"R");
        assert_eq!(msg.fields[3], b"R1");
        assert_eq!(msg.fields[4], b"R2");
        assert_eq!(msg.fields[5], b"R3");
        assert_eq!(msg.fields[6], b"");
        assert_eq!(msg.fields[7], b"1a!");
        assert_eq!(msg.fields[9], b"0506040324");
    }

    #[test]
    fn default_eject_strategy_and_serial_number_return_match_the_original() {
        let req = EncodeCardRequest {
            encoder: "E1",
            ..Default::default()
        };
        let msg = encode_card(&req);
        assert_eq!(msg.fields[2], b"R");
        assert_eq!(msg.fields[15], b"2");
    }

    #[test]
    fn encode_card_bare_command_when_amount_is_zero() {
        let req = EncodeCardRequest {
            amount: 0,
            encoder: "E1",
            ..Default::default()
        };
        let msg = encode_card(&req);
        assert_eq!(msg.fields[0], b"CN");
    }

    #[test]
    fn encode_card_truncates_operator_and_print_info_to_24_bytes() {
        let long = "x".repeat(40);
        let req = EncodeCardRequest {
            encoder: "E1",
            operator: &long,
            print_info: &long,
            ..Default::default()
        };
        let msg = encode_card(&req);
        assert_eq!(msg.fields[11].len(), 24);
        assert_eq!(msg.fields[12].len(), 24);
    }

    #[test]
    fn encode_card_excess_rooms_are_truncated() {
        let rooms = ["R1", "R2", "R3", "R4", "R5"];
        let req = EncodeCardRequest {
            encoder: "E1",
            rooms: &rooms,
            ..Default::default()
        };
        let msg = encode_card(&req);
        assert_eq!(msg.fields[3], b"R1");
        assert_eq!(msg.fields[4], b"R2");
        assert_eq!(msg.fields[5], b"R3");
        assert_eq!(msg.fields[6], b"R4");
    }

    #[test]
    fn encode_mobile_has_fifteen_fields_with_text_message_last() {
        let rooms = ["R1"];
        let req = EncodeMobileRequest {
            phone_number: "+15551234",
            rooms: &rooms,
            granted: &[1],
            denied: &[],
            valid_from: None,
            valid_until: None,
            operator: "Front Desk",
            print_info: "",
            text_message: "Your key is ready",
        };
        let msg = encode_mobile(&req);
        assert_eq!(msg.fields.len(), 15);
        assert_eq!(msg.fields[0], b"CNM");
        assert_eq!(msg.fields[1], b"+15551234");
        assert_eq!(msg.fields[2], b"R1");
        assert_eq!(msg.fields[14], b"Your key is ready");
    }

    #[test]
    fn encode_mobile_truncates_text_message_to_256_bytes() {
        let long = "x".repeat(300);
        let req = EncodeMobileRequest {
            phone_number: "1",
            text_message: &long,
            ..Default::default()
        };
        let msg = encode_mobile(&req);
        assert_eq!(msg.fields[14].len(), 256);
    }

    #[test]
    fn read_card_builds_three_fields() {
        let msg = read_card("Encoder1", EjectStrategy::Eject);
        assert_eq!(msg.fields, vec![b"LT".to_vec(), b"Encoder1".to_vec(), b"E".to_vec()]);
    }

    #[test]
    fn read_track_encodes_track_digit_in_command_name() {
        let msg = read_track('2', "Encoder1", EjectStrategy::Retain);
        assert_eq!(msg.fields[0], b"L2");
        assert_eq!(msg.fields[2], b"R");
    }

    #[test]
    fn write_track_carries_sanitized_text() {
        let msg = write_track('1', "Encoder1", EjectStrategy::Eject, "hello\r");
        assert_eq!(msg.fields[0], b"P1");
        assert_eq!(msg.fields[3], b"hello");
    }

    #[test]
    fn rear_eject_strategy_aliases_to_eject_on_the_wire() {
        let msg = read_card("Encoder1", EjectStrategy::Rear);
        assert_eq!(msg.fields[2], b"E");
    }
}
