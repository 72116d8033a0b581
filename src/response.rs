// SPDX-License-Identifier: BSD-3-Clause

//! Classifies a raw inbound blob as an ACK, a NAK, or a framed message, and verifies the LRC of
//! framed messages.

use crate::framing::{lrc_is_valid, ACK, ETX, LRC_SKIP, NAK, STX};
use crate::message::Message;
use crate::Error;

/// A classified reply from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A bare positive acknowledgement (0x06).
    Ack,

    /// A bare negative acknowledgement (0x15).
    Nak,

    /// A framed message: `payload` is the bytes between STX and the last ETX, `lrc` is the single
    /// trailing byte. LRC validity is checked at construction time by [`Response::parse`].
    Framed { payload: Vec<u8>, lrc: u8 },
}

impl Response {
    /// `true` for [`Response::Ack`].
    pub fn is_ack(&self) -> bool {
        matches!(self, Response::Ack)
    }

    /// `true` for [`Response::Nak`].
    pub fn is_nak(&self) -> bool {
        matches!(self, Response::Nak)
    }

    /// `true` for [`Response::Framed`].
    pub fn is_framed(&self) -> bool {
        matches!(self, Response::Framed { .. })
    }

    /// Decodes the framed payload into a [`Message`]. Only meaningful for [`Response::Framed`];
    /// panics otherwise, since callers are expected to have already matched on the variant (the
    /// transport never hands a bare ACK/NAK to code expecting a message).
    pub fn message(&self) -> Message {
        match self {
            Response::Framed { payload, .. } => Message::decode(payload),
            _ => panic!("response is not a framed message"),
        }
    }

    /// Classifies `raw` and verifies LRC if it is a framed message.
    ///
    /// The payload/LRC split follows a greedy rule: the payload runs up to the *last* ETX in
    /// `raw`, and everything after that is the LRC. The protocol has no escaping mechanism for an
    /// embedded ETX inside a payload, so a well-formed peer never sends one; this crate follows
    /// the original source's regex-equivalent behavior rather than inventing an escaping scheme.
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        if raw.len() == 1 && raw[0] == ACK {
            return Ok(Response::Ack);
        }
        if raw.len() == 1 && raw[0] == NAK {
            return Ok(Response::Nak);
        }
        if raw.first() == Some(&STX) {
            let body = &raw[1..];
            let split = body
                .iter()
                .rposition(|&b| b == ETX)
                .unwrap_or(body.len());
            let payload = body[..split].to_vec();
            let lrc = body.get(split + 1).copied().unwrap_or(0);

            if !lrc_is_valid(&payload, lrc) {
                return Err(Error::InvalidMessage);
            }

            return Ok(Response::Framed { payload, lrc });
        }

        Err(Error::InvalidAcknowledgement(raw.first().copied().unwrap_or(0)))
    }

    /// Builds a `Framed` response directly from an already-known-good payload, skipping LRC
    /// verification. Used by [`crate::transport`] once it has assembled a frame byte-by-byte and
    /// already validated it via [`Response::parse`]-equivalent logic, and by tests constructing
    /// fixtures.
    pub fn framed(payload: Vec<u8>, lrc: u8) -> Self {
        Response::Framed { payload, lrc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::lrc_compute;

    #[test]
    fn bare_ack_classifies() {
        assert_eq!(Response::parse(&[ACK]).unwrap(), Response::Ack);
    }

    #[test]
    fn bare_nak_classifies() {
        assert_eq!(Response::parse(&[NAK]).unwrap(), Response::Nak);
    }

    #[test]
    fn valid_framed_message_parses() {
        let payload = b"AB".to_vec();
        let lrc = lrc_compute(&payload);
        let mut raw = vec![STX];
        raw.extend_from_slice(&payload);
        raw.push(ETX);
        raw.push(lrc);

        let response = Response::parse(&raw).unwrap();
        assert_eq!(response, Response::Framed { payload, lrc });
    }

    #[test]
    fn lrc_mismatch_is_rejected() {
        // Scenario 6: STX 'A' 'B' ETX 0x00
        let raw = [STX, b'A', b'B', ETX, 0x00];
        match Response::parse(&raw) {
            Err(Error::InvalidMessage) => {}
            other => panic!("expected InvalidMessage, got {other:?}"),
        }
    }

    #[test]
    fn lrc_skip_sentinel_bypasses_verification() {
        let raw = [STX, b'A', b'B', ETX, LRC_SKIP];
        let response = Response::parse(&raw).unwrap();
        assert_eq!(
            response,
            Response::Framed {
                payload: b"AB".to_vec(),
                lrc: LRC_SKIP
            }
        );
    }

    #[test]
    fn unexpected_leading_byte_is_invalid_ack() {
        match Response::parse(&[0x42]) {
            Err(Error::InvalidAcknowledgement(0x42)) => {}
            other => panic!("expected InvalidAcknowledgement, got {other:?}"),
        }
    }
}
