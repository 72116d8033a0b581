// SPDX-License-Identifier: BSD-3-Clause

//! Framing primitives: control bytes, the field delimiter, and the LRC checksum.

/// Start of text: marks the beginning of a framed message payload.
pub const STX: u8 = 0x02;

/// End of text: marks the end of a framed message payload, immediately followed by the LRC byte.
pub const ETX: u8 = 0x03;

/// Enquiry: asks the PC interface whether it is ready to receive a new message.
pub const ENQ: u8 = 0x05;

/// Positive acknowledgement.
pub const ACK: u8 = 0x06;

/// Negative acknowledgement.
pub const NAK: u8 = 0x15;

/// Sent in place of a computed LRC to tell the peer to skip LRC verification.
pub const LRC_SKIP: u8 = 0x0D;

/// Separates fields within a message payload. Never appears inside a sanitized field.
pub const FIELD_DELIMITER: u8 = 0xB3;

/// Computes the LRC of `payload`: the XOR-reduction of `payload` followed by [`ETX`]. STX is not
/// included, matching the original interface's checksum scope.
pub fn lrc_compute(payload: &[u8]) -> u8 {
    payload.iter().copied().chain(std::iter::once(ETX)).fold(0u8, |acc, b| acc ^ b)
}

/// Returns `true` if `lrc` is an acceptable checksum for `payload`: either the caller-requested
/// skip sentinel, or the computed LRC.
pub fn lrc_is_valid(payload: &[u8], lrc: u8) -> bool {
    lrc == LRC_SKIP || lrc == lrc_compute(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lrc_xors_payload_and_etx() {
        // 'A' ^ 'B' ^ ETX
        assert_eq!(lrc_compute(b"AB"), b'A' ^ b'B' ^ ETX);
    }

    #[test]
    fn lrc_of_empty_payload_is_etx() {
        assert_eq!(lrc_compute(b""), ETX);
    }

    #[test]
    fn skip_sentinel_is_always_valid() {
        assert!(lrc_is_valid(b"anything at all", LRC_SKIP));
    }

    #[test]
    fn single_byte_corruption_is_detected() {
        let payload = b"Room 1 checkout";
        let good = lrc_compute(payload);
        for bit in 0..8 {
            let mut corrupted = payload.to_vec();
            corrupted[3] ^= 1 << bit;
            assert_ne!(lrc_compute(&corrupted), good, "bit {bit} flip went undetected");
        }
    }

    #[test]
    fn control_bytes_never_collide_with_delimiter() {
        let controls = [STX, ETX, ENQ, ACK, NAK, LRC_SKIP];
        for c in controls {
            assert_ne!(c, FIELD_DELIMITER);
        }
    }
}
