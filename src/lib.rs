// SPDX-License-Identifier: BSD-3-Clause

//! Client-side driver for a vendor serial-over-TCP protocol used to integrate a Property
//! Management System with an electronic locking system's PC interface.
//!
//! The protocol is half-duplex and framed: requests and responses are exchanged one at a time
//! over a single TCP connection, delimited by STX/ETX control bytes and checked with a one-byte
//! LRC. See [`transport`] for the handshake state machine and [`message`] for the wire codec.

pub mod audit;
pub mod card_details;
pub mod commands;
pub mod framing;
pub mod i18n;
pub mod message;
pub mod response;
pub mod transport;

use std::fmt;

pub use audit::{AuditRecord, Clock, DateTime, Direction, FixedClock, Incident, SystemClock};
pub use card_details::CardDetails;
pub use message::Message;
pub use response::Response;
pub use transport::{Client, Endpoint};

/// The possible errors that can arise while driving the protocol.
#[derive(Debug)]
pub enum Error {
    /// Errors returned by I/O failures (connect, read, write, including timeouts).
    Io(std::io::Error),

    /// The peer sent a byte that is neither ACK, NAK, nor the start of a frame (STX) when one of
    /// those was expected. The connection must be dropped; see §5 (Cancellation).
    InvalidAcknowledgement(u8),

    /// A framed response's LRC did not match the payload, and was not the LRC_SKIP sentinel.
    InvalidMessage,

    /// A decode error raised by a view over an already-parsed `Message` (audit records, card
    /// details) rather than by the transport itself.
    Decode(DecodeError),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::InvalidAcknowledgement(b) => {
                write!(f, "invalid SALTO acknowledgement: {b:#04x}")
            }
            Self::InvalidMessage => write!(f, "LRC is incorrect"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// Errors raised while interpreting the fields of an already-parsed [`Message`].
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// An authorization byte fell outside the 62-symbol alphabet.
    UnknownAuthorization(u8),

    /// A datetime field did not match its expected `HHMMddmmyy` or `dd/mm HH:MM` shape.
    MalformedDatetime(String),

    /// A message did not carry as many fields as the decoder required.
    UnexpectedFieldCount { expected: usize, got: usize },

    /// A message had zero fields, violating the Message invariant that a command or error code
    /// is always present.
    EmptyMessage,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAuthorization(b) => write!(f, "byte {b:#04x} is not a valid authorization code"),
            Self::MalformedDatetime(s) => write!(f, "malformed datetime: {s:?}"),
            Self::UnexpectedFieldCount { expected, got } => {
                write!(f, "expected at least {expected} fields, got {got}")
            }
            Self::EmptyMessage => write!(f, "message has no fields"),
        }
    }
}
