// SPDX-License-Identifier: BSD-3-Clause

//! Owns a TCP connection to the PC interface and drives the ENQ/ACK/NAK handshake state machine.

use log::{debug, trace};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::framing::{ACK, ENQ, ETX, LRC_SKIP, NAK, STX};
use crate::message::Message;
use crate::response::Response;
use crate::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const AWAIT_READY_POLL: Duration = Duration::from_millis(200);

/// A `host:port` pair identifying the PC interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parses `"host:port"`. Returns an I/O error (`InvalidInput`) if the string does not contain
    /// exactly one colon-separated port, or the port is not a valid `u16`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "expected host:port")
        })?;
        let port: u16 = port
            .parse()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid port"))?;
        Ok(Endpoint {
            host: host.to_string(),
            port,
        })
    }

    fn to_socket_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A client for the PC interface. Cheap to clone/share for configuration; each outstanding
/// request opens its own [`TcpStream`] (except the audit fetcher, which reuses one connection
/// across a sequence of turns via [`Client::create_connection`] and [`Client::send_on`]).
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Endpoint,
    lrc_skip: bool,
}

impl Client {
    pub fn new(endpoint: Endpoint, lrc_skip: bool) -> Self {
        Self { endpoint, lrc_skip }
    }

    /// Sends a bare ENQ on a fresh connection and returns `true` iff the peer replies ACK.
    pub fn is_ready(&self) -> Result<bool, Error> {
        let mut conn = self.create_connection()?;
        let response = self.dispatch(&mut conn, &[ENQ])?;
        Ok(response.is_ack())
    }

    /// Frames `message` and sends it on a fresh connection.
    pub fn send(&self, message: &Message) -> Result<Response, Error> {
        let mut conn = self.create_connection()?;
        self.send_on(&mut conn, message)
    }

    /// Sends the "WR" repeat-last-incident request on a fresh connection. Legal to send at any
    /// time, but the peer rejects it with its own "WR" error code unless a prior WF/WN has been
    /// sent on the session, so this crate's own audit fetcher never calls it; exposed for callers
    /// recovering from a dropped connection mid-trail.
    pub fn repeat_last(&self) -> Result<Response, Error> {
        self.send(&Message::from_fields(vec![b"WR".to_vec()]))
    }

    /// Opens a fresh TCP connection to the configured endpoint, applying the connect timeout.
    pub fn create_connection(&self) -> Result<TcpStream, Error> {
        use std::net::ToSocketAddrs;

        let addr = self
            .endpoint
            .to_socket_string()
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "could not resolve endpoint",
                )
            })?;

        let conn = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        Ok(conn)
    }

    /// Frames `message` and sends it on the given, already-open connection. Used by the audit
    /// fetcher to hold one connection across its WF/WN dialog.
    pub fn send_on(&self, conn: &mut TcpStream, message: &Message) -> Result<Response, Error> {
        let request = self.encode_message(message);
        self.dispatch(conn, &request)
    }

    /// Frames a [`Message`] into `STX ++ encode(M) ++ ETX ++ lrc`.
    pub fn encode_message(&self, message: &Message) -> Vec<u8> {
        let payload = message.encode();
        let lrc = if self.lrc_skip {
            LRC_SKIP
        } else {
            crate::framing::lrc_compute(&payload)
        };

        let mut out = Vec::with_capacity(payload.len() + 3);
        out.push(STX);
        out.extend_from_slice(&payload);
        out.push(ETX);
        out.push(lrc);
        out
    }

    /// Drives the handshake state machine for one logical request: `S0 Send` / `S1 AckWait` / `S2
    /// ReadFrame`, with NAK retried up to [`MAX_RETRIES`] times via [`Client::await_ready`].
    fn dispatch(&self, conn: &mut TcpStream, request: &[u8]) -> Result<Response, Error> {
        self.dispatch_attempt(conn, request, 1)
    }

    fn dispatch_attempt(
        &self,
        conn: &mut TcpStream,
        request: &[u8],
        attempt: u32,
    ) -> Result<Response, Error> {
        self.write_frame(conn, request)?;

        let ack = self.read_one(conn)?;
        let is_bare_enq = request.len() == 1 && request[0] == ENQ;

        if is_bare_enq && (ack == ACK || ack == NAK) {
            return Ok(if ack == ACK {
                Response::Ack
            } else {
                Response::Nak
            });
        }

        match ack {
            ACK => self.read_frame(conn),
            NAK => {
                if attempt < MAX_RETRIES {
                    debug!("SALTO NAK received, attempt {attempt}/{MAX_RETRIES}; polling for ready");
                    self.await_ready(conn)?;
                    self.dispatch_attempt(conn, request, attempt + 1)
                } else {
                    Ok(Response::Nak)
                }
            }
            other => Err(Error::InvalidAcknowledgement(other)),
        }
    }

    /// Reads the STX-framed body byte-by-byte until ETX, then reads the trailing LRC byte, and
    /// verifies it via [`Response::parse`]-equivalent logic.
    fn read_frame(&self, conn: &mut TcpStream) -> Result<Response, Error> {
        let mut buf = vec![STX];
        loop {
            let byte = self.read_one(conn)?;
            buf.push(byte);
            if byte == ETX {
                break;
            }
        }
        buf.push(self.read_one(conn)?);

        self.trace("in", &buf);
        Response::parse(&buf)
    }

    /// Polls the peer with bare ENQs (up to [`MAX_RETRIES`] times, 200ms apart) until it replies
    /// ACK, after a NAK on the original request.
    fn await_ready(&self, conn: &mut TcpStream) -> Result<(), Error> {
        for attempt in 1..=MAX_RETRIES {
            self.write_frame(conn, &[ENQ])?;
            let ack = self.read_one(conn)?;
            if ack == ACK || attempt >= MAX_RETRIES {
                return Ok(());
            }
            std::thread::sleep(AWAIT_READY_POLL);
        }
        Ok(())
    }

    fn write_frame(&self, conn: &mut TcpStream, bytes: &[u8]) -> Result<(), Error> {
        self.trace("out", bytes);
        conn.set_write_timeout(Some(WRITE_TIMEOUT))?;
        conn.write_all(bytes)?;
        Ok(())
    }

    fn read_one(&self, conn: &mut TcpStream) -> Result<u8, Error> {
        conn.set_read_timeout(Some(READ_TIMEOUT))?;
        let mut byte = [0u8; 1];
        conn.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn trace(&self, direction: &str, bytes: &[u8]) {
        let arrow = if direction == "out" { "->" } else { "<-" };
        trace!(
            "[SALTO][{}:{}] {arrow} {}",
            self.endpoint.host,
            self.endpoint.port,
            textualize(bytes)
        );
    }
}

/// Renders control bytes and the field delimiter as human-readable tokens, for debug tracing.
fn textualize(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            STX => out.push_str("STX "),
            ETX => out.push_str(" ETX"),
            ENQ => out.push_str("ENQ"),
            ACK => out.push_str("ACK"),
            NAK => out.push_str("NAK"),
            LRC_SKIP => out.push_str("LRC_SKIP"),
            crate::framing::FIELD_DELIMITER => out.push('|'),
            b if b.is_ascii_graphic() || b == b' ' => out.push(b as char),
            b => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out
}
