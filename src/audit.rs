// SPDX-License-Identifier: BSD-3-Clause

//! The audit-trail fetcher: a multi-turn dialog over a single connection that seeds with "WF" and
//! paginates with "WN" until the peer signals an error or the end of the trail.

use std::net::TcpStream;

use crate::message::Message;
use crate::transport::Client;
use crate::{DecodeError, Error};

/// Field-0 tag marking an audit record as a peer-side error.
const ERROR_TAG: &str = "WE";

/// Field-0 tag marking the end of the trail.
const END_OF_TRAIL_TAG: &str = "WO";

/// A point in time, injectable so audit year inference is testable without racing the real clock
/// at year boundaries (see DESIGN.md, Open Question resolution).
pub trait Clock {
    /// The current local date and time, as `(year, month, day, hour, minute)`.
    fn now(&self) -> (i32, u32, u32, u32, u32);
}

/// The default [`Clock`], backed by the system clock. Only year/month/day/hour/minute are needed,
/// so this hand-rolls a civil-from-days conversion rather than pulling in a full datetime crate
/// for the one call site that needs "now".
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> (i32, u32, u32, u32, u32) {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        civil_from_unix(secs)
    }
}

/// A fixed instant, for deterministic tests.
pub struct FixedClock(pub i32, pub u32, pub u32, pub u32, pub u32);

impl Clock for FixedClock {
    fn now(&self) -> (i32, u32, u32, u32, u32) {
        (self.0, self.1, self.2, self.3, self.4)
    }
}

/// Direction of travel through a door, per [`AuditRecord::direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Card presented to enter.
    In,
    /// Card presented to exit (or any code other than 'I').
    Out,
}

/// Classified incident code, field 4 of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incident {
    /// '0' — the door was opened normally.
    Open,
    /// '2' — the card presented was invalid.
    Invalid,
    /// '3' — access was denied.
    AccessDenied,
    /// '4' — the card had expired.
    Expired,
    /// '5' — anti-passback rule triggered.
    AntiPassback,
    /// Any byte not in the known set, carried through unchanged.
    Unknown(u8),
}

impl Incident {
    fn from_byte(b: u8) -> Self {
        match b {
            b'0' => Incident::Open,
            b'2' => Incident::Invalid,
            b'3' => Incident::AccessDenied,
            b'4' => Incident::Expired,
            b'5' => Incident::AntiPassback,
            other => Incident::Unknown(other),
        }
    }
}

/// A view over a Message returned by the audit-trail fetcher. See §3 of the specification for the
/// field layout.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    message: Message,
}

impl AuditRecord {
    /// Wraps `message` as an audit record view without validating field count; malformed records
    /// (too few fields) surface a [`DecodeError`] only when a specific accessor is called, mirroring
    /// the original source's lazy field access.
    pub fn new(message: Message) -> Self {
        Self { message }
    }

    /// The underlying [`Message`].
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// `true` if field 0 is the peer-side error tag ("WE").
    pub fn is_error(&self) -> bool {
        self.message.fields.first().map(Vec::as_slice) == Some(ERROR_TAG.as_bytes())
    }

    /// `true` if field 0 is the end-of-trail sentinel ("WO"). Note the docstring/code mismatch
    /// flagged in the specification's Open Questions: this crate follows the code, i.e. "WO", not
    /// the set `{WF, WN, WR}` a stale docstring in the original source suggested.
    pub fn is_end_of_trail(&self) -> bool {
        self.message.fields.first().map(Vec::as_slice) == Some(END_OF_TRAIL_TAG.as_bytes())
    }

    /// `true` if this record terminates the fetch loop: either an error or the end of the trail.
    pub fn is_terminal(&self) -> bool {
        self.is_error() || self.is_end_of_trail()
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

    /// Door identifier, field 1.
    pub fn door(&self) -> Result<String, DecodeError> {
        Ok(self.field(1)?.iter().map(|&b| b as char).collect())
    }

    /// Incident code, field 4.
    pub fn incident(&self) -> Result<Incident, DecodeError> {
        let field = self.field(4)?;
        let byte = *field.first().ok_or(DecodeError::UnexpectedFieldCount {
            expected: 1,
            got: 0,
        })?;
        Ok(Incident::from_byte(byte))
    }

    /// Direction of travel, field 5: 'I' is [`Direction::In`], anything else is [`Direction::Out`].
    pub fn direction(&self) -> Result<Direction, DecodeError> {
        let field = self.field(5)?;
        Ok(if field.first() == Some(&b'I') {
            Direction::In
        } else {
            Direction::Out
        })
    }

    /// `true` if field 6 is the fixed 8-character "STAFF   " marker.
    pub fn is_staff(&self) -> Result<bool, DecodeError> {
        Ok(self.field(6)? == b"STAFF   ")
    }

    /// `true` if field 6 is entirely blank (a "special" card with no identification).
    pub fn is_special(&self) -> Result<bool, DecodeError> {
        Ok(self.field(6)?.iter().all(|&b| b == b' '))
    }

    /// Copy-number tag, field 7 (two characters, one of `#0 #1 #2 #D @1 S1 S2 S3`).
    pub fn copy_number(&self) -> Result<String, DecodeError> {
        Ok(self.field(7)?.iter().map(|&b| b as char).collect())
    }

    /// Staff user name, field 8, present only for staff records.
    pub fn user_name(&self) -> Option<String> {
        self.message
            .fields
            .get(8)
            .map(|f| f.iter().map(|&b| b as char).collect())
    }

    /// Parses the record's date (field 2, `dd/mm` or `mm/dd`) and time (field 3, `HH:MM`) into a
    /// full `(year, month, day, hour, minute)`, inferring the year relative to `clock`: the current
    /// year, rolled back one if that would place the record in the future.
    pub fn datetime(&self, day_first: bool, clock: &dyn Clock) -> Result<DateTime, DecodeError> {
        let date_field = self.field(2)?;
        let time_field = self.field(3)?;

        let date_str: String = date_field.iter().map(|&b| b as char).collect();
        let time_str: String = time_field.iter().map(|&b| b as char).collect();

        let (a, b) = date_str
            .split_once('/')
            .ok_or_else(|| DecodeError::MalformedDatetime(date_str.clone()))?;
        let (day, month) = if day_first { (a, b) } else { (b, a) };
        let day: u32 = day
            .parse()
            .map_err(|_| DecodeError::MalformedDatetime(date_str.clone()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| DecodeError::MalformedDatetime(date_str.clone()))?;

        let (hour, minute) = time_str
            .split_once(':')
            .ok_or_else(|| DecodeError::MalformedDatetime(time_str.clone()))?;
        let hour: u32 = hour
            .parse()
            .map_err(|_| DecodeError::MalformedDatetime(time_str.clone()))?;
        let minute: u32 = minute
            .parse()
            .map_err(|_| DecodeError::MalformedDatetime(time_str.clone()))?;

        let (now_year, now_month, now_day, now_hour, now_minute) = clock.now();
        let mut year = now_year;

        let candidate = (year, month, day, hour, minute);
        let now = (now_year, now_month, now_day, now_hour, now_minute);
        if candidate > now {
            year -= 1;
        }

        Ok(DateTime {
            year,
            month,
            day,
            hour,
            minute,
        })
    }
}

/// A fully resolved audit-record timestamp, year included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

/// Runs the audit-trail dialog for `door` on a single connection: seed with "WF", paginate with
/// "WN", and stop on the first error or end-of-trail record (which is always included in the
/// result).
pub fn fetch(client: &Client, door: &str) -> Result<Vec<AuditRecord>, Error> {
    let mut conn: TcpStream = client.create_connection()?;
    let mut records = Vec::new();

    let mut request = Message::from_fields(vec![b"WF".to_vec(), Message::encode_str(door)]);

    loop {
        let response = client.send_on(&mut conn, &request)?;
        if !response.is_framed() {
            return Err(Error::InvalidAcknowledgement(0));
        }
        let message = response.message();

        let record = AuditRecord::new(message);
        let terminal = record.is_terminal();
        records.push(record);

        if terminal {
            break;
        }

        request = Message::from_fields(vec![b"WN".to_vec(), Message::encode_str(door)]);
    }

    Ok(records)
}

/// Converts a Unix timestamp to `(year, month, day, hour, minute)` in UTC, using the standard
/// civil-from-days algorithm (Howard Hinnant's `civil_from_days`).
fn civil_from_unix(secs: u64) -> (i32, u32, u32, u32, u32) {
    let days = (secs / 86400) as i64;
    let rem = (secs % 86400) as u32;
    let hour = rem / 3600;
    let minute = (rem % 3600) / 60;

    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if m <= 2 { y + 1 } else { y } as i32;

    (year, m, d, hour, minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{ACK, ETX, STX};
    use crate::transport::Endpoint;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn framed_bytes(msg: &Message) -> Vec<u8> {
        let payload = msg.encode();
        let lrc = crate::framing::lrc_compute(&payload);
        let mut out = vec![STX];
        out.extend_from_slice(&payload);
        out.push(ETX);
        out.push(lrc);
        out
    }

    #[test]
    fn year_rolls_back_when_candidate_is_in_the_future() {
        let record = AuditRecord::new(Message::from_fields(vec![
            b"WI".to_vec(),
            b"101".to_vec(),
            b"31/12".to_vec(),
            b"10:00".to_vec(),
            b"0".to_vec(),
            b"I".to_vec(),
        ]));
        let clock = FixedClock(2024, 1, 15, 12, 0);
        let dt = record.datetime(true, &clock).unwrap();
        assert_eq!(dt.year, 2023);
        assert_eq!((dt.month, dt.day, dt.hour, dt.minute), (12, 31, 10, 0));
    }

    #[test]
    fn year_stays_current_when_candidate_is_in_the_past() {
        let record = AuditRecord::new(Message::from_fields(vec![
            b"WI".to_vec(),
            b"101".to_vec(),
            b"01/01".to_vec(),
            b"10:00".to_vec(),
            b"0".to_vec(),
            b"I".to_vec(),
        ]));
        let clock = FixedClock(2024, 6, 1, 12, 0);
        let dt = record.datetime(true, &clock).unwrap();
        assert_eq!(dt.year, 2024);
    }

    #[test]
    fn mm_dd_format_swaps_day_and_month() {
        let record = AuditRecord::new(Message::from_fields(vec![
            b"WI".to_vec(),
            b"101".to_vec(),
            b"03/07".to_vec(),
            b"10:00".to_vec(),
            b"0".to_vec(),
            b"I".to_vec(),
        ]));
        let clock = FixedClock(2024, 8, 1, 0, 0);
        let dt = record.datetime(false, &clock).unwrap();
        assert_eq!((dt.month, dt.day), (3, 7));
    }

    #[test]
    fn staff_and_special_markers_classify() {
        let staff = AuditRecord::new(Message::from_fields(vec![
            b"WI".to_vec(),
            b"101".to_vec(),
            b"01/01".to_vec(),
            b"00:00".to_vec(),
            b"0".to_vec(),
            b"I".to_vec(),
            b"STAFF   ".to_vec(),
        ]));
        assert!(staff.is_staff().unwrap());
        assert!(!staff.is_special().unwrap());

        let special = AuditRecord::new(Message::from_fields(vec![
            b"WI".to_vec(),
            b"101".to_vec(),
            b"01/01".to_vec(),
            b"00:00".to_vec(),
            b"0".to_vec(),
            b"I".to_vec(),
            b"        ".to_vec(),
        ]));
        assert!(special.is_special().unwrap());
        assert!(!special.is_staff().unwrap());
    }

    #[test]
    fn fetch_paginates_until_end_of_trail_on_one_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let client = Client::new(
            Endpoint {
                host: "127.0.0.1".to_string(),
                port,
            },
            false,
        );

        let server = std::thread::spawn(move || {
            let mut conn = listener.accept().unwrap().0;

            // WF
            let mut buf = vec![0u8; 256];
            let n = conn.read(&mut buf).unwrap();
            assert!(n > 0);
            conn.write_all(&[ACK]).unwrap();
            let rec1 = Message::from_fields(vec![b"WI".to_vec(), b"101".to_vec()]);
            conn.write_all(&framed_bytes(&rec1)).unwrap();

            // WN #1
            let n = conn.read(&mut buf).unwrap();
            assert!(n > 0);
            conn.write_all(&[ACK]).unwrap();
            let rec2 = Message::from_fields(vec![b"WI".to_vec(), b"102".to_vec()]);
            conn.write_all(&framed_bytes(&rec2)).unwrap();

            // WN #2: end of trail
            let n = conn.read(&mut buf).unwrap();
            assert!(n > 0);
            conn.write_all(&[ACK]).unwrap();
            let rec3 = Message::from_fields(vec![b"WO".to_vec()]);
            conn.write_all(&framed_bytes(&rec3)).unwrap();

            // No further reads should arrive.
            conn.set_read_timeout(Some(std::time::Duration::from_millis(200)))
                .unwrap();
            let extra = conn.read(&mut buf);
            assert!(matches!(extra, Ok(0) | Err(_)));
        });

        let records = fetch(&client, "101").unwrap();
        server.join().unwrap();

        assert_eq!(records.len(), 3);
        assert!(!records[0].is_terminal());
        assert!(!records[1].is_terminal());
        assert!(records[2].is_end_of_trail());
    }
}
