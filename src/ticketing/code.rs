//! Deterministic ticket codes.
//!
//! A code has the form `TKT-<eventId>-<HASH>-<unitIndex>` where `HASH` is
//! the uppercase base-36 rendering of a 64-bit FNV-1a hash over the
//! canonical string `orderId|eventId|ticketTypeId|unitIndex`. The same
//! inputs always produce the same code, which is what makes re-running
//! issuance for an order safe.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::error::CodeError;

pub const CODE_PREFIX: &str = "TKT";

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Longest base-36 rendering of a `u64`.
const MAX_HASH_LEN: usize = 13;

/// Derives the code for one unit of a line item.
pub fn generate(
    order_id: &str,
    event_id: i64,
    ticket_type_id: i64,
    unit_index: u32,
) -> Result<TicketCode, CodeError> {
    if order_id.trim().is_empty() {
        return Err(CodeError::InvalidInput("order id must not be empty".to_string()));
    }
    if event_id <= 0 {
        return Err(CodeError::InvalidInput(format!(
            "event id must be positive, got {}",
            event_id
        )));
    }
    if ticket_type_id <= 0 {
        return Err(CodeError::InvalidInput(format!(
            "ticket type id must be positive, got {}",
            ticket_type_id
        )));
    }

    let canonical = format!(
        "{}|{}|{}|{}",
        order_id, event_id, ticket_type_id, unit_index
    );
    let hash = to_base36(fnv1a_64(canonical.as_bytes()));

    Ok(TicketCode {
        text: format!("{}-{}-{}-{}", CODE_PREFIX, event_id, hash, unit_index),
        event_id,
        unit_index,
    })
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(MAX_HASH_LEN);
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    // Every byte comes from BASE36_DIGITS, which is ASCII.
    digits.into_iter().map(char::from).collect()
}

/// A well-formed ticket code.
///
/// Parsing is lenient about what gate staff type: surrounding whitespace
/// is dropped and letters are uppercased before the shape is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketCode {
    text: String,
    event_id: i64,
    unit_index: u32,
}

impl TicketCode {
    pub fn parse(input: &str) -> Result<Self, CodeError> {
        let normalized = input.trim().to_ascii_uppercase();
        let invalid = || {
            CodeError::InvalidInput(format!("'{}' is not a ticket code", input.trim()))
        };

        let mut parts = normalized.split('-');
        let (Some(prefix), Some(event), Some(hash), Some(index), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(invalid());
        };

        if prefix != CODE_PREFIX {
            return Err(invalid());
        }
        let event_id = parse_digits::<i64>(event).filter(|id| *id > 0).ok_or_else(invalid)?;
        if hash.is_empty()
            || hash.len() > MAX_HASH_LEN
            || !hash.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
        {
            return Err(invalid());
        }
        let unit_index = parse_digits::<u32>(index).ok_or_else(invalid)?;

        Ok(Self {
            text: normalized,
            event_id,
            unit_index,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    pub fn unit_index(&self) -> u32 {
        self.unit_index
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Digits only: no sign, no whitespace.
fn parse_digits<T: FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for TicketCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TicketCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
