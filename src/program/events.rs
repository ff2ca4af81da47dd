//! Program log events.
//!
//! The margin program emits anchor events as base64 payloads on
//! `Program data: ` lines (older deployments used `Program log: `). Each
//! payload starts with an 8-byte event discriminator followed by the borsh
//! encoded fields.
//!
//! [`EventStream`] decodes a transaction's log lines lazily, in emission
//! order. It is `Clone`, so a first-match search never consumes the
//! caller's stream.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use solana_pubkey::Pubkey;

use crate::program::constants::event;
use crate::program::error::{SdkError, SdkResult};

const PROGRAM_DATA_PREFIX: &str = "Program data: ";
const PROGRAM_LOG_PREFIX: &str = "Program log: ";

// ============================================================================
// Event payloads
// ============================================================================

/// Collateral deposited into a margin account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositLog {
    pub col_index: u8,
    /// Native units of the collateral mint
    pub deposit_amount: u64,
    pub margin_key: Pubkey,
}

/// Collateral withdrawn from a margin account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawLog {
    pub col_index: u8,
    /// Native units of the collateral mint
    pub withdraw_amount: u64,
    pub margin_key: Pubkey,
}

/// Fill summary emitted for every perp order placement.
///
/// Longs pay quote and receive base, shorts pay base and receive quote.
/// Quantities are zero when nothing crossed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealizedPnlLog {
    pub market_key: Pubkey,
    pub margin: Pubkey,
    pub is_long: bool,
    /// Native quote units
    pub pnl: i64,
    pub qty_paid: i64,
    pub qty_received: i64,
}

impl RealizedPnlLog {
    /// Base quantity filled, native units.
    pub fn base_filled(&self) -> u64 {
        let qty = if self.is_long {
            self.qty_received
        } else {
            self.qty_paid
        };
        qty.unsigned_abs()
    }

    /// Quote quantity exchanged, native units.
    pub fn quote_filled(&self) -> u64 {
        let qty = if self.is_long {
            self.qty_paid
        } else {
            self.qty_received
        };
        qty.unsigned_abs()
    }
}

/// A decoded program event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Deposit(DepositLog),
    Withdraw(WithdrawLog),
    RealizedPnl(RealizedPnlLog),
    /// Event this crate does not decode
    Unknown { discriminator: [u8; 8] },
}

// ============================================================================
// Decoding
// ============================================================================

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.offset..self.offset + N)?;
        self.offset += N;
        let mut arr = [0u8; N];
        arr.copy_from_slice(bytes);
        Some(arr)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|b| b[0])
    }

    fn bool(&mut self) -> Option<bool> {
        self.u8().map(|b| b != 0)
    }

    fn u64(&mut self) -> Option<u64> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    fn i64(&mut self) -> Option<i64> {
        self.take::<8>().map(i64::from_le_bytes)
    }

    fn pubkey(&mut self) -> Option<Pubkey> {
        self.take::<32>().map(Pubkey::new_from_array)
    }
}

/// Decode one event payload (discriminator included).
pub fn decode_event(payload: &[u8]) -> Option<LogEvent> {
    let mut r = Reader::new(payload);
    let discriminator = r.take::<8>()?;

    let event = match discriminator {
        event::DEPOSIT_LOG => LogEvent::Deposit(DepositLog {
            col_index: r.u8()?,
            deposit_amount: r.u64()?,
            margin_key: r.pubkey()?,
        }),
        event::WITHDRAW_LOG => LogEvent::Withdraw(WithdrawLog {
            col_index: r.u8()?,
            withdraw_amount: r.u64()?,
            margin_key: r.pubkey()?,
        }),
        event::REALIZED_PNL_LOG => LogEvent::RealizedPnl(RealizedPnlLog {
            market_key: r.pubkey()?,
            margin: r.pubkey()?,
            is_long: r.bool()?,
            pnl: r.i64()?,
            qty_paid: r.i64()?,
            qty_received: r.i64()?,
        }),
        other => LogEvent::Unknown {
            discriminator: other,
        },
    };
    Some(event)
}

/// Decode a single log line, if it carries an event.
pub fn parse_log_line(line: &str) -> Option<LogEvent> {
    let encoded = line
        .strip_prefix(PROGRAM_DATA_PREFIX)
        .or_else(|| line.strip_prefix(PROGRAM_LOG_PREFIX))?;
    let payload = STANDARD.decode(encoded.trim()).ok()?;
    if payload.len() < 8 {
        return None;
    }
    let decoded = decode_event(&payload);
    if decoded.is_none() {
        tracing::warn!(line, "Truncated program event payload");
    }
    decoded
}

// ============================================================================
// Event stream
// ============================================================================

/// Lazy, restartable sequence of events decoded from transaction logs
#[derive(Debug, Clone)]
pub struct EventStream<'a> {
    lines: std::slice::Iter<'a, String>,
}

impl<'a> EventStream<'a> {
    pub fn new(logs: &'a [String]) -> Self {
        Self { lines: logs.iter() }
    }

    /// First event of type `T` from the current position, without consuming `self`.
    pub fn first<T: ExpectedEvent>(&self) -> Option<T> {
        self.clone().find_map(T::from_event)
    }

    /// Like [`first`](Self::first) but a missing event is an error.
    pub fn expect<T: ExpectedEvent>(&self, signature: &str) -> SdkResult<T> {
        self.first::<T>().ok_or_else(|| {
            tracing::error!(signature, expected = T::NAME, "Confirmed transaction is missing expected event");
            SdkError::MissingExpectedEvent {
                signature: signature.to_string(),
                expected: T::NAME,
            }
        })
    }
}

impl Iterator for EventStream<'_> {
    type Item = LogEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.by_ref().find_map(|line| parse_log_line(line))
    }
}

/// An event kind an action waits for
pub trait ExpectedEvent: Sized {
    const NAME: &'static str;
    fn from_event(event: LogEvent) -> Option<Self>;
}

impl ExpectedEvent for DepositLog {
    const NAME: &'static str = "DepositLog";

    fn from_event(event: LogEvent) -> Option<Self> {
        match event {
            LogEvent::Deposit(e) => Some(e),
            _ => None,
        }
    }
}

impl ExpectedEvent for WithdrawLog {
    const NAME: &'static str = "WithdrawLog";

    fn from_event(event: LogEvent) -> Option<Self> {
        match event {
            LogEvent::Withdraw(e) => Some(e),
            _ => None,
        }
    }
}

impl ExpectedEvent for RealizedPnlLog {
    const NAME: &'static str = "RealizedPnlLog";

    fn from_event(event: LogEvent) -> Option<Self> {
        match event {
            LogEvent::RealizedPnl(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// Encoders for log fixtures
// ============================================================================

/// Encode a `WithdrawLog` as a `Program data:` line.
pub fn withdraw_log_line(log: &WithdrawLog) -> String {
    let mut payload = event::WITHDRAW_LOG.to_vec();
    payload.push(log.col_index);
    payload.extend_from_slice(&log.withdraw_amount.to_le_bytes());
    payload.extend_from_slice(log.margin_key.as_ref());
    format!("{}{}", PROGRAM_DATA_PREFIX, STANDARD.encode(payload))
}

/// Encode a `DepositLog` as a `Program data:` line.
pub fn deposit_log_line(log: &DepositLog) -> String {
    let mut payload = event::DEPOSIT_LOG.to_vec();
    payload.push(log.col_index);
    payload.extend_from_slice(&log.deposit_amount.to_le_bytes());
    payload.extend_from_slice(log.margin_key.as_ref());
    format!("{}{}", PROGRAM_DATA_PREFIX, STANDARD.encode(payload))
}

/// Encode a `RealizedPnlLog` as a `Program data:` line.
pub fn realized_pnl_log_line(log: &RealizedPnlLog) -> String {
    let mut payload = event::REALIZED_PNL_LOG.to_vec();
    payload.extend_from_slice(log.market_key.as_ref());
    payload.extend_from_slice(log.margin.as_ref());
    payload.push(log.is_long as u8);
    payload.extend_from_slice(&log.pnl.to_le_bytes());
    payload.extend_from_slice(&log.qty_paid.to_le_bytes());
    payload.extend_from_slice(&log.qty_received.to_le_bytes());
    format!("{}{}", PROGRAM_DATA_PREFIX, STANDARD.encode(payload))
}
