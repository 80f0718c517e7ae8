//! XSig signal codec
//!
//! Encodes digital, analog and serial signal changes into the byte frames
//! understood by symbol-addressed control receivers (intersystem
//! communication symbols).
//!
//! # Frame layout
//!
//! ```text
//! digital  (2 bytes)  1 0 c i i i i i | 0 a a a a a a a
//! analog   (4 bytes)  1 1 v v 0 i i i | 0 a a a a a a a | 0 v v v v v v v | 0 v v v v v v v
//! serial   (n + 3)    1 1 0 0 1 i i i | 0 a a a a a a a | payload ... | 0xFF
//! ```
//!
//! `c` is the inverted digital value (set = off), `i` the high index bits
//! (`index >> 7`) and `a` the low address bits, stored as `(index - 1) & 0x7F`.
//! That byte wraps to `0x7F` for index 0, which receivers expect.
//!
//! Indexing is zero-based and scoped per signal type.

use crate::error::{CommError, Result};
use crate::protocol::latin1;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Highest valid digital index (12 address bits)
pub const MAX_DIGITAL_INDEX: i32 = 4095;

/// Highest valid analog index (10 address bits)
pub const MAX_ANALOG_INDEX: i32 = 1023;

/// Highest valid serial index (10 address bits)
pub const MAX_SERIAL_INDEX: i32 = 1023;

/// Fixed frame length of a digital signal
pub const DIGITAL_FRAME_LEN: usize = 2;

/// Fixed frame length of an analog signal
pub const ANALOG_FRAME_LEN: usize = 4;

/// Serial frame overhead (two header bytes plus terminator)
pub const SERIAL_FRAME_OVERHEAD: usize = 3;

/// Serial payload terminator
pub const SERIAL_TERMINATOR: u8 = 0xFF;

/// Control byte that forces all receiver outputs to zero
pub const CLEAR_OUTPUTS: u8 = 0xFC;

/// Control byte that asks the receiver to retransmit all non-zero outputs
pub const SEND_STATUS: u8 = 0xFD;

/// Signal type, each with its own index address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Boolean signal
    Digital,
    /// 16-bit unsigned signal
    Analog,
    /// Text signal
    Serial,
}

impl SignalKind {
    /// Highest valid index for this signal type
    pub fn max_index(self) -> i32 {
        match self {
            SignalKind::Digital => MAX_DIGITAL_INDEX,
            SignalKind::Analog => MAX_ANALOG_INDEX,
            SignalKind::Serial => MAX_SERIAL_INDEX,
        }
    }

    /// Reject `index` unless it lies in `0..=max_index()`
    pub fn check_index(self, index: i32) -> Result<()> {
        let max = self.max_index();
        if (0..=max).contains(&index) {
            Ok(())
        } else {
            Err(CommError::InvalidIndex {
                kind: self,
                index,
                max,
            })
        }
    }

    fn check_run(self, start: i32, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        self.check_index(start)?;
        let last = i64::from(start) + len as i64 - 1;
        if last > i64::from(self.max_index()) {
            return Err(CommError::InvalidIndex {
                kind: self,
                index: i32::try_from(last).unwrap_or(i32::MAX),
                max: self.max_index(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalKind::Digital => "digital",
            SignalKind::Analog => "analog",
            SignalKind::Serial => "serial",
        })
    }
}

/// A typed signal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Digital (on/off) value
    Digital(bool),
    /// Analog value
    Analog(u16),
    /// Serial (text) value
    Serial(String),
}

impl Signal {
    /// Signal type of this value
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::Digital(_) => SignalKind::Digital,
            Signal::Analog(_) => SignalKind::Analog,
            Signal::Serial(_) => SignalKind::Serial,
        }
    }

    /// Encoded frame length of this value
    pub fn frame_len(&self) -> usize {
        match self {
            Signal::Digital(_) => DIGITAL_FRAME_LEN,
            Signal::Analog(_) => ANALOG_FRAME_LEN,
            Signal::Serial(text) => latin1::encoded_len(text) + SERIAL_FRAME_OVERHEAD,
        }
    }
}

impl From<bool> for Signal {
    fn from(value: bool) -> Self {
        Signal::Digital(value)
    }
}

impl From<u16> for Signal {
    fn from(value: u16) -> Self {
        Signal::Analog(value)
    }
}

impl From<&str> for Signal {
    fn from(value: &str) -> Self {
        Signal::Serial(value.to_string())
    }
}

impl From<String> for Signal {
    fn from(value: String) -> Self {
        Signal::Serial(value)
    }
}

#[inline]
fn high_bits(index: i32) -> u8 {
    (index >> 7) as u8
}

#[inline]
fn address_byte(index: i32) -> u8 {
    ((index - 1) & 0x7F) as u8
}

fn put_digital(buf: &mut BytesMut, index: i32, value: bool) {
    let off = if value { 0 } else { 0x20 };
    buf.put_u8(0x80 | off | high_bits(index));
    buf.put_u8(address_byte(index));
}

fn put_analog(buf: &mut BytesMut, index: i32, value: u16) {
    buf.put_u8(0xC0 | ((value & 0xC000) >> 10) as u8 | high_bits(index));
    buf.put_u8(address_byte(index));
    buf.put_u8(((value & 0x3F80) >> 7) as u8);
    buf.put_u8((value & 0x7F) as u8);
}

fn put_serial(buf: &mut BytesMut, index: i32, value: &str) {
    buf.put_u8(0xC8 | high_bits(index));
    buf.put_u8(address_byte(index));
    buf.extend(value.chars().map(latin1::char_to_byte));
    buf.put_u8(SERIAL_TERMINATOR);
}

/// Encode a single digital signal
///
/// # Errors
///
/// [`CommError::InvalidIndex`] when `index` is outside `0..=4095`.
///
/// # Examples
///
/// ```
/// use xsig_link::protocol::xsig::encode_digital;
///
/// assert_eq!(&encode_digital(0, true)?[..], &[0x80, 0x7F]);
/// assert_eq!(&encode_digital(1, false)?[..], &[0xA0, 0x00]);
/// # Ok::<(), xsig_link::CommError>(())
/// ```
pub fn encode_digital(index: i32, value: bool) -> Result<Bytes> {
    SignalKind::Digital.check_index(index)?;
    let mut buf = BytesMut::with_capacity(DIGITAL_FRAME_LEN);
    put_digital(&mut buf, index, value);
    Ok(buf.freeze())
}

/// Encode a single analog signal
///
/// # Errors
///
/// [`CommError::InvalidIndex`] when `index` is outside `0..=1023`.
pub fn encode_analog(index: i32, value: u16) -> Result<Bytes> {
    SignalKind::Analog.check_index(index)?;
    let mut buf = BytesMut::with_capacity(ANALOG_FRAME_LEN);
    put_analog(&mut buf, index, value);
    Ok(buf.freeze())
}

/// Encode a single serial signal
///
/// The text is written one byte per character; characters above U+00FF are
/// replaced with `?`.
///
/// # Errors
///
/// [`CommError::InvalidIndex`] when `index` is outside `0..=1023`.
pub fn encode_serial(index: i32, value: &str) -> Result<Bytes> {
    SignalKind::Serial.check_index(index)?;
    let mut buf = BytesMut::with_capacity(latin1::encoded_len(value) + SERIAL_FRAME_OVERHEAD);
    put_serial(&mut buf, index, value);
    Ok(buf.freeze())
}

/// Encode any signal value
pub fn encode(index: i32, signal: &Signal) -> Result<Bytes> {
    match signal {
        Signal::Digital(value) => encode_digital(index, *value),
        Signal::Analog(value) => encode_analog(index, *value),
        Signal::Serial(value) => encode_serial(index, value),
    }
}

/// Encode a contiguous run of digital signals starting at `start`
///
/// The whole run is validated before any output is produced.
pub fn encode_digitals(start: i32, values: &[bool]) -> Result<Bytes> {
    SignalKind::Digital.check_run(start, values.len())?;
    let mut buf = BytesMut::with_capacity(values.len() * DIGITAL_FRAME_LEN);
    for (index, &value) in (start..).zip(values) {
        put_digital(&mut buf, index, value);
    }
    Ok(buf.freeze())
}

/// Encode a contiguous run of analog signals starting at `start`
pub fn encode_analogs(start: i32, values: &[u16]) -> Result<Bytes> {
    SignalKind::Analog.check_run(start, values.len())?;
    let mut buf = BytesMut::with_capacity(values.len() * ANALOG_FRAME_LEN);
    for (index, &value) in (start..).zip(values) {
        put_analog(&mut buf, index, value);
    }
    Ok(buf.freeze())
}

/// Encode a contiguous run of serial signals starting at `start`
pub fn encode_serials<S: AsRef<str>>(start: i32, values: &[S]) -> Result<Bytes> {
    SignalKind::Serial.check_run(start, values.len())?;
    let total: usize = values
        .iter()
        .map(|v| latin1::encoded_len(v.as_ref()) + SERIAL_FRAME_OVERHEAD)
        .sum();
    let mut buf = BytesMut::with_capacity(total);
    for (index, value) in (start..).zip(values) {
        put_serial(&mut buf, index, value.as_ref());
    }
    Ok(buf.freeze())
}

/// Frame that forces all receiver outputs to zero
pub fn clear_outputs() -> Bytes {
    Bytes::from_static(&[CLEAR_OUTPUTS])
}

/// Frame that asks the receiver to re-evaluate its inputs and retransmit
/// every digital, analog and serial signal that is not zero
pub fn send_status() -> Bytes {
    Bytes::from_static(&[SEND_STATUS])
}
