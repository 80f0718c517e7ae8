//! Single-byte text mapping
//!
//! Control receivers treat every byte as one character (ISO-8859-1). Using a
//! multi-byte encoding here would break binary transparency for control
//! characters and high bytes, so text crosses the wire one byte per `char`.

use std::fmt::Write;

/// Replacement byte for characters above U+00FF
pub const REPLACEMENT: u8 = b'?';

/// Decode bytes one-to-one into characters (byte value = code point)
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a string one byte per character
///
/// Characters outside U+0000..=U+00FF have no single-byte form and become
/// [`REPLACEMENT`].
pub fn encode(text: &str) -> Vec<u8> {
    encode_chars(text.chars())
}

/// Encode a character sequence one byte per character
pub fn encode_chars<I>(chars: I) -> Vec<u8>
where
    I: IntoIterator<Item = char>,
{
    chars.into_iter().map(char_to_byte).collect()
}

/// Number of bytes [`encode`] produces for `text`
pub fn encoded_len(text: &str) -> usize {
    text.chars().count()
}

/// Single-byte form of `c`, or [`REPLACEMENT`]
pub(crate) fn char_to_byte(c: char) -> u8 {
    u8::try_from(u32::from(c)).unwrap_or(REPLACEMENT)
}

/// Render control characters as bracketed two-digit hex, e.g. `\r` → `[0D]`
///
/// Used for diagnostics only. Covers the C0 range, DEL and the C1 range.
///
/// # Examples
///
/// ```
/// use xsig_link::protocol::latin1::escape_control;
///
/// assert_eq!(escape_control(b"cgp 1\r\n"), "cgp 1[0D][0A]");
/// ```
pub fn escape_control(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        let c = b as char;
        if c.is_control() {
            let _ = write!(out, "[{:02X}]", b);
        } else {
            out.push(c);
        }
    }
    out
}
