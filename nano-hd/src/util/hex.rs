//! hexadecimal encoding and decoding of key material
//!
//! Keys, chain codes and hashes are exchanged as lowercase hexadecimal.
//! Signatures and work values are shown uppercase, see [`encode_upper`].
//!
//! # Example
//!
//! ```
//! use nano_hd::util::hex::{encode, decode};
//!
//! let example = b"some bytes";
//!
//! assert!(example.as_ref() == decode(&encode(example)).unwrap().as_slice());
//! ```
//!
use std::{error, fmt, result};

const ALPHABET_LOWER: &[u8] = b"0123456789abcdef";
const ALPHABET_UPPER: &[u8] = b"0123456789ABCDEF";

/// hexadecimal decoding errors
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Error {
    /// a character is not part of the hexadecimal alphabet. Contains the
    /// index of the faulty byte in the input string.
    UnknownSymbol(usize),
    /// the input does not contain an even number of hexadecimal digits.
    /// Contains the number of digits found.
    OddLength(usize),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownSymbol(idx) => write!(f, "unknown symbol at byte index {}", idx),
            Error::OddLength(len) => write!(f, "odd number of hexadecimal digits ({})", len),
        }
    }
}
impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

fn encode_with(input: &[u8], alphabet: &[u8]) -> String {
    let mut s = String::with_capacity(input.len() * 2);
    for &byte in input.iter() {
        s.push(alphabet[(byte >> 4) as usize] as char);
        s.push(alphabet[(byte & 0xf) as usize] as char);
    }
    s
}

/// encode bytes into a lowercase hexadecimal string
///
/// ```
/// use nano_hd::util::hex::encode;
///
/// assert_eq!("736f6d65206279746573", encode(b"some bytes"));
/// ```
pub fn encode(input: &[u8]) -> String {
    encode_with(input, ALPHABET_LOWER)
}

/// encode bytes into an uppercase hexadecimal string
pub fn encode_upper(input: &[u8]) -> String {
    encode_with(input, ALPHABET_UPPER)
}

/// decode the given hexadecimal string, either case is accepted.
///
/// Surrounding whitespace is ignored, whitespace between digits is not.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let input = input.trim();
    let mut out = Vec::with_capacity(input.len() / 2);
    let mut buf = 0u8;
    let mut digits = 0usize;

    for (idx, byte) in input.bytes().enumerate() {
        let nibble = match byte {
            b'A'..=b'F' => byte - b'A' + 10,
            b'a'..=b'f' => byte - b'a' + 10,
            b'0'..=b'9' => byte - b'0',
            _ => return Err(Error::UnknownSymbol(idx)),
        };
        buf = (buf << 4) | nibble;
        digits += 1;
        if digits % 2 == 0 {
            out.push(buf);
            buf = 0;
        }
    }

    if digits % 2 != 0 {
        return Err(Error::OddLength(digits));
    }
    Ok(out)
}
