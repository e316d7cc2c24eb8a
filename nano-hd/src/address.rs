//! Nano account addresses
//!
//! `<prefix>_<key><checksum>` where:
//!
//! * the prefix is `nano` or the legacy `xrb`;
//! * the key is the 256 bits public key preceded by 4 zero bits, written
//!   as 52 characters of 5 bits;
//! * the checksum is the BLAKE2b-40 digest of the key, byte-reversed,
//!   written as 8 characters of 5 bits.
//!
//! ```
//! use nano_hd::address::Address;
//!
//! let address: Address = "nano_3t6k35gi95xu6tergt6p69ck76ogmitsa8mnijtpxm9fkcm736xtoncuohr3"
//!     .parse()
//!     .unwrap();
//! assert_eq!(
//!     address.public_key().to_hex(),
//!     "e89208dd038fbb269987689621d52292ae9c35941a7484756ecced92a65093ba"
//! );
//! ```

use std::{error, fmt, result, str::FromStr};

use crate::hash::blake2b_into;
use crate::hdwallet::{PublicKey, PUBLIC_KEY_SIZE};

const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

const SEPARATOR: char = '_';
const KEY_CHARS: usize = 52;
const CHECKSUM_CHARS: usize = 8;
const CHECKSUM_SIZE: usize = 5;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    UnknownPrefix(String),
    /// the address (after the prefix) does not have 60 characters
    InvalidLength(usize),
    InvalidCharacter(char),
    /// the 4 bits before the key are not zero
    InvalidPadding,
    InvalidChecksum,
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownPrefix(p) => write!(f, "unknown address prefix `{}`", p),
            Error::InvalidLength(sz) => write!(
                f,
                "invalid address length, expected {} characters after the prefix, received {}",
                KEY_CHARS + CHECKSUM_CHARS,
                sz
            ),
            Error::InvalidCharacter(c) => write!(f, "invalid address character `{}`", c),
            Error::InvalidPadding => write!(f, "address does not encode a 256 bits key"),
            Error::InvalidChecksum => write!(f, "address checksum does not match"),
        }
    }
}
impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prefix {
    Nano,
    Xrb,
}
impl Prefix {
    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Nano => "nano",
            Prefix::Xrb => "xrb",
        }
    }
}
impl Default for Prefix {
    fn default() -> Self {
        Prefix::Nano
    }
}
impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Prefix {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nano" => Ok(Prefix::Nano),
            "xrb" => Ok(Prefix::Xrb),
            _ => Err(Error::UnknownPrefix(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    prefix: Prefix,
    public_key: PublicKey,
}
impl Address {
    pub fn new(prefix: Prefix, public_key: PublicKey) -> Self {
        Address { prefix, public_key }
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// same account, written with another prefix
    pub fn with_prefix(self, prefix: Prefix) -> Self {
        Address { prefix, ..self }
    }
}
impl From<PublicKey> for Address {
    fn from(public_key: PublicKey) -> Self {
        Address::new(Prefix::default(), public_key)
    }
}
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = String::with_capacity(5 + KEY_CHARS + CHECKSUM_CHARS);
        out.push_str(self.prefix.as_str());
        out.push(SEPARATOR);
        encode_into(self.public_key.as_ref(), 4, &mut out);
        encode_into(&checksum(self.public_key.as_ref()), 0, &mut out);
        f.write_str(&out)
    }
}
impl FromStr for Address {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let (prefix, body) = match s.find(SEPARATOR) {
            Some(i) => (&s[..i], &s[i + 1..]),
            None => return Err(Error::UnknownPrefix(s.to_owned())),
        };
        let prefix: Prefix = prefix.parse()?;

        let body = body.as_bytes();
        if body.len() != KEY_CHARS + CHECKSUM_CHARS {
            return Err(Error::InvalidLength(body.len()));
        }

        // 4 extra zero bits make it 33 whole bytes, the first one holding the padding
        let key = decode(&body[..KEY_CHARS], 4)?;
        if key[0] != 0 {
            return Err(Error::InvalidPadding);
        }
        let public_key = match PublicKey::from_slice(&key[1..]) {
            Ok(pk) => pk,
            Err(_) => return Err(Error::InvalidLength(body.len())),
        };

        let expected = decode(&body[KEY_CHARS..], 0)?;
        if expected[..] != checksum(public_key.as_ref())[..] {
            return Err(Error::InvalidChecksum);
        }
        Ok(Address { prefix, public_key })
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn checksum(public_key: &[u8]) -> [u8; CHECKSUM_SIZE] {
    assert!(public_key.len() == PUBLIC_KEY_SIZE);
    let mut out = [0u8; CHECKSUM_SIZE];
    blake2b_into(public_key, &mut out);
    out.reverse();
    out
}

/// write `bytes`, preceded by `pad` zero bits, 5 bits per character
fn encode_into(bytes: &[u8], pad: usize, out: &mut String) {
    debug_assert!((bytes.len() * 8 + pad) % 5 == 0);
    let mut acc: u32 = 0;
    let mut bits = pad;
    for b in bytes {
        acc = (acc << 8) | u32::from(*b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
        }
        acc &= (1 << bits) - 1;
    }
}

/// read 5 bits per character, preceded by `pad` zero bits, into whole bytes
fn decode(chars: &[u8], pad: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity((chars.len() * 5 + pad) / 8);
    let mut acc: u32 = 0;
    let mut bits = pad;
    for c in chars {
        let v = match ALPHABET.iter().position(|a| a == c) {
            Some(v) => v as u32,
            None => return Err(Error::InvalidCharacter(*c as char)),
        };
        acc = (acc << 5) | v;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
        acc &= (1 << bits) - 1;
    }
    Ok(out)
}
