//! hash and MAC primitives of the derivation scheme
//!
//! * `h512`: BLAKE2b with a 64 bytes digest, used for key expansion,
//!   nonce derivation and the signature challenge;
//! * `h256`: SHA-256, only used to derive the root chain code;
//! * `fk`: HMAC-SHA512, the pseudo random function of every child derivation.
//!
//! All functions take their message as a list of parts which are hashed
//! as if they had been concatenated. This keeps secret material out of
//! temporary buffers.
use std::{fmt, result};

use cryptoxide::blake2b::Blake2b;
use cryptoxide::digest::Digest;
use cryptoxide::hmac::Hmac;
use cryptoxide::mac::Mac;
use cryptoxide::sha2::{Sha256, Sha512};

use crate::util::hex;

pub const H512_SIZE: usize = 64;
pub const H256_SIZE: usize = 32;
pub const HASH_SIZE: usize = 32;

/// BLAKE2b-512 of the concatenation of `parts`
pub fn h512(parts: &[&[u8]]) -> [u8; H512_SIZE] {
    let mut b2b = Blake2b::new(H512_SIZE);
    for part in parts {
        Digest::input(&mut b2b, part);
    }
    let mut out = [0u8; H512_SIZE];
    Digest::result(&mut b2b, &mut out);
    out
}

/// SHA-256 of the concatenation of `parts`
pub fn h256(parts: &[&[u8]]) -> [u8; H256_SIZE] {
    let mut sha = Sha256::new();
    for part in parts {
        sha.input(part);
    }
    let mut out = [0u8; H256_SIZE];
    sha.result(&mut out);
    out
}

/// HMAC-SHA512 keyed with `key` over the concatenation of `parts`
pub fn fk(parts: &[&[u8]], key: &[u8]) -> [u8; H512_SIZE] {
    let mut mac = Hmac::new(Sha512::new(), key);
    for part in parts {
        mac.input(part);
    }
    let mut out = [0u8; H512_SIZE];
    mac.raw_result(&mut out);
    mac.reset();
    out
}

/// BLAKE2b with an arbitrary (short) digest size, written in `out`
pub(crate) fn blake2b_into(input: &[u8], out: &mut [u8]) {
    let mut b2b = Blake2b::new(out.len());
    Digest::input(&mut b2b, input);
    Digest::result(&mut b2b, out);
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Error {
    InvalidHashSize(usize),
    HexadecimalError(hex::Error),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidHashSize(sz) => {
                write!(f, "invalid hash size, expected {} but received {} bytes.", HASH_SIZE, sz)
            }
            Error::HexadecimalError(err) => write!(f, "invalid hexadecimal input: {}", err),
        }
    }
}
impl ::std::error::Error for Error {}
impl From<hex::Error> for Error {
    fn from(e: hex::Error) -> Error {
        Error::HexadecimalError(e)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Blake2b 256 bits, the block hash of the Nano ledger
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
pub struct Blake2b256([u8; HASH_SIZE]);
impl Blake2b256 {
    pub fn new(buf: &[u8]) -> Self {
        let mut out = [0; HASH_SIZE];
        blake2b_into(buf, &mut out);
        Self::from_bytes(out)
    }

    pub fn zero() -> Self {
        Blake2b256([0; HASH_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
    pub fn into_bytes(self) -> [u8; HASH_SIZE] {
        self.0
    }

    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Blake2b256(bytes)
    }
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HASH_SIZE {
            return Err(Error::InvalidHashSize(bytes.len()));
        }
        let mut buf = [0; HASH_SIZE];
        buf.copy_from_slice(bytes);
        Ok(Self::from_bytes(buf))
    }
    pub fn from_hex<S: AsRef<str>>(hex: &S) -> Result<Self> {
        let bytes = hex::decode(hex.as_ref())?;
        Self::from_slice(&bytes)
    }
}
impl AsRef<[u8]> for Blake2b256 {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
impl fmt::Debug for Blake2b256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..]))
    }
}
impl fmt::Display for Blake2b256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..]))
    }
}
impl ::std::str::FromStr for Blake2b256 {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(&s)
    }
}
impl serde::Serialize for Blake2b256 {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode_upper(self.as_ref()))
        } else {
            serializer.serialize_bytes(self.as_ref())
        }
    }
}
struct HashVisitor;
impl<'de> serde::de::Visitor<'de> for HashVisitor {
    type Value = Blake2b256;

    fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Expecting a Blake2b_256 hash (`Hash`)")
    }

    fn visit_str<E>(self, v: &str) -> result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match Self::Value::from_hex(&v) {
            Err(Error::HexadecimalError(err)) => Err(E::custom(format!("{}", err))),
            Err(Error::InvalidHashSize(sz)) => Err(E::invalid_length(sz, &"32 bytes")),
            Ok(h) => Ok(h),
        }
    }

    fn visit_bytes<E>(self, v: &[u8]) -> result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match Self::Value::from_slice(v) {
            Err(Error::InvalidHashSize(sz)) => Err(E::invalid_length(sz, &"32 bytes")),
            Err(err) => Err(E::custom(format!("unexpected error: {}", err))),
            Ok(h) => Ok(h),
        }
    }
}
impl<'de> serde::Deserialize<'de> for Blake2b256 {
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(HashVisitor)
        } else {
            deserializer.deserialize_bytes(HashVisitor)
        }
    }
}
