//! Nano amounts, counted in raw
//!
//! 1 Nano is `10^30` raw. Amounts are read in Nano (decimal, up to 30
//! fractional digits) and written in raw, as the node RPC expects.

use std::{error, fmt, ops, result, str::FromStr};

/// number of raw in one Nano, `10^30`
pub const RAW_PER_NANO: u128 = 1_000_000_000_000_000_000_000_000_000_000;

const MAX_DECIMALS: usize = 30;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// not a decimal number of Nano
    InvalidAmount(String),
    /// more than 30 digits after the decimal point
    TooManyDecimals(usize),
    /// the amount does not fit in 128 bits of raw
    Overflow,
    /// the amount would become negative
    Underflow,
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidAmount(s) => write!(f, "invalid Nano amount `{}`", s),
            Error::TooManyDecimals(n) => write!(
                f,
                "Nano amounts have at most {} decimals, received {}",
                MAX_DECIMALS, n
            ),
            Error::Overflow => write!(f, "amount overflow"),
            Error::Underflow => write!(f, "amount underflow, balance cannot be negative"),
        }
    }
}
impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// an amount of raw, the smallest unit of Nano
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Raw(u128);
impl Raw {
    pub fn zero() -> Self {
        Raw(0)
    }

    pub fn new(raw: u128) -> Self {
        Raw(raw)
    }

    pub fn value(self) -> u128 {
        self.0
    }

    /// 16 bytes big-endian, as hashed in state blocks
    pub fn to_be_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    pub fn checked_add(self, other: Raw) -> Result<Raw> {
        self.0.checked_add(other.0).map(Raw).ok_or(Error::Overflow)
    }

    pub fn checked_sub(self, other: Raw) -> Result<Raw> {
        self.0.checked_sub(other.0).map(Raw).ok_or(Error::Underflow)
    }

    /// parse a decimal amount of Nano
    ///
    /// ```
    /// use nano_hd::coin::Raw;
    ///
    /// assert_eq!(Raw::from_nano("0.000001").unwrap().value(), 1_000_000_000_000_000_000_000_000);
    /// assert_eq!(Raw::from_nano("1").unwrap().to_string(), "1000000000000000000000000000000");
    /// ```
    pub fn from_nano(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidAmount(s.to_owned());

        let (integer, fraction) = match s.find('.') {
            Some(i) => (&s[..i], &s[i + 1..]),
            None => (s, ""),
        };
        if integer.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > MAX_DECIMALS {
            return Err(Error::TooManyDecimals(fraction.len()));
        }

        let mut raw: u128 = 0;
        for b in integer.bytes().chain(fraction.bytes()) {
            raw = raw
                .checked_mul(10)
                .and_then(|r| r.checked_add(u128::from(b - b'0')))
                .ok_or(Error::Overflow)?;
        }
        for _ in fraction.len()..MAX_DECIMALS {
            raw = raw.checked_mul(10).ok_or(Error::Overflow)?;
        }
        Ok(Raw(raw))
    }

    /// decimal amount of Nano, without trailing zeros
    pub fn to_nano_string(self) -> String {
        let integer = self.0 / RAW_PER_NANO;
        let fraction = self.0 % RAW_PER_NANO;
        if fraction == 0 {
            return integer.to_string();
        }
        let fraction = format!("{:030}", fraction);
        format!("{}.{}", integer, fraction.trim_end_matches('0'))
    }
}
impl From<u128> for Raw {
    fn from(raw: u128) -> Self {
        Raw(raw)
    }
}
impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl FromStr for Raw {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Raw::from_nano(s)
    }
}
impl ops::Add for Raw {
    type Output = Result<Raw>;
    fn add(self, other: Raw) -> Self::Output {
        self.checked_add(other)
    }
}
impl ops::Sub for Raw {
    type Output = Result<Raw>;
    fn sub(self, other: Raw) -> Self::Output {
        self.checked_sub(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nano_amounts() {
        assert_eq!(Raw::from_nano("0"), Ok(Raw::zero()));
        assert_eq!(Raw::from_nano("1"), Ok(Raw(RAW_PER_NANO)));
        assert_eq!(Raw::from_nano("1."), Ok(Raw(RAW_PER_NANO)));
        assert_eq!(Raw::from_nano(".5"), Ok(Raw(RAW_PER_NANO / 2)));
        assert_eq!(Raw::from_nano("0.000001"), Ok(Raw(10u128.pow(24))));
        assert_eq!(Raw::from_nano("0.000000000000000000000000000001"), Ok(Raw(1)));
        assert_eq!(
            Raw::from_nano("340282366.920938463463374607431768211455"),
            Ok(Raw(u128::max_value()))
        );
        assert_eq!(
            "133248297".parse::<Raw>(),
            Ok(Raw(133_248_297 * RAW_PER_NANO))
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Raw::from_nano(""), Err(Error::InvalidAmount("".to_owned())));
        assert_eq!(Raw::from_nano("."), Err(Error::InvalidAmount(".".to_owned())));
        assert_eq!(Raw::from_nano("-1"), Err(Error::InvalidAmount("-1".to_owned())));
        assert_eq!(Raw::from_nano("1.2.3"), Err(Error::InvalidAmount("1.2.3".to_owned())));
        assert_eq!(Raw::from_nano("1e5"), Err(Error::InvalidAmount("1e5".to_owned())));
        assert_eq!(
            Raw::from_nano("0.0000000000000000000000000000001"),
            Err(Error::TooManyDecimals(31))
        );
        // u128::MAX is about 3.4 * 10^8 Nano
        assert_eq!(Raw::from_nano("400000000"), Err(Error::Overflow));
    }

    #[test]
    fn display() {
        assert_eq!(Raw(10u128.pow(24)).to_string(), "1000000000000000000000000");
        assert_eq!(Raw(10u128.pow(24)).to_nano_string(), "0.000001");
        assert_eq!(Raw(RAW_PER_NANO * 3 / 2).to_nano_string(), "1.5");
        assert_eq!(Raw(RAW_PER_NANO * 2).to_nano_string(), "2");
        assert_eq!(Raw(1).to_nano_string(), "0.000000000000000000000000000001");
    }

    #[test]
    fn checked_arithmetic() {
        assert_eq!(Raw(5) + Raw(3), Ok(Raw(8)));
        assert_eq!(Raw(5) - Raw(3), Ok(Raw(2)));
        assert_eq!(Raw(3) - Raw(5), Err(Error::Underflow));
        assert_eq!(Raw(u128::max_value()) + Raw(1), Err(Error::Overflow));
    }

    #[test]
    fn big_endian_bytes() {
        let mut expected = [0u8; 16];
        expected[15] = 1;
        assert_eq!(Raw(1).to_be_bytes(), expected);
    }
}
