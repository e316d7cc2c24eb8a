//! Derivation paths, `/` separated child indices
//!
//! A segment ending with `'` is hardened (`n' = n + 2^31`). Empty segments
//! are skipped, so `""` and `"/"` both designate the root node.
//!
//! ```
//! use nano_hd::path::DerivationPath;
//!
//! let path: DerivationPath = "44'/165'/0".parse().unwrap();
//! assert_eq!(path.to_string(), "44'/165'/0");
//! assert_eq!(path.len(), 3);
//! ```

use std::{error, fmt, result, str::FromStr};

use crate::hdwallet::{self, ChildIndex, Derived, MasterSecret, Node, HARDENED_OFFSET};

const HARDENED_MARKER: char = '\'';

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// the segment is not a decimal number, optionally followed by `'`
    InvalidSegment(String),
    /// the segment's index is not within `[0, 2^32)`
    Index(hdwallet::Error),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidSegment(s) => write!(f, "invalid derivation path segment `{}`", s),
            Error::Index(e) => write!(f, "invalid derivation path index: {}", e),
        }
    }
}
impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Index(e) => Some(e),
            Error::InvalidSegment(_) => None,
        }
    }
}
impl From<hdwallet::Error> for Error {
    fn from(e: hdwallet::Error) -> Self {
        Error::Index(e)
    }
}

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath(Vec<ChildIndex>);
impl DerivationPath {
    pub fn new(indices: Vec<ChildIndex>) -> Self {
        DerivationPath(indices)
    }

    pub fn indices(&self) -> &[ChildIndex] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// the path of the parent and the index of the last segment, `None` for the root
    pub fn split_last(&self) -> Option<(DerivationPath, ChildIndex)> {
        self.0
            .split_last()
            .map(|(last, parent)| (DerivationPath(parent.to_vec()), *last))
    }

    /// apply the private child derivation of every segment, left to right.
    ///
    /// The first discarded step discards the whole path.
    pub fn derive(&self, root: &Node) -> hdwallet::Result<Derived<Node>> {
        let mut node = root.clone();
        for index in self.0.iter() {
            node = match node.private_child_key(*index)? {
                Derived::Accepted(child) => child,
                Derived::Discarded(d) => {
                    debug!("derivation path {} discarded at {}", self, index);
                    return Ok(Derived::Discarded(d));
                }
            };
        }
        Ok(Derived::Accepted(node))
    }
}
impl From<Vec<ChildIndex>> for DerivationPath {
    fn from(indices: Vec<ChildIndex>) -> Self {
        DerivationPath(indices)
    }
}
impl AsRef<[ChildIndex]> for DerivationPath {
    fn as_ref(&self) -> &[ChildIndex] {
        &self.0
    }
}
impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}
impl FromStr for DerivationPath {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let mut indices = Vec::new();
        for segment in s.split('/').filter(|s| !s.is_empty()) {
            let (digits, offset) = if segment.ends_with(HARDENED_MARKER) {
                (&segment[..segment.len() - 1], i64::from(HARDENED_OFFSET))
            } else {
                (segment, 0)
            };
            let invalid = || Error::InvalidSegment(segment.to_owned());
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let value: i64 = digits.parse().map_err(|_| invalid())?;
            let value = value.checked_add(offset).ok_or_else(invalid)?;
            indices.push(ChildIndex::new(value)?);
        }
        Ok(DerivationPath(indices))
    }
}

/// derive the node at `path` from the root of `master_secret`
///
/// ```
/// use nano_hd::hdwallet::MasterSecret;
/// use nano_hd::path::derive_chain;
///
/// let secret = MasterSecret::from_bytes([0; 32]);
/// let node = derive_chain(&secret, "44'/165'/0").unwrap().accepted().unwrap();
/// assert_eq!(
///     node.public_key().to_hex(),
///     "349bf3911133a54ad8d743816bece0cc4c9bf4e0e630ad062e8171d12da086ae"
/// );
/// ```
pub fn derive_chain(master_secret: &MasterSecret, path: &str) -> Result<Derived<Node>> {
    let path: DerivationPath = path.parse()?;
    let root = match Node::root(master_secret) {
        Derived::Accepted(root) => root,
        Derived::Discarded(d) => return Ok(Derived::Discarded(d)),
    };
    Ok(path.derive(&root)?)
}

// ---------------------------------------------------------------------------
//                                 serde
// ---------------------------------------------------------------------------

impl serde::Serialize for DerivationPath {
    fn serialize<S>(&self, serializer: S) -> result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
struct PathVisitor;
impl<'de> serde::de::Visitor<'de> for PathVisitor {
    type Value = DerivationPath;

    fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "a derivation path like `44'/165'/0`")
    }

    fn visit_str<E>(self, v: &str) -> result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse().map_err(E::custom)
    }
}
impl<'de> serde::Deserialize<'de> for DerivationPath {
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(PathVisitor)
    }
}
