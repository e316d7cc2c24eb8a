use std::{error, fmt, io, path::PathBuf, result};

use nano_hd::{address, block, coin, hash, hdwallet, path};

/// command line errors
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// the configuration file given explicitly does not exist
    ConfigNotFound(PathBuf),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    HdWallet(hdwallet::Error),
    Path(path::Error),
    Address(address::Error),
    Coin(coin::Error),
    Block(block::Error),
    Hash(hash::Error),
    /// the child index is not a decimal number
    InvalidIndex(String),
    /// the derivation threw the key away, another seed, path or index is needed
    Discarded(hdwallet::Discard),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::ConfigNotFound(p) => write!(f, "configuration file {} not found", p.display()),
            Error::Yaml(e) => write!(f, "invalid configuration: {}", e),
            Error::Json(e) => write!(f, "cannot format JSON: {}", e),
            Error::HdWallet(e) => write!(f, "{}", e),
            Error::Path(e) => write!(f, "{}", e),
            Error::Address(e) => write!(f, "{}", e),
            Error::Coin(e) => write!(f, "{}", e),
            Error::Block(e) => write!(f, "{}", e),
            Error::Hash(e) => write!(f, "{}", e),
            Error::InvalidIndex(s) => write!(f, "invalid child index `{}`", s),
            Error::Discarded(d) => write!(
                f,
                "the derived key was discarded ({}), use another seed, path or index",
                d
            ),
        }
    }
}
impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Yaml(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::HdWallet(e) => Some(e),
            Error::Path(e) => Some(e),
            Error::Address(e) => Some(e),
            Error::Coin(e) => Some(e),
            Error::Block(e) => Some(e),
            Error::Hash(e) => Some(e),
            Error::ConfigNotFound(_) | Error::InvalidIndex(_) | Error::Discarded(_) => None,
        }
    }
}

macro_rules! from_error {
    ($from:ty, $variant:ident) => {
        impl From<$from> for Error {
            fn from(e: $from) -> Self {
                Error::$variant(e)
            }
        }
    };
}
from_error!(io::Error, Io);
from_error!(serde_yaml::Error, Yaml);
from_error!(serde_json::Error, Json);
from_error!(hdwallet::Error, HdWallet);
from_error!(path::Error, Path);
from_error!(address::Error, Address);
from_error!(coin::Error, Coin);
from_error!(block::Error, Block);
from_error!(hash::Error, Hash);

pub type Result<T> = result::Result<T, Error>;

/// turn a discarded derivation into an error
pub fn accepted<T>(derived: hdwallet::Derived<T>) -> Result<T> {
    match derived {
        hdwallet::Derived::Accepted(t) => Ok(t),
        hdwallet::Derived::Discarded(d) => Err(Error::Discarded(d)),
    }
}
