//! BIP32-Ed25519 hierarchical deterministic keys for Nano
//!
//! ```
//! use nano_hd::{address::Address, hdwallet::MasterSecret, path};
//!
//! let secret = MasterSecret::from_bytes([0; 32]);
//! let node = path::derive_chain(&secret, "44'/165'/0").unwrap().accepted().unwrap();
//!
//! assert_eq!(
//!     Address::from(node.public_key()).to_string(),
//!     "nano_1f6uygaj4ex7bdefgiw3fhpg3m4emhtg3sjion54x1djt6pt33ogk98twryi"
//! );
//! ```
#![cfg_attr(feature = "with-bench", feature(test))]

#[macro_use]
extern crate serde_derive;
extern crate serde;
#[macro_use]
extern crate serde_json;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

#[cfg(test)]
#[cfg(feature = "with-bench")]
extern crate test;

extern crate cryptoxide;
extern crate rand;

pub mod util;
pub mod hash;
pub mod hdwallet;
pub mod keygen;
pub mod path;
pub mod address;
pub mod coin;
pub mod block;
