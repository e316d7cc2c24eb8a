//! Hierarchical Deterministic (HD) keys over a non-linear keyspace
//!
//! Follow the BIP32-Ed25519 paper (Khovratovich, Law):
//!
//! * master secret to root extended private key, discarding improper secrets;
//! * hardened and non-hardened private derivation with 32 bits indices;
//! * watch-only public derivation of non-hardened children;
//! * signing with the extended key, verifiable by Nano's Ed25519-BLAKE2b.
//!
//! Every byte string is read as a little-endian integer. The left half of
//! an extended private key (`kL`) is kept unreduced and only reduced modulo
//! the group order when it is handed to the curve.
//!
//! Derivations that the paper asks to throw away are not errors: they come
//! back as [`Derived::Discarded`]. Misuse (an index outside of the 32 bits
//! range, a hardened index on a public node...) is reported as an [`Error`].
//!
use cryptoxide::curve25519::{ge_scalarmult_base, sc_muladd, sc_reduce, GeP2, GeP3};
use cryptoxide::util::fixed_time_eq;

use std::hash::{Hash, Hasher};
use std::{convert::TryFrom, error, fmt, result};

use crate::hash::{fk, h256, h512};
use crate::util::{hex, securemem};

pub const SEED_SIZE: usize = 32;
pub const PRIVATE_KEY_SIZE: usize = 64;
pub const PUBLIC_KEY_SIZE: usize = 32;
pub const CHAIN_CODE_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;

/// indices at and above this value are hardened
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

const IDENTITY_POINT: [u8; PUBLIC_KEY_SIZE] = [
    1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// HD key errors
///
/// These are caller errors: retrying with the same input fails the same way.
/// See [`Discard`] for the outcomes asking for another seed, path or index.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// the given master secret is of invalid size, see `SEED_SIZE`.
    InvalidSeedSize(usize),
    /// the given extended private key is of invalid size, see `PRIVATE_KEY_SIZE`.
    InvalidPrivateKeySize(usize),
    /// the given public key is of invalid size, see `PUBLIC_KEY_SIZE`.
    InvalidPublicKeySize(usize),
    /// the given chain code is of invalid size, see `CHAIN_CODE_SIZE`.
    InvalidChainCodeSize(usize),
    /// the given signature is of invalid size, see `SIGNATURE_SIZE`.
    InvalidSignatureSize(usize),
    /// the public key does not decode to a point of the curve
    InvalidPublicKey,
    /// the child index is not within `[0, 2^32)`
    IndexOutOfRange(i64),
    /// hardened children need the private key of their parent
    HardenedNotSupported(ChildIndex),
    /// the derived `kL` does not fit in 256 bits anymore
    ScalarOverflow,
    /// the operating system's random source failed
    Randomness(String),
    HexadecimalError(hex::Error),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidSeedSize(sz) => write!(
                f,
                "Invalid master secret size, expected {} bytes, but received {} bytes.",
                SEED_SIZE, sz
            ),
            Error::InvalidPrivateKeySize(sz) => write!(
                f,
                "Invalid extended private key size, expected {} bytes, but received {} bytes.",
                PRIVATE_KEY_SIZE, sz
            ),
            Error::InvalidPublicKeySize(sz) => write!(
                f,
                "Invalid public key size, expected {} bytes, but received {} bytes.",
                PUBLIC_KEY_SIZE, sz
            ),
            Error::InvalidChainCodeSize(sz) => write!(
                f,
                "Invalid chain code size, expected {} bytes, but received {} bytes.",
                CHAIN_CODE_SIZE, sz
            ),
            Error::InvalidSignatureSize(sz) => write!(
                f,
                "Invalid signature size, expected {} bytes, but received {} bytes.",
                SIGNATURE_SIZE, sz
            ),
            Error::InvalidPublicKey => write!(f, "public key is not a valid curve point"),
            Error::IndexOutOfRange(i) => {
                write!(f, "index {} must be between 0 and 2^32 - 1, inclusive", i)
            }
            Error::HardenedNotSupported(i) => {
                write!(f, "cannot derive hardened child {} from a public key", i)
            }
            Error::ScalarOverflow => write!(f, "derived private scalar does not fit in 256 bits"),
            Error::Randomness(err) => write!(f, "random source unavailable: {}", err),
            Error::HexadecimalError(err) => write!(f, "Invalid hexadecimal: {}.", err),
        }
    }
}
impl error::Error for Error {}
impl From<hex::Error> for Error {
    fn from(e: hex::Error) -> Error {
        Error::HexadecimalError(e)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// reason for throwing a derived key away
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Discard {
    /// the third highest bit of the last byte of `kL` is set
    ImproperMasterSecret,
    /// the child `kL` is a multiple of the group order
    ZeroScalar,
    /// the child public key is the identity point
    IdentityPoint,
}
impl fmt::Display for Discard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Discard::ImproperMasterSecret => write!(f, "improper master secret"),
            Discard::ZeroScalar => write!(f, "child private scalar is zero modulo the group order"),
            Discard::IdentityPoint => write!(f, "child public key is the identity point"),
        }
    }
}

/// outcome of a derivation: either a usable key or the reason it was discarded
///
/// A discarded key must never be used. The caller has to pick another
/// master secret, path or index.
#[must_use]
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Derived<T> {
    Accepted(T),
    Discarded(Discard),
}
impl<T> Derived<T> {
    pub fn is_accepted(&self) -> bool {
        match self {
            Derived::Accepted(_) => true,
            Derived::Discarded(_) => false,
        }
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Derived::Accepted(t) => Some(t),
            Derived::Discarded(_) => None,
        }
    }

    pub fn discarded(&self) -> Option<Discard> {
        match self {
            Derived::Accepted(_) => None,
            Derived::Discarded(d) => Some(*d),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Derived<U> {
        match self {
            Derived::Accepted(t) => Derived::Accepted(f(t)),
            Derived::Discarded(d) => Derived::Discarded(d),
        }
    }
}

/// 32 bytes master secret every key of the tree derives from.
///
/// Only secrets for which [`is_proper`](MasterSecret::is_proper) holds have a
/// root key, see [`generate_proper_master_secret`](crate::keygen::generate_proper_master_secret).
pub struct MasterSecret([u8; SEED_SIZE]);
impl MasterSecret {
    /// create a `MasterSecret` by taking ownership of the given array
    ///
    /// ```
    /// use nano_hd::hdwallet::{MasterSecret, SEED_SIZE};
    ///
    /// let secret = MasterSecret::from_bytes([0u8; SEED_SIZE]);
    ///
    /// assert!(secret.as_ref().len() == SEED_SIZE);
    /// ```
    pub fn from_bytes(buf: [u8; SEED_SIZE]) -> Self {
        MasterSecret(buf)
    }

    /// create a `MasterSecret` by copying the given slice
    ///
    /// ```
    /// use nano_hd::hdwallet::{MasterSecret, SEED_SIZE};
    ///
    /// assert!(MasterSecret::from_slice(&[0u8; 31]).is_err());
    /// assert!(MasterSecret::from_slice(&[0u8; SEED_SIZE]).is_ok());
    /// ```
    pub fn from_slice(buf: &[u8]) -> Result<Self> {
        if buf.len() != SEED_SIZE {
            return Err(Error::InvalidSeedSize(buf.len()));
        }
        let mut v = [0u8; SEED_SIZE];
        v.copy_from_slice(buf);
        Ok(MasterSecret(v))
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let mut bytes = hex::decode(hex)?;
        let r = Self::from_slice(&bytes);
        securemem::zero(&mut bytes);
        r
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// the paper only admits secrets whose `kL` has the third highest bit
    /// of its last byte cleared.
    pub fn is_proper(&self) -> bool {
        let mut k = h512(&[&self.0]);
        let proper = k[31] & 0b0010_0000 == 0;
        securemem::zero(&mut k);
        proper
    }
}
impl AsRef<[u8]> for MasterSecret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
impl PartialEq for MasterSecret {
    fn eq(&self, rhs: &MasterSecret) -> bool {
        fixed_time_eq(&self.0, &rhs.0)
    }
}
impl Eq for MasterSecret {}
impl Clone for MasterSecret {
    fn clone(&self) -> Self {
        MasterSecret(self.0)
    }
}
impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MasterSecret(..)")
    }
}
impl Drop for MasterSecret {
    fn drop(&mut self) {
        securemem::zero(&mut self.0);
    }
}

/// extended private key: `kL` (scalar material) followed by `kR` (nonce material)
pub struct ExtendedPrivateKey([u8; PRIVATE_KEY_SIZE]);
impl ExtendedPrivateKey {
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        ExtendedPrivateKey(bytes)
    }

    fn from_halves(kl: &[u8; 32], kr: &[u8; 32]) -> Self {
        let mut out = [0u8; PRIVATE_KEY_SIZE];
        out[0..32].copy_from_slice(kl);
        out[32..64].copy_from_slice(kr);
        ExtendedPrivateKey(out)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(Error::InvalidPrivateKeySize(bytes.len()));
        }
        let mut buf = [0u8; PRIVATE_KEY_SIZE];
        buf.copy_from_slice(bytes);
        Ok(ExtendedPrivateKey(buf))
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let mut bytes = hex::decode(hex)?;
        let r = Self::from_slice(&bytes);
        securemem::zero(&mut bytes);
        r
    }

    /// `kL`, the little-endian encoding of the (unreduced) private scalar
    pub fn left(&self) -> &[u8] {
        &self.0[0..32]
    }

    /// `kR`, the key of the signature nonce derivation
    pub fn right(&self) -> &[u8] {
        &self.0[32..64]
    }

    fn left_array(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.left());
        out
    }

    fn right_array(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.right());
        out
    }

    /// the public key `encodePoint(kL·B)`
    pub fn public_key(&self) -> PublicKey {
        PublicKey(scalar_mult_base(&self.left_array()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}
impl AsRef<[u8]> for ExtendedPrivateKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
impl PartialEq for ExtendedPrivateKey {
    fn eq(&self, rhs: &ExtendedPrivateKey) -> bool {
        fixed_time_eq(self.as_ref(), rhs.as_ref())
    }
}
impl Eq for ExtendedPrivateKey {}
impl Clone for ExtendedPrivateKey {
    fn clone(&self) -> Self {
        ExtendedPrivateKey(self.0)
    }
}
impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ExtendedPrivateKey(..)")
    }
}
impl Drop for ExtendedPrivateKey {
    fn drop(&mut self) {
        securemem::zero(&mut self.0);
    }
}

macro_rules! public_bytes {
    ($name:ident, $size:ident, $err:ident) => {
        impl $name {
            pub fn from_bytes(bytes: [u8; $size]) -> Self {
                $name(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                if bytes.len() != $size {
                    return Err(Error::$err(bytes.len()));
                }
                let mut buf = [0u8; $size];
                buf.copy_from_slice(bytes);
                Ok($name(buf))
            }

            pub fn from_hex(hex: &str) -> Result<Self> {
                let bytes = hex::decode(hex)?;
                Self::from_slice(&bytes)
            }

            pub fn to_bytes(&self) -> [u8; $size] {
                self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(&self.0)
            }
        }
        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
        impl PartialEq for $name {
            fn eq(&self, rhs: &$name) -> bool {
                fixed_time_eq(&self.0, &rhs.0)
            }
        }
        impl Eq for $name {}
        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.write(&self.0)
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", hex::encode(&self.0))
            }
        }
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", hex::encode(&self.0))
            }
        }
        impl ::std::str::FromStr for $name {
            type Err = Error;
            fn from_str(s: &str) -> Result<Self> {
                Self::from_hex(s)
            }
        }
    };
}

/// compressed Edwards point, `encodePoint(kL·B)`
#[derive(Clone, Copy)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);
public_bytes!(PublicKey, PUBLIC_KEY_SIZE, InvalidPublicKeySize);
impl PublicKey {
    /// verify a signature with the Ed25519 equation `S·B = R + x·A`
    /// where `x = h512(R || A || message)`.
    ///
    /// ```
    /// use nano_hd::hdwallet::{MasterSecret, Node};
    ///
    /// let secret = MasterSecret::from_bytes([0; 32]);
    /// let node = Node::root(&secret).accepted().unwrap();
    /// let msg = b"Some message...";
    ///
    /// let signature = node.sign(msg);
    /// assert!(node.public_key().verify(msg, &signature));
    /// ```
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let sig = signature.as_ref();
        if sig[63] & 0b1110_0000 != 0 {
            return false;
        }
        // -A, the double scalar multiplication then yields S·B - x·A
        let a = match GeP3::from_bytes_negate_vartime(&self.0) {
            Some(g) => g,
            None => return false,
        };
        let mut x = h512(&[&sig[0..32], &self.0, message]);
        sc_reduce(&mut x);
        let r = GeP2::double_scalarmult_vartime(&x[0..32], a, &sig[32..64]);
        fixed_time_eq(&r.to_bytes(), &sig[0..32])
    }
}

/// 32 bytes of auxiliary entropy keying the derivation of the children
#[derive(Clone, Copy)]
pub struct ChainCode([u8; CHAIN_CODE_SIZE]);
public_bytes!(ChainCode, CHAIN_CODE_SIZE, InvalidChainCodeSize);

/// `R || S`
#[derive(Clone, Copy)]
pub struct Signature([u8; SIGNATURE_SIZE]);
impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Signature(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_SIZE {
            return Err(Error::InvalidSignatureSize(bytes.len()));
        }
        let mut buf = [0u8; SIGNATURE_SIZE];
        buf.copy_from_slice(bytes);
        Ok(Signature(buf))
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let bytes = hex::decode(hex)?;
        Self::from_slice(&bytes)
    }

    pub fn r(&self) -> &[u8] {
        &self.0[0..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    pub fn to_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// uppercase hexadecimal, as shown in node RPC blocks
    pub fn to_hex_upper(&self) -> String {
        hex::encode_upper(&self.0)
    }
}
impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
impl PartialEq for Signature {
    fn eq(&self, rhs: &Signature) -> bool {
        fixed_time_eq(&self.0, &rhs.0)
    }
}
impl Eq for Signature {}
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}
impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// child index in `[0, 2^32)`, hardened at and above `HARDENED_OFFSET`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChildIndex(u32);
impl ChildIndex {
    /// check that `index` fits in 32 bits
    ///
    /// ```
    /// use nano_hd::hdwallet::{ChildIndex, Error};
    ///
    /// assert!(ChildIndex::new(0x7fff_ffff).is_ok());
    /// assert_eq!(ChildIndex::new(-1), Err(Error::IndexOutOfRange(-1)));
    /// assert_eq!(ChildIndex::new(1 << 32), Err(Error::IndexOutOfRange(1 << 32)));
    /// ```
    pub fn new(index: i64) -> Result<Self> {
        match u32::try_from(index) {
            Ok(i) => Ok(ChildIndex(i)),
            Err(_) => Err(Error::IndexOutOfRange(index)),
        }
    }

    /// hardened index `index + 2^31`, `index` must be below `2^31`
    pub fn hardened(index: u32) -> Result<Self> {
        Self::new(i64::from(index) + i64::from(HARDENED_OFFSET))
    }

    pub fn is_hardened(self) -> bool {
        self.0 >= HARDENED_OFFSET
    }

    pub fn value(self) -> u32 {
        self.0
    }

    fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}
impl From<u32> for ChildIndex {
    fn from(i: u32) -> Self {
        ChildIndex(i)
    }
}
impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_hardened() {
            write!(f, "{}'", self.0 - HARDENED_OFFSET)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// a full node of the tree: private key, public key and chain code
///
/// The public key is always recomputed from `kL`, never stored on its own.
#[derive(Clone, PartialEq, Eq)]
pub struct Node {
    key: ExtendedPrivateKey,
    public_key: PublicKey,
    chain_code: ChainCode,
}
impl Node {
    /// create the root node associated to this master secret.
    ///
    /// ```
    /// use nano_hd::hdwallet::{Discard, MasterSecret, Node};
    ///
    /// let proper = MasterSecret::from_bytes([0; 32]);
    /// assert!(Node::root(&proper).is_accepted());
    ///
    /// let improper = MasterSecret::from_bytes([1; 32]);
    /// assert_eq!(Node::root(&improper).discarded(), Some(Discard::ImproperMasterSecret));
    /// ```
    pub fn root(master_secret: &MasterSecret) -> Derived<Node> {
        let mut k = h512(&[master_secret.as_ref()]);

        if k[31] & 0b0010_0000 != 0 {
            securemem::zero(&mut k);
            debug!("discarding master secret: {}", Discard::ImproperMasterSecret);
            return Derived::Discarded(Discard::ImproperMasterSecret);
        }

        k[0] &= 0b1111_1000;
        k[31] &= 0b0111_1111;
        k[31] |= 0b0100_0000;

        let key = ExtendedPrivateKey::from_bytes(k);
        securemem::zero(&mut k);

        let chain_code = ChainCode(h256(&[&[0x01], master_secret.as_ref()]));
        Derived::Accepted(Node::from_parts(key, chain_code))
    }

    /// assemble a node, computing the public key from `kL`
    pub fn from_parts(key: ExtendedPrivateKey, chain_code: ChainCode) -> Self {
        let public_key = key.public_key();
        Node { key, public_key, chain_code }
    }

    pub fn private_key(&self) -> &ExtendedPrivateKey {
        &self.key
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn chain_code(&self) -> ChainCode {
        self.chain_code
    }

    /// the watch-only projection of this node
    pub fn public_node(&self) -> PublicNode {
        PublicNode { public_key: self.public_key, chain_code: self.chain_code }
    }

    /// derive the child at `index`, hardened or not.
    pub fn private_child_key(&self, index: ChildIndex) -> Result<Derived<Node>> {
        let kl = self.key.left_array();
        let kr = self.key.right_array();
        let cc = self.chain_code.as_ref();
        let seri = index.to_le_bytes();

        let (mut z, i) = if index.is_hardened() {
            (
                fk(&[&[0x00], &kl, &kr, &seri], cc),
                fk(&[&[0x01], &kl, &kr, &seri], cc),
            )
        } else {
            let pk = self.public_key.as_ref();
            (fk(&[&[0x02], pk, &seri], cc), fk(&[&[0x03], pk, &seri], cc))
        };
        trace!("private derivation of child {}", index);

        let left = child_scalar(&kl, &z[0..28]);
        // right = (zr + kr) mod 2^256
        let (right, _) = add_256bits(&kr, &z[32..64]);
        securemem::zero(&mut z);

        let left = match left? {
            Derived::Accepted(left) => left,
            Derived::Discarded(d) => {
                debug!("discarding private child {}: {}", index, d);
                return Ok(Derived::Discarded(d));
            }
        };

        let mut chain_code = [0u8; CHAIN_CODE_SIZE];
        chain_code.copy_from_slice(&i[32..64]);

        let key = ExtendedPrivateKey::from_halves(&left, &right);
        Ok(Derived::Accepted(Node::from_parts(key, ChainCode(chain_code))))
    }

    /// sign `message` with this node's extended private key
    pub fn sign(&self, message: &[u8]) -> Signature {
        special_signing(&self.key, &self.public_key, message)
    }
}
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Node")
            .field("public_key", &self.public_key)
            .field("chain_code", &self.chain_code)
            .finish()
    }
}

/// public key and chain code: enough to derive non-hardened public children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicNode {
    public_key: PublicKey,
    chain_code: ChainCode,
}
impl PublicNode {
    pub fn new(public_key: PublicKey, chain_code: ChainCode) -> Self {
        PublicNode { public_key, chain_code }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn chain_code(&self) -> ChainCode {
        self.chain_code
    }

    /// derive the public part of the non-hardened child at `index`
    /// without any private material.
    ///
    /// ```
    /// use nano_hd::hdwallet::{ChildIndex, MasterSecret, Node};
    ///
    /// let node = Node::root(&MasterSecret::from_bytes([0; 32])).accepted().unwrap();
    /// let index = ChildIndex::from(7);
    ///
    /// let private = node.private_child_key(index).unwrap().accepted().unwrap();
    /// let public = node.public_node().safe_public_child_key(index).unwrap().accepted().unwrap();
    ///
    /// assert_eq!(private.public_node(), public);
    /// ```
    pub fn safe_public_child_key(&self, index: ChildIndex) -> Result<Derived<PublicNode>> {
        if index.is_hardened() {
            return Err(Error::HardenedNotSupported(index));
        }
        let pk = self.public_key.as_ref();
        let cc = self.chain_code.as_ref();
        let seri = index.to_le_bytes();

        let z = fk(&[&[0x02], pk, &seri], cc);
        let i = fk(&[&[0x03], pk, &seri], cc);
        trace!("public derivation of child {}", index);

        let point = match child_point(&self.public_key.0, &z[0..28])? {
            Derived::Accepted(point) => point,
            Derived::Discarded(d) => {
                debug!("discarding public child {}: {}", index, d);
                return Ok(Derived::Discarded(d));
            }
        };

        let mut chain_code = [0u8; CHAIN_CODE_SIZE];
        chain_code.copy_from_slice(&i[32..64]);
        Ok(Derived::Accepted(PublicNode::new(PublicKey(point), ChainCode(chain_code))))
    }
}

/// root node of `master_secret`, see [`Node::root`]
pub fn root_key(master_secret: &MasterSecret) -> Derived<Node> {
    Node::root(master_secret)
}

/// see [`Node::private_child_key`]
pub fn private_child_key(node: &Node, index: ChildIndex) -> Result<Derived<Node>> {
    node.private_child_key(index)
}

/// see [`PublicNode::safe_public_child_key`]
pub fn safe_public_child_key(node: &PublicNode, index: ChildIndex) -> Result<Derived<PublicNode>> {
    node.safe_public_child_key(index)
}

/// sign with a split extended key.
///
/// There is no 32 bytes seed behind a derived key, so the nonce comes from
/// `kR` and the scalar is `kL` directly:
///
/// * `r = h512(kR || M) mod l`, `R = r·B`;
/// * `x = h512(R || A || M)`;
/// * `S = (r + x·kL) mod l`.
pub fn special_signing(key: &ExtendedPrivateKey, public_key: &PublicKey, message: &[u8]) -> Signature {
    let mut r = h512(&[key.right(), message]);
    sc_reduce(&mut r);
    let big_r = ge_scalarmult_base(&r[0..32]).to_bytes();

    let mut x = h512(&[&big_r, public_key.as_ref(), message]);
    sc_reduce(&mut x);

    let mut kl = reduce_scalar(&key.left_array());
    let mut s = [0u8; 32];
    sc_muladd(&mut s, &x[0..32], &kl, &r[0..32]);
    securemem::zero(&mut kl);
    securemem::zero(&mut r);

    let mut out = [0u8; SIGNATURE_SIZE];
    out[0..32].copy_from_slice(&big_r);
    out[32..64].copy_from_slice(&s);
    Signature(out)
}

/// `kL = 8·trunc28(zl) + kLP`, discarded when it is a multiple of `l`
fn child_scalar(parent_kl: &[u8; 32], zl: &[u8]) -> Result<Derived<[u8; 32]>> {
    let (left, carry) = add_256bits(parent_kl, &trunc28_mul8(zl));
    if carry {
        return Err(Error::ScalarOverflow);
    }
    if is_zero_mod_l(&left) {
        return Ok(Derived::Discarded(Discard::ZeroScalar));
    }
    Ok(Derived::Accepted(left))
}

/// `A = AP + (8·trunc28(zl))·B`, discarded when it is the identity
fn child_point(parent_pk: &[u8; 32], zl: &[u8]) -> Result<Derived<[u8; 32]>> {
    let sum = point_plus(parent_pk, &scalar_mult_base(&trunc28_mul8(zl)))?;
    if sum == IDENTITY_POINT {
        return Ok(Derived::Discarded(Discard::IdentityPoint));
    }
    Ok(Derived::Accepted(sum))
}

/// `8 * zl[0..28]` as a 32 bytes little-endian integer, never overflows
fn trunc28_mul8(zl: &[u8]) -> [u8; 32] {
    assert!(zl.len() >= 28);
    let mut out = [0u8; 32];
    let mut carry = 0u8;
    for i in 0..28 {
        out[i] = (zl[i] << 3) | carry;
        carry = zl[i] >> 5;
    }
    out[28] = carry;
    out
}

/// `x + y` on 256 bits, with the carry out of the last byte
fn add_256bits(x: &[u8; 32], y: &[u8]) -> ([u8; 32], bool) {
    assert!(y.len() == 32);
    let mut carry: u16 = 0;
    let mut out = [0u8; 32];
    for i in 0..32 {
        let r = u16::from(x[i]) + u16::from(y[i]) + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    (out, carry != 0)
}

fn reduce_scalar(k: &[u8; 32]) -> [u8; 32] {
    let mut wide = [0u8; 64];
    wide[0..32].copy_from_slice(k);
    sc_reduce(&mut wide);
    let mut out = [0u8; 32];
    out.copy_from_slice(&wide[0..32]);
    securemem::zero(&mut wide);
    out
}

fn is_zero_mod_l(k: &[u8; 32]) -> bool {
    reduce_scalar(k).iter().all(|b| *b == 0)
}

/// `encodePoint((k mod l)·B)`
fn scalar_mult_base(k: &[u8; 32]) -> [u8; 32] {
    let mut reduced = reduce_scalar(k);
    let point = ge_scalarmult_base(&reduced).to_bytes();
    securemem::zero(&mut reduced);
    point
}

fn point_plus(p1: &[u8], p2: &[u8]) -> Result<[u8; 32]> {
    let a = match GeP3::from_bytes_negate_vartime(p1) {
        Some(g) => g,
        None => return Err(Error::InvalidPublicKey),
    };
    let b = match GeP3::from_bytes_negate_vartime(p2) {
        Some(g) => g,
        None => return Err(Error::InvalidPublicKey),
    };
    // (-p1) + (-p2), negated back by flipping the sign bit unless
    // it is the identity, which is its own negation. The order 2 point
    // (0, -1) comes out with a non-canonical sign bit; only a parent key
    // with a torsion component reaches it.
    let r = a + b.to_cached();
    let mut r = r.to_p2().to_bytes();
    if r != IDENTITY_POINT {
        r[31] ^= 0x80;
    }
    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP_ORDER: &str = "edd3f55c1a631258d69cf7a2def9de1400000000000000000000000000000010";
    const GROUP_ORDER_MINUS_8: &str =
        "e5d3f55c1a631258d69cf7a2def9de1400000000000000000000000000000010";
    // encodePoint((l - 8)·B) = -8·B
    const MINUS_8_B: &str = "b4b937fca95b2f1e93e41e62fc3c78818ff38a66096fad6e7973e5c90006d3a1";
    const EIGHT_B: &str = "b4b937fca95b2f1e93e41e62fc3c78818ff38a66096fad6e7973e5c90006d321";

    fn array32(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(s).unwrap());
        out
    }

    fn zl_one() -> [u8; 28] {
        let mut zl = [0u8; 28];
        zl[0] = 1;
        zl
    }

    fn root() -> Node {
        Node::root(&MasterSecret::from_bytes([0; SEED_SIZE])).accepted().unwrap()
    }

    #[test]
    fn trunc28_mul8_shifts_across_bytes() {
        let mut zl = [0u8; 32];
        zl[0] = 0xff;
        zl[27] = 0xe0;
        // bytes beyond the 28th are ignored
        zl[28] = 0xff;
        let out = trunc28_mul8(&zl);
        assert_eq!(out[0], 0xf8);
        assert_eq!(out[1], 0x07);
        assert_eq!(out[27], 0x00);
        assert_eq!(out[28], 0x07);
        assert_eq!(&out[29..], &[0, 0, 0]);
    }

    #[test]
    fn scalar_mult_base_of_eight() {
        let mut eight = [0u8; 32];
        eight[0] = 8;
        assert_eq!(hex::encode(&scalar_mult_base(&eight)), EIGHT_B);
    }

    #[test]
    fn zero_scalar_is_discarded() {
        let l = array32(GROUP_ORDER);
        assert_eq!(child_scalar(&l, &[0u8; 28]), Ok(Derived::Discarded(Discard::ZeroScalar)));

        let l_minus_8 = array32(GROUP_ORDER_MINUS_8);
        assert_eq!(child_scalar(&l_minus_8, &zl_one()), Ok(Derived::Discarded(Discard::ZeroScalar)));

        assert!(child_scalar(&l_minus_8, &[0u8; 28]).unwrap().is_accepted());
    }

    #[test]
    fn overflowing_scalar_is_an_error() {
        assert_eq!(child_scalar(&[0xff; 32], &zl_one()), Err(Error::ScalarOverflow));
    }

    #[test]
    fn identity_point_is_discarded() {
        let minus_8b = array32(MINUS_8_B);
        assert_eq!(
            child_point(&minus_8b, &zl_one()),
            Ok(Derived::Discarded(Discard::IdentityPoint))
        );
    }

    #[test]
    fn point_plus_of_opposites() {
        let minus_8b = array32(MINUS_8_B);
        let eight_b = array32(EIGHT_B);
        assert_eq!(point_plus(&minus_8b, &eight_b), Ok(IDENTITY_POINT));
        let mut sixteen = [0u8; 32];
        sixteen[0] = 16;
        assert_eq!(point_plus(&eight_b, &eight_b), Ok(scalar_mult_base(&sixteen)));
    }

    #[test]
    fn invalid_public_key_is_an_error() {
        // y = 2 is not on the curve
        let mut not_a_point = [0u8; 32];
        not_a_point[0] = 2;
        let node = PublicNode::new(PublicKey::from_bytes(not_a_point), ChainCode::from_bytes([0; 32]));
        assert_eq!(node.safe_public_child_key(ChildIndex::from(0)), Err(Error::InvalidPublicKey));
    }

    #[test]
    fn hardened_boundary() {
        let root = root();
        let last_soft = ChildIndex::from(HARDENED_OFFSET - 1);
        let first_hard = ChildIndex::from(HARDENED_OFFSET);
        assert!(!last_soft.is_hardened());
        assert!(first_hard.is_hardened());

        let soft = root.private_child_key(last_soft).unwrap().accepted().unwrap();
        let hard = root.private_child_key(first_hard).unwrap().accepted().unwrap();
        assert_eq!(
            soft.public_key().to_hex(),
            "a29d41fdb2fa80ffc23193d9c57fded488f12bdcc7921995c3066f2e1ee860dc"
        );
        assert_eq!(
            hard.public_key().to_hex(),
            "a51bc3d476f9be4ed2ce41b9a735f4853f0847ce4fe6f536fc0cf66c946745ce"
        );

        let public = root.public_node();
        assert_eq!(
            public.safe_public_child_key(last_soft).unwrap().accepted(),
            Some(soft.public_node())
        );
        assert_eq!(
            public.safe_public_child_key(first_hard),
            Err(Error::HardenedNotSupported(first_hard))
        );
    }

    #[test]
    fn child_index_range() {
        assert_eq!(ChildIndex::new(-1), Err(Error::IndexOutOfRange(-1)));
        assert_eq!(ChildIndex::new(1 << 32), Err(Error::IndexOutOfRange(1 << 32)));
        assert_eq!(ChildIndex::new((1 << 32) - 1).map(|i| i.value()), Ok(0xffff_ffff));
        assert_eq!(ChildIndex::hardened(44).map(|i| i.value()), Ok(0x8000_002c));
        assert!(ChildIndex::hardened(HARDENED_OFFSET).is_err());
        assert_eq!(ChildIndex::from(0x8000_002c).to_string(), "44'");
        assert_eq!(ChildIndex::from(3).to_string(), "3");
    }

    #[test]
    fn root_rejects_improper_secret() {
        for b in 0..=255u8 {
            let secret = MasterSecret::from_bytes([b; SEED_SIZE]);
            let improper = h512(&[secret.as_ref()])[31] & 0b0010_0000 != 0;
            assert_eq!(secret.is_proper(), !improper);
            match Node::root(&secret) {
                Derived::Accepted(node) => {
                    assert!(!improper);
                    let kl = node.private_key().left();
                    assert_eq!(kl[0] & 0b0000_0111, 0);
                    assert_eq!(kl[31] & 0b1110_0000, 0b0100_0000);
                }
                Derived::Discarded(d) => {
                    assert!(improper);
                    assert_eq!(d, Discard::ImproperMasterSecret);
                }
            }
        }
    }

    #[test]
    fn verify_rejects_tampering() {
        let node = root();
        let msg = b"Hello World";
        let signature = node.sign(msg);
        assert!(node.public_key().verify(msg, &signature));
        assert!(!node.public_key().verify(b"Hello World!", &signature));

        let mut bytes = *signature.to_bytes();
        bytes[5] ^= 0x01;
        assert!(!node.public_key().verify(msg, &Signature::from_bytes(bytes)));

        let other = root().private_child_key(ChildIndex::from(1)).unwrap().accepted().unwrap();
        assert!(!other.public_key().verify(msg, &signature));
    }

    #[test]
    fn sizes_are_checked() {
        assert_eq!(MasterSecret::from_slice(&[0; 33]).err(), Some(Error::InvalidSeedSize(33)));
        assert_eq!(
            ExtendedPrivateKey::from_slice(&[0; 32]).err(),
            Some(Error::InvalidPrivateKeySize(32))
        );
        assert_eq!(PublicKey::from_slice(&[0; 31]).err(), Some(Error::InvalidPublicKeySize(31)));
        assert_eq!(ChainCode::from_slice(&[0; 64]).err(), Some(Error::InvalidChainCodeSize(64)));
        assert_eq!(Signature::from_slice(&[0; 32]).err(), Some(Error::InvalidSignatureSize(32)));
        assert_eq!(
            PublicKey::from_hex("zz").err(),
            Some(Error::HexadecimalError(hex::Error::UnknownSymbol(0)))
        );
    }

    #[test]
    fn node_from_parts_recomputes_public_key() {
        let node = root();
        let rebuilt = Node::from_parts(node.private_key().clone(), node.chain_code());
        assert_eq!(rebuilt, node);
    }
}

#[cfg(test)]
mod golden_tests {
    use super::*;

    struct TestVector {
        kl: &'static str,
        kr: &'static str,
        public_key: &'static str,
        chain_code: &'static str,
    }

    // master secret 00..00
    const ROOT: TestVector = TestVector {
        kl: "98b7a73a97a1a3031406b6c169634a9c06cfb81dec3323bb4de5ce6f4b7ca147",
        kr: "de534442a7eaeafbaf366ccfdde1cb97d7c884e4344cd0a23039de71a56d630a",
        public_key: "19d3d919475deed4696b5d13018151d1af88b2bd3bcff048b45031c1f36d1858",
        chain_code: "1a7dfdeaffeedac489287e85be5e9c049a2ff6470f55cf30260f55395ac1b159",
    };

    // root / 0'
    const ROOT_H0: TestVector = TestVector {
        kl: "4011bed55f0163fdb88a43a1754ea537ce04c389d6ebd56e7e96057c4f7ca147",
        kr: "64b6e85f23b5023d8913b609d76ee03d0f1f4e2e76e20cfdb80849f2cf1949fd",
        public_key: "a51bc3d476f9be4ed2ce41b9a735f4853f0847ce4fe6f536fc0cf66c946745ce",
        chain_code: "6e733357d5c95790902678f61f2868d05ec3386877a81f5437b8a3fb6543d343",
    };

    // root / 0
    const ROOT_S0_PUBLIC_KEY: &str = "ef5ba393a951846fa5c5a7375120200a8835de192f5cd4a044c4dd4133c81107";
    const ROOT_S0_CHAIN_CODE: &str = "a8572316b057933bb0471d60aadb6253b9f048cabb2546ff735f94717278be8e";

    fn check_node(node: &Node, expected: &TestVector) {
        assert_eq!(hex::encode(node.private_key().left()), expected.kl, "kL");
        assert_eq!(hex::encode(node.private_key().right()), expected.kr, "kR");
        assert_eq!(node.public_key().to_hex(), expected.public_key, "public key");
        assert_eq!(node.chain_code().to_hex(), expected.chain_code, "chain code");
    }

    fn root() -> Node {
        root_key(&MasterSecret::from_bytes([0; SEED_SIZE])).accepted().unwrap()
    }

    #[test]
    fn root_key_vector() {
        check_node(&root(), &ROOT);
    }

    #[test]
    fn hardened_child_vector() {
        let child = private_child_key(&root(), ChildIndex::hardened(0).unwrap()).unwrap();
        check_node(&child.accepted().unwrap(), &ROOT_H0);
    }

    #[test]
    fn soft_child_vector() {
        let index = ChildIndex::from(0);
        let child = private_child_key(&root(), index).unwrap().accepted().unwrap();
        assert_eq!(child.public_key().to_hex(), ROOT_S0_PUBLIC_KEY);
        assert_eq!(child.chain_code().to_hex(), ROOT_S0_CHAIN_CODE);

        let public = safe_public_child_key(&root().public_node(), index).unwrap().accepted().unwrap();
        assert_eq!(public.public_key().to_hex(), ROOT_S0_PUBLIC_KEY);
        assert_eq!(public.chain_code().to_hex(), ROOT_S0_CHAIN_CODE);
    }

    #[test]
    fn improper_master_secret_vector() {
        let secret = MasterSecret::from_bytes([1; SEED_SIZE]);
        assert_eq!(root_key(&secret), Derived::Discarded(Discard::ImproperMasterSecret));
    }
}


#[cfg(test)]
#[cfg(feature = "with-bench")]
mod bench {
    use super::*;
    use test;

    fn root() -> Node {
        Node::root(&MasterSecret::from_bytes([0; SEED_SIZE])).accepted().unwrap()
    }

    #[bench]
    fn derive_hard(b: &mut test::Bencher) {
        let node = root();
        b.iter(|| {
            let _ = node.private_child_key(ChildIndex::from(HARDENED_OFFSET));
        })
    }

    #[bench]
    fn derive_soft_private(b: &mut test::Bencher) {
        let node = root();
        b.iter(|| {
            let _ = node.private_child_key(ChildIndex::from(0));
        })
    }

    #[bench]
    fn derive_soft_public(b: &mut test::Bencher) {
        let node = root().public_node();
        b.iter(|| {
            let _ = node.safe_public_child_key(ChildIndex::from(0));
        })
    }

    #[bench]
    fn sign(b: &mut test::Bencher) {
        let node = root();
        b.iter(|| {
            let _ = node.sign(b"Hello World");
        })
    }
}
