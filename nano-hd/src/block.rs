//! Nano state blocks, hashed and signed with a derived node
//!
//! The hash of a state block is the BLAKE2b-256 of:
//!
//! ```text
//! preamble (32 bytes, 0..06) | account | previous | representative | balance (16 bytes BE) | link
//! ```
//!
//! Computing the proof of work is left to the node (or a work server);
//! an already computed work value can be attached to the signed block.

use std::{error, fmt, result, str::FromStr};

use crate::address::{self, Address, Prefix};
use crate::coin::{self, Raw};
use crate::hash::{Blake2b256, HASH_SIZE};
use crate::hdwallet::{Node, PublicKey, Signature};
use crate::util::hex;

pub type BlockHash = Blake2b256;

const STATE_BLOCK_PREAMBLE: [u8; 32] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 6,
];

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// the node signing the block does not own its account
    AccountMismatch { account: PublicKey, signer: PublicKey },
    /// send and receive blocks follow a previous block of the account
    MissingPrevious,
    /// neither 64 hexadecimal characters nor a Nano address
    InvalidLink(String),
    UnknownKind(String),
    /// the work is not 16 hexadecimal characters
    InvalidWork(String),
    Coin(coin::Error),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AccountMismatch { account, signer } => write!(
                f,
                "block account {} cannot be signed by the key {}",
                Address::from(*account),
                Address::from(*signer)
            ),
            Error::MissingPrevious => write!(f, "send and receive blocks need a previous block"),
            Error::InvalidLink(s) => write!(
                f,
                "invalid link `{}`, expected a block hash or a Nano address",
                s
            ),
            Error::UnknownKind(s) => write!(
                f,
                "unknown block kind `{}`, expected open, send or receive",
                s
            ),
            Error::InvalidWork(s) => write!(f, "invalid work `{}`, expected 16 hexadecimal characters", s),
            Error::Coin(e) => write!(f, "{}", e),
        }
    }
}
impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Coin(e) => Some(e),
            _ => None,
        }
    }
}
impl From<coin::Error> for Error {
    fn from(e: coin::Error) -> Self {
        Error::Coin(e)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// what the block does to the account's balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// first block of the account, receiving its first amount
    Open,
    Send,
    Receive,
}
impl BlockKind {
    /// the balance of the account after this block
    pub fn resulting_balance(self, current: Raw, amount: Raw) -> coin::Result<Raw> {
        match self {
            BlockKind::Open => Ok(amount),
            BlockKind::Send => current.checked_sub(amount),
            BlockKind::Receive => current.checked_add(amount),
        }
    }
}
impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BlockKind::Open => write!(f, "open"),
            BlockKind::Send => write!(f, "send"),
            BlockKind::Receive => write!(f, "receive"),
        }
    }
}
impl FromStr for BlockKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(BlockKind::Open),
            "send" => Ok(BlockKind::Send),
            "receive" => Ok(BlockKind::Receive),
            _ => Err(Error::UnknownKind(s.to_owned())),
        }
    }
}

/// the 32 bytes link field: the pending send block for open and receive
/// blocks, the destination account for send blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Block(BlockHash),
    Destination(Address),
}
impl Link {
    pub fn to_bytes(&self) -> [u8; 32] {
        match self {
            Link::Block(hash) => hash.into_bytes(),
            Link::Destination(address) => address.public_key().to_bytes(),
        }
    }
}
impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Link::Block(hash) => write!(f, "{}", hex::encode_upper(hash.as_ref())),
            Link::Destination(address) => write!(f, "{}", address),
        }
    }
}
impl FromStr for Link {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        if s.len() == HASH_SIZE * 2 {
            if let Ok(hash) = BlockHash::from_hex(&s) {
                return Ok(Link::Block(hash));
            }
        }
        s.parse::<Address>()
            .map(Link::Destination)
            .map_err(|_: address::Error| Error::InvalidLink(s.to_owned()))
    }
}

/// proof of work of a block, computed elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Work(u64);
impl Work {
    pub fn new(work: u64) -> Self {
        Work(work)
    }
}
impl fmt::Display for Work {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}
impl FromStr for Work {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidWork(s.to_owned()));
        }
        u64::from_str_radix(s, 16)
            .map(Work)
            .map_err(|_| Error::InvalidWork(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBlock {
    pub account: PublicKey,
    pub previous: BlockHash,
    pub representative: PublicKey,
    pub balance: Raw,
    pub link: Link,
}
impl StateBlock {
    /// build the block moving `amount` from (or into) an account holding `current`.
    ///
    /// Open blocks start the account chain: `previous` is ignored and zero.
    pub fn new(
        kind: BlockKind,
        account: PublicKey,
        previous: BlockHash,
        representative: PublicKey,
        current: Raw,
        amount: Raw,
        link: Link,
    ) -> Result<Self> {
        let previous = match kind {
            BlockKind::Open => BlockHash::zero(),
            BlockKind::Send | BlockKind::Receive if previous.is_zero() => {
                return Err(Error::MissingPrevious)
            }
            BlockKind::Send | BlockKind::Receive => previous,
        };
        let balance = kind.resulting_balance(current, amount)?;
        Ok(StateBlock { account, previous, representative, balance, link })
    }

    pub fn hash(&self) -> BlockHash {
        let mut buf = Vec::with_capacity(32 * 5 + 16);
        buf.extend_from_slice(&STATE_BLOCK_PREAMBLE);
        buf.extend_from_slice(self.account.as_ref());
        buf.extend_from_slice(self.previous.as_ref());
        buf.extend_from_slice(self.representative.as_ref());
        buf.extend_from_slice(&self.balance.to_be_bytes());
        buf.extend_from_slice(&self.link.to_bytes());
        BlockHash::new(&buf)
    }

    /// sign the hash of the block with the node owning its account
    pub fn sign(self, node: &Node) -> Result<SignedStateBlock> {
        if node.public_key() != self.account {
            return Err(Error::AccountMismatch { account: self.account, signer: node.public_key() });
        }
        let hash = self.hash();
        let signature = node.sign(hash.as_ref());
        debug!("signed state block {}", hash);
        Ok(SignedStateBlock { block: self, hash, signature, work: None })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedStateBlock {
    block: StateBlock,
    hash: BlockHash,
    signature: Signature,
    work: Option<Work>,
}
impl SignedStateBlock {
    pub fn block(&self) -> &StateBlock {
        &self.block
    }

    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn work(&self) -> Option<Work> {
        self.work
    }

    pub fn with_work(self, work: Work) -> Self {
        SignedStateBlock { work: Some(work), ..self }
    }

    pub fn verify(&self) -> bool {
        self.block.hash() == self.hash
            && self.block.account.verify(self.hash.as_ref(), &self.signature)
    }

    /// the `state` block object of the node RPC `process` action, the
    /// `work` field is left out until some work is attached.
    pub fn to_json(&self, prefix: Prefix) -> serde_json::Value {
        let mut json = json!({
            "type": "state",
            "account": Address::new(prefix, self.block.account).to_string(),
            "previous": hex::encode_upper(self.block.previous.as_ref()),
            "representative": Address::new(prefix, self.block.representative).to_string(),
            "balance": self.block.balance.to_string(),
            "link": self.block.link.to_string(),
            "signature": self.signature.to_hex_upper(),
        });
        if let Some(work) = self.work {
            json["work"] = json!(work.to_string());
        }
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdwallet::MasterSecret;
    use crate::path::derive_chain;

    const REPRESENTATIVE: &str = "nano_3t6k35gi95xu6tergt6p69ck76ogmitsa8mnijtpxm9fkcm736xtoncuohr3";
    const PENDING: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    fn node() -> Node {
        derive_chain(&MasterSecret::from_bytes([0; 32]), "44'/165'/0")
            .unwrap()
            .accepted()
            .unwrap()
    }

    fn representative() -> PublicKey {
        REPRESENTATIVE.parse::<Address>().unwrap().public_key()
    }

    fn open_block(node: &Node) -> StateBlock {
        StateBlock::new(
            BlockKind::Open,
            node.public_key(),
            BlockHash::zero(),
            representative(),
            Raw::zero(),
            Raw::from_nano("0.000001").unwrap(),
            PENDING.parse().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn open_block_vector() {
        let node = node();
        let block = open_block(&node);
        assert_eq!(block.balance, Raw::new(1_000_000_000_000_000_000_000_000));
        assert_eq!(
            block.hash().to_string(),
            "55b698f2756cb8c78b2f2610c8715084abde1d9c248bf245861c70b70435b2f1"
        );

        let signed = block.sign(&node).unwrap();
        assert_eq!(
            signed.signature().to_hex_upper(),
            "7B31390D703896347116A68E681199CACED20CE02A39D2E46A864EE4D71D0D7A\
             DF747AB0754275165DBE6DA98681561F8BBEF4995D5E659DFE4C0705E53DA50D"
        );
        assert!(signed.verify());
    }

    #[test]
    fn open_block_json() {
        let node = node();
        let signed = open_block(&node).sign(&node).unwrap();

        let json = signed.to_json(Prefix::Nano);
        assert_eq!(json["type"], "state");
        assert_eq!(
            json["account"],
            "nano_1f6uygaj4ex7bdefgiw3fhpg3m4emhtg3sjion54x1djt6pt33ogk98twryi"
        );
        assert_eq!(json["previous"], "0".repeat(64));
        assert_eq!(json["representative"], REPRESENTATIVE);
        assert_eq!(json["balance"], "1000000000000000000000000");
        assert_eq!(json["link"], PENDING);
        assert!(json.get("work").is_none());

        let json = signed.with_work("2bf29ef00786a6bc".parse().unwrap()).to_json(Prefix::Xrb);
        assert_eq!(json["work"], "2BF29EF00786A6BC");
        assert_eq!(
            json["account"],
            "xrb_1f6uygaj4ex7bdefgiw3fhpg3m4emhtg3sjion54x1djt6pt33ogk98twryi"
        );
    }

    #[test]
    fn open_ignores_previous() {
        let node = node();
        let block = StateBlock::new(
            BlockKind::Open,
            node.public_key(),
            BlockHash::new(b"anything"),
            representative(),
            Raw::new(5),
            Raw::new(7),
            PENDING.parse().unwrap(),
        )
        .unwrap();
        assert!(block.previous.is_zero());
        assert_eq!(block.balance, Raw::new(7));
    }

    #[test]
    fn send_and_receive_balances() {
        let node = node();
        let previous = BlockHash::new(b"previous");
        let destination = Link::Destination(REPRESENTATIVE.parse().unwrap());
        let mk = |kind, current, amount| {
            StateBlock::new(
                kind,
                node.public_key(),
                previous,
                representative(),
                Raw::new(current),
                Raw::new(amount),
                destination,
            )
        };
        assert_eq!(mk(BlockKind::Send, 10, 3).unwrap().balance, Raw::new(7));
        assert_eq!(mk(BlockKind::Receive, 10, 3).unwrap().balance, Raw::new(13));
        assert_eq!(mk(BlockKind::Send, 3, 10), Err(Error::Coin(coin::Error::Underflow)));
        assert_eq!(
            mk(BlockKind::Receive, u128::max_value(), 1),
            Err(Error::Coin(coin::Error::Overflow))
        );
    }

    #[test]
    fn send_needs_previous() {
        let node = node();
        let r = StateBlock::new(
            BlockKind::Send,
            node.public_key(),
            BlockHash::zero(),
            representative(),
            Raw::new(10),
            Raw::new(1),
            PENDING.parse().unwrap(),
        );
        assert_eq!(r, Err(Error::MissingPrevious));
    }

    #[test]
    fn signing_with_another_node_fails() {
        let node = node();
        let other = derive_chain(&MasterSecret::from_bytes([0; 32]), "44'/165'/1")
            .unwrap()
            .accepted()
            .unwrap();
        match open_block(&node).sign(&other) {
            Err(Error::AccountMismatch { account, signer }) => {
                assert_eq!(account, node.public_key());
                assert_eq!(signer, other.public_key());
            }
            r => panic!("expected an account mismatch, got {:?}", r),
        }
    }

    #[test]
    fn tampered_block_does_not_verify() {
        let node = node();
        let mut signed = open_block(&node).sign(&node).unwrap();
        signed.block.balance = Raw::new(1);
        assert!(!signed.verify());
    }

    #[test]
    fn link_parsing() {
        let hash: Link = PENDING.parse().unwrap();
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(hash.to_bytes(), expected);

        let destination: Link = REPRESENTATIVE.parse().unwrap();
        assert_eq!(destination.to_bytes(), representative().to_bytes());
        assert_eq!(destination.to_string(), REPRESENTATIVE);

        assert_eq!("abc".parse::<Link>(), Err(Error::InvalidLink("abc".to_owned())));
        let not_hex = "z".repeat(64);
        assert_eq!(not_hex.parse::<Link>(), Err(Error::InvalidLink(not_hex.clone())));
    }

    #[test]
    fn kind_and_work_parsing() {
        assert_eq!("send".parse::<BlockKind>(), Ok(BlockKind::Send));
        assert_eq!("change".parse::<BlockKind>(), Err(Error::UnknownKind("change".to_owned())));
        assert_eq!("0000000000000001".parse::<Work>(), Ok(Work::new(1)));
        assert_eq!("01".parse::<Work>(), Err(Error::InvalidWork("01".to_owned())));
        assert_eq!(
            "+000000000000001".parse::<Work>(),
            Err(Error::InvalidWork("+000000000000001".to_owned()))
        );
        assert_eq!(Work::new(0xabc).to_string(), "0000000000000ABC");
    }
}
