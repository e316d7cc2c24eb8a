//! the commands of the command line, writing their report to `out`

use std::io::Write;

use nano_hd::address::Address;
use nano_hd::block::{BlockHash, BlockKind, Link, StateBlock, Work};
use nano_hd::coin::Raw;
use nano_hd::hdwallet::{ChainCode, ChildIndex, MasterSecret, Node, PublicKey, PublicNode};
use nano_hd::path::DerivationPath;
use nano_hd::{keygen, util::hex};

use crate::config::Config;
use crate::error::{accepted, Error, Result};

/// print a new proper master secret
pub fn seed_generate<W: Write>(out: &mut W) -> Result<()> {
    let secret = keygen::generate_proper_master_secret()?;
    writeln!(out, "{}", secret.to_hex())?;
    Ok(())
}

fn derive(seed: &str, path: &DerivationPath) -> Result<Node> {
    let secret = MasterSecret::from_hex(seed)?;
    let root = accepted(Node::root(&secret))?;
    accepted(path.derive(&root)?)
}

fn path_or_default(path: Option<&str>, cfg: &Config) -> Result<DerivationPath> {
    match path {
        Some(path) => Ok(path.parse()?),
        None => Ok(cfg.derivation_path.clone()),
    }
}

/// derive the node at `path` and report its keys and address.
///
/// When the last segment of the path is not hardened, the child is also
/// derived from the parent's public key and chain code only.
pub fn key_derive<W: Write>(out: &mut W, cfg: &Config, seed: &str, path: Option<&str>) -> Result<()> {
    let path = path_or_default(path, cfg)?;
    let node = derive(seed, &path)?;
    let address = Address::new(cfg.address_prefix, node.public_key());
    info!("derived {}", address);

    writeln!(out, "path:             {}", path)?;
    writeln!(out, "private key (kL): {}", hex::encode(node.private_key().left()))?;
    writeln!(out, "private key (kR): {}", hex::encode(node.private_key().right()))?;
    writeln!(out, "public key:       {}", node.public_key())?;
    writeln!(out, "chain code:       {}", node.chain_code())?;
    writeln!(out, "address:          {}", address)?;

    if let Some((parent_path, index)) = path.split_last() {
        if index.is_hardened() {
            debug!("hardened child {}, skipping the watch-only derivation", index);
            return Ok(());
        }
        let parent = derive(seed, &parent_path)?.public_node();
        let child = accepted(parent.safe_public_child_key(index)?)?;
        let agrees = child == node.public_node();
        if !agrees {
            error!("public and private derivation of {} disagree", path);
        }

        writeln!(out)?;
        writeln!(out, "parent public key: {}", parent.public_key())?;
        writeln!(out, "parent chain code: {}", parent.chain_code())?;
        writeln!(out, "public child {}: {}", index, child.public_key())?;
        writeln!(
            out,
            "watch-only derivation {}",
            if agrees { "agrees" } else { "DISAGREES" }
        )?;
    }
    Ok(())
}

fn parse_index(index: &str) -> Result<ChildIndex> {
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidIndex(index.to_owned()));
    }
    let value: i64 = index.parse().map_err(|_| Error::InvalidIndex(index.to_owned()))?;
    Ok(ChildIndex::new(value)?)
}

/// derive a non-hardened child from a public key and chain code only
pub fn key_public<W: Write>(
    out: &mut W,
    cfg: &Config,
    public_key: &str,
    chain_code: &str,
    index: &str,
) -> Result<()> {
    let parent = PublicNode::new(PublicKey::from_hex(public_key)?, ChainCode::from_hex(chain_code)?);
    let index = parse_index(index)?;
    let child = accepted(parent.safe_public_child_key(index)?)?;

    writeln!(out, "index:      {}", index)?;
    writeln!(out, "public key: {}", child.public_key())?;
    writeln!(out, "chain code: {}", child.chain_code())?;
    writeln!(out, "address:    {}", Address::new(cfg.address_prefix, child.public_key()))?;
    Ok(())
}

pub fn address<W: Write>(out: &mut W, cfg: &Config, public_key: &str) -> Result<()> {
    let public_key = PublicKey::from_hex(public_key)?;
    writeln!(out, "{}", Address::new(cfg.address_prefix, public_key))?;
    Ok(())
}

/// arguments of the `block` command, still as given on the command line
#[derive(Debug, Default)]
pub struct BlockArgs<'a> {
    pub seed: &'a str,
    pub path: Option<&'a str>,
    pub kind: &'a str,
    pub amount: &'a str,
    pub balance: Option<&'a str>,
    pub previous: Option<&'a str>,
    pub representative: Option<&'a str>,
    pub link: &'a str,
    pub work: Option<&'a str>,
}

/// build and sign a state block, printed as the node RPC expects it
pub fn block<W: Write>(out: &mut W, cfg: &Config, args: &BlockArgs) -> Result<()> {
    let path = path_or_default(args.path, cfg)?;
    let node = derive(args.seed, &path)?;

    let kind: BlockKind = args.kind.parse()?;
    let amount: Raw = args.amount.parse()?;
    let current = match args.balance {
        Some(balance) => balance.parse::<Raw>()?,
        None => Raw::zero(),
    };
    let previous = match args.previous {
        Some(previous) => BlockHash::from_hex(&previous)?,
        None => BlockHash::zero(),
    };
    let representative = match args.representative {
        Some(representative) => representative.parse::<Address>()?.public_key(),
        None => cfg.representative.public_key(),
    };
    let link: Link = args.link.parse()?;

    let block = StateBlock::new(kind, node.public_key(), previous, representative, current, amount, link)?;
    info!("{} block of {} with balance {} Nano", kind, path, block.balance.to_nano_string());
    let mut signed = block.sign(&node)?;

    match args.work {
        Some(work) => signed = signed.with_work(work.parse::<Work>()?),
        None => warn!("no work attached, the node will reject the block until it has some"),
    }

    writeln!(out, "{}", serde_json::to_string_pretty(&signed.to_json(cfg.address_prefix))?)?;
    Ok(())
}
