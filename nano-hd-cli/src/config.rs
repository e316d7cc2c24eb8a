use std::{
    env, fs,
    path::{Path, PathBuf},
};

use nano_hd::address::{Address, Prefix};
use nano_hd::hdwallet::{ChildIndex, PublicKey};
use nano_hd::path::DerivationPath;

use crate::error::{Error, Result};

/// environment variable pointing to the configuration file
pub const CONFIG_ENV: &str = "NANO_HD_CONFIG";

/// directory of the configuration, within the local data directory
pub const APPLICATION_DIRECTORY_NAME: &str = "nano-hd";

pub const CONFIG_FILE_NAME: &str = "config.yml";

/// nano_1ninja7rh37ehfp9utkor5ixmxyg8kme8fnzc4zty145ibch8kf5jwpnzr3r
const DEFAULT_REPRESENTATIVE: [u8; 32] = [
    0x52, 0x14, 0x8a, 0x0b, 0x87, 0x84, 0xac, 0x7b, 0x6c, 0x7d, 0xea, 0x55, 0xc0, 0xe1, 0xd9, 0xf7,
    0xce, 0x34, 0xa6, 0xc3, 0x36, 0x9f, 0x50, 0xbf, 0xaf, 0x00, 0x43, 0x82, 0x54, 0xf3, 0x49, 0xa3,
];

/// Configuration file of the command line
///
/// Every key is optional, and the command line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// path of the account key, from the root of the master secret
    pub derivation_path: DerivationPath,

    /// `nano` or the legacy `xrb`
    pub address_prefix: Prefix,

    /// representative of the accounts in the state blocks
    pub representative: Address,
}
impl Default for Config {
    fn default() -> Self {
        Config {
            derivation_path: DerivationPath::new(vec![
                ChildIndex::from(0x8000_0000 + 44),
                ChildIndex::from(0x8000_0000 + 165),
                ChildIndex::from(0),
            ]),
            address_prefix: Prefix::Nano,
            representative: Address::new(Prefix::Nano, PublicKey::from_bytes(DEFAULT_REPRESENTATIVE)),
        }
    }
}
impl Config {
    /// read the configuration from the given file
    pub fn from_file<P: AsRef<Path>>(p: P) -> Result<Self> {
        let path = p.as_ref();
        let file = fs::File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// find and read the configuration:
    ///
    /// * the `explicit` file (`--config`), which must exist;
    /// * or the file named by `NANO_HD_CONFIG`, which must exist;
    /// * or `<local data dir>/nano-hd/config.yml` if there is one;
    /// * or the default configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let default_path = dirs::data_local_dir()
            .map(|d| d.join(APPLICATION_DIRECTORY_NAME).join(CONFIG_FILE_NAME));
        Self::load_from(explicit.map(Path::to_path_buf).or(env_path), default_path)
    }

    fn load_from(required: Option<PathBuf>, optional: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = required {
            if !path.is_file() {
                return Err(Error::ConfigNotFound(path));
            }
            debug!("reading configuration from {}", path.display());
            return Self::from_file(path);
        }
        match optional {
            Some(ref path) if path.is_file() => {
                debug!("reading configuration from {}", path.display());
                Self::from_file(path)
            }
            _ => {
                debug!("no configuration file, using the defaults");
                Ok(Config::default())
            }
        }
    }
}
