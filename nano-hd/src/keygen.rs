//! Generation of master secrets that have a root key
//!
//! About half of the random 32 bytes secrets are improper (see
//! [`MasterSecret::is_proper`]); they are drawn again until one is accepted.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::hdwallet::{Error, MasterSecret, Result, SEED_SIZE};
use crate::util::securemem;

/// draw proper master secrets from the operating system's random source
///
/// ```
/// use nano_hd::{hdwallet::Node, keygen};
///
/// let secret = keygen::generate_proper_master_secret().unwrap();
/// assert!(Node::root(&secret).is_accepted());
/// ```
pub fn generate_proper_master_secret() -> Result<MasterSecret> {
    let mut rng = OsRng::new().map_err(|e| Error::Randomness(e.to_string()))?;
    generate_proper_master_secret_with(&mut rng)
}

/// same as [`generate_proper_master_secret`] with the given random source,
/// which must be cryptographically secure.
pub fn generate_proper_master_secret_with<R: RngCore>(rng: &mut R) -> Result<MasterSecret> {
    let mut draws = 0u32;
    loop {
        let mut bytes = [0u8; SEED_SIZE];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| Error::Randomness(e.to_string()))?;
        draws += 1;

        let secret = MasterSecret::from_bytes(bytes);
        securemem::zero(&mut bytes);
        if secret.is_proper() {
            debug!("proper master secret found after {} draw(s)", draws);
            return Ok(secret);
        }
        trace!("improper master secret drawn, retrying");
    }
}
