use std::path::PathBuf;

use color_eyre::Result;
use dirs::data_dir;
use sekrat_core::{Crypter, Manager, PassthroughCrypter};
use sekrat_crypto::{AesGcmCrypter, StandardNonceAesGcmCrypter};
use sekrat_storage::FsWarehouse;
use tracing::{debug, warn};

use crate::config::{Config, CrypterKind};

/// Manager over the on-disk warehouse with the crypter picked in config.
pub type CliManager = Manager<FsWarehouse, Box<dyn Crypter>>;

/// Resolve the default data directory for Sekrat.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("sekrat"))
}

/// Data directory from config, falling back to the platform default.
pub fn data_dir_from_config(config: &Config) -> Result<PathBuf> {
    match &config.data_dir {
        Some(root) => Ok(root.clone()),
        None => default_data_dir(),
    }
}

pub fn crypter_for(kind: CrypterKind) -> Box<dyn Crypter> {
    match kind {
        CrypterKind::AesGcm => Box::new(AesGcmCrypter::new()),
        CrypterKind::AesGcmStandardNonce => Box::new(StandardNonceAesGcmCrypter::new()),
        CrypterKind::Passthrough => {
            warn!("passthrough crypter configured: secrets are stored unencrypted");
            Box::new(PassthroughCrypter)
        }
    }
}

/// Build a manager using config overrides.
pub fn manager_from_config(config: &Config) -> Result<CliManager> {
    let root = data_dir_from_config(config)?;
    debug!(?root, crypter = ?config.crypter, "initializing secret manager");
    Ok(Manager::new(
        FsWarehouse::new(root),
        crypter_for(config.crypter),
    ))
}
