use std::{
    fs, io,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// Settings for the `sekrat` binary, stored as TOML under the platform config dir.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the directory secrets are stored under.
    pub data_dir: Option<PathBuf>,
    /// Encryption scheme applied to every secret.
    #[serde(default)]
    pub crypter: CrypterKind,
}

/// Selectable crypters. Switching scheme makes previously stored secrets unreadable.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CrypterKind {
    /// AES-256-GCM with a 16-byte nonce.
    #[default]
    AesGcm,
    /// AES-256-GCM with a 12-byte nonce.
    AesGcmStandardNonce,
    /// No encryption at all. Testing only.
    Passthrough,
}

/// Read the user config, or defaults when none has been written.
pub fn load() -> Result<Config> {
    load_from_path(default_path()?)
}

/// Parse the TOML file at `path`. A missing or blank file means "use defaults".
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let contents = match fs::read_to_string(path.as_ref()) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => return Err(err.into()),
    };
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(toml::from_str(&contents)?)
}

/// `<config_dir>/sekrat/config.toml`.
pub fn default_path() -> Result<PathBuf> {
    config_dir()
        .map(|base| base.join("sekrat").join("config.toml"))
        .ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))
}

/// Persist `config` at the default location for `sekrat config init`.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_to_path_if_missing(config, &default_path()?)
}

/// Serialize `config` to `path` only when nothing is there yet; returns `path`
/// either way.
pub fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(config)?)?;
    }
    Ok(path.to_path_buf())
}
