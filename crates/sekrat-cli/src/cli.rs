use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "sekrat",
    about = "Encrypted secret storage with pluggable backends",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the ids of all stored secrets.
    Ids,
    /// Encrypt and store a secret. Reads the value from stdin when omitted.
    Put {
        id: String,
        value: Option<String>,
        /// Passphrase; falls back to SEKRAT_KEY.
        #[arg(long)]
        key: Option<String>,
    },
    /// Decrypt a secret and write it to stdout.
    Get {
        id: String,
        /// Passphrase; falls back to SEKRAT_KEY.
        #[arg(long)]
        key: Option<String>,
    },
    /// Check that the configured crypter and data directory work.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
