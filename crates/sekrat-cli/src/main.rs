mod backend;
mod cli;
mod config;

use std::io::{self, Read, Write};

use clap::Parser;
use color_eyre::{
    eyre::{bail, eyre, WrapErr},
    Result,
};
use sekrat_core::{Crypter, Manager, MemoryWarehouse, Warehouse};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Command, ConfigCommand};

const KEY_ENV: &str = "SEKRAT_KEY";

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command {
        Command::Ids => list_ids(&config)?,
        Command::Put { id, value, key } => put_secret(&config, &id, value, key)?,
        Command::Get { id, key } => get_secret(&config, &id, key)?,
        Command::Health => run_health_check(&config)?,
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
    }

    Ok(())
}

fn init_tracing() {
    // Logs go to stderr; stdout carries secret values for `get`.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("sekrat {}", env!("CARGO_PKG_VERSION"));
}

fn list_ids(config: &config::Config) -> Result<()> {
    let manager = backend::manager_from_config(config)?;
    for id in manager.ids() {
        println!("{id}");
    }
    Ok(())
}

fn put_secret(
    config: &config::Config,
    id: &str,
    value: Option<String>,
    key: Option<String>,
) -> Result<()> {
    let key = resolve_key(key, std::env::var(KEY_ENV).ok())?;
    let data = match value {
        Some(value) => value.into_bytes(),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let manager = backend::manager_from_config(config)?;
    manager
        .put(id, &key, &data)
        .wrap_err_with(|| format!("could not store secret {id:?}"))?;
    info!(id, "secret stored");
    Ok(())
}

fn get_secret(config: &config::Config, id: &str, key: Option<String>) -> Result<()> {
    let key = resolve_key(key, std::env::var(KEY_ENV).ok())?;
    let manager = backend::manager_from_config(config)?;
    let data = manager
        .get(id, &key)
        .wrap_err_with(|| format!("could not read secret {id:?}"))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}

/// Passphrase from the flag, else from the environment. Empty values count as missing.
fn resolve_key(flag: Option<String>, env: Option<String>) -> Result<String> {
    flag.or(env)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| eyre!("no passphrase given; pass --key or set {KEY_ENV}"))
}

/// Runs a quick health check of the configured crypter and data directory.
fn run_health_check(config: &config::Config) -> Result<()> {
    run_crypter_health(backend::crypter_for(config.crypter))?;
    println!("Crypter ({:?}): ok", config.crypter);

    let manager = backend::manager_from_config(config)?;
    let count = manager.ids().len();
    println!(
        "Storage ({}): ok, {count} secret(s)",
        manager.warehouse().base_dir().display()
    );
    Ok(())
}

/// Round-trips a probe through `crypter` against a scratch in-memory warehouse,
/// so the check never writes to the real data directory.
fn run_crypter_health<C: Crypter>(crypter: C) -> Result<()> {
    let probe_id = "health/probe";
    let payload = b"ok";
    let manager = Manager::new(MemoryWarehouse::new(), crypter);

    manager.put(probe_id, "health-check", payload)?;
    let round_trip = manager.get(probe_id, "health-check")?;
    if round_trip != payload {
        bail!("crypter round-trip failed");
    }
    if manager.warehouse().ids() != [probe_id] {
        bail!("probe not listed by warehouse");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
