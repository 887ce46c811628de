//! Cellar - a git-backed password store encrypted with age.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cellar::cli::output;
use cellar::cli::{execute, Cli};
use cellar::core::constants::ENV_LOG;
use cellar::error::{Error, KeyringError, StoreError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cellar=debug")
        } else {
            EnvFilter::new("cellar=warn")
        }
    });

    // stdout carries secrets and protocol frames
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli) {
        output::error(&e.to_string());
        if let Some(hint) = suggestion(&e) {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}

fn suggestion(error: &Error) -> Option<&'static str> {
    match error {
        Error::Operation { source, .. } => suggestion(source),
        Error::Store(StoreError::MissingDefaultDomain) => Some("run: cellar init <key>"),
        Error::Store(StoreError::NotARepository(_)) => Some("run: cellar init <key>"),
        Error::Store(StoreError::GitNotFound) => Some("install git and make sure it is on PATH"),
        Error::Keyring(KeyringError::KeyNotFound(_)) => Some("run: cellar keys list"),
        Error::Keyring(KeyringError::DecryptionFailed(_)) => {
            Some("check that a secret key for this store is in your keyring")
        }
        _ => None,
    }
}
