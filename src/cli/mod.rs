//! Command-line interface.

pub mod completions;
pub mod import;
pub mod init;
pub mod keys;
pub mod log;
pub mod output;
pub mod recipients;
pub mod reinit;
pub mod scan;
pub mod secrets;
pub mod serve;
pub mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::constants::{ENV_KEYRING, ENV_STORE};
use crate::error::Result;
use session::Session;

/// Cellar - a git-native password store with per-directory recipients.
#[derive(Parser)]
#[command(
    name = "cellar",
    about = "A git-native password store with per-directory recipients",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Store directory (a git repository)
    #[arg(long, global = true, env = ENV_STORE)]
    pub store: Option<PathBuf>,

    /// Keyring directory
    #[arg(long, global = true, env = ENV_KEYRING)]
    pub keyring: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create the store and declare its root recipients
    Init {
        /// Recipients: key id, fingerprint or email
        #[arg(required = true)]
        recipients: Vec<String>,
    },

    /// Add a secret (prompts, or reads one line from stdin)
    Insert {
        /// Secret path (e.g., site.com/alice)
        path: String,
        /// Extra field as key=value; repeatable
        #[arg(short, long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
        /// Overwrite an existing secret
        #[arg(short = 'F', long)]
        force: bool,
    },

    /// Decrypt and print a secret
    Show {
        /// Secret path
        path: String,
        /// Print one field instead of the secret
        #[arg(long)]
        field: Option<String>,
        /// Print secret and fields as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a secret's value, fields or location
    Edit {
        /// Secret path
        path: String,
        /// Prompt for a new secret value
        #[arg(short, long)]
        secret: bool,
        /// Set a field as key=value; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Remove a field; repeatable
        #[arg(long = "unset", value_name = "KEY")]
        unset: Vec<String>,
        /// Move the secret to a new path in the same commit
        #[arg(long)]
        to: Option<String>,
    },

    /// Move a secret
    Mv {
        /// Current path
        from: String,
        /// New path
        to: String,
    },

    /// Remove a secret
    Rm {
        /// Secret path
        path: String,
    },

    /// List secrets
    Ls {
        /// Only list secrets under this directory
        dir: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search paths and fields (never the secret itself)
    Search {
        /// Text to look for, case-insensitive
        needle: String,
        /// Undecryptable secrets to tolerate
        #[arg(long)]
        skip: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace a directory's recipients and re-encrypt its secrets
    Reinit {
        /// Directory whose trust domain changes (`.` for the root)
        dir: String,
        /// New recipients: key id, fingerprint or email
        #[arg(required = true)]
        recipients: Vec<String>,
        /// Undecryptable secrets to tolerate
        #[arg(long)]
        skip: Option<usize>,
    },

    /// Manage the recipients of a directory
    Recipients {
        #[command(subcommand)]
        action: RecipientsAction,
    },

    /// Manage the keyring
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Report which keys can read which secrets
    Scan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent commits
    Log {
        /// Number of commits
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Answer length-prefixed JSON requests on stdin/stdout
    Serve,

    /// Import passwords exported by another password manager
    Import {
        /// Chrome "Export passwords" CSV file
        #[arg(long, value_name = "CSV")]
        chrome: PathBuf,
        /// Update secrets that already exist
        #[arg(long)]
        overwrite: bool,
        /// Keep going after a row fails
        #[arg(long)]
        ignore_failures: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

/// Recipient subcommands.
#[derive(Subcommand)]
pub enum RecipientsAction {
    /// List the recipients in effect for a directory
    List {
        /// Directory (defaults to the root)
        #[arg(default_value = ".")]
        dir: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a recipient and re-encrypt
    Add {
        /// Key id, fingerprint or email
        key: String,
        /// Directory (defaults to the root)
        #[arg(short, long, default_value = ".")]
        dir: String,
        /// Undecryptable secrets to tolerate
        #[arg(long)]
        skip: Option<usize>,
    },

    /// Remove a recipient and re-encrypt
    Rm {
        /// Key id, fingerprint or email
        key: String,
        /// Directory (defaults to the root)
        #[arg(short, long, default_value = ".")]
        dir: String,
        /// Undecryptable secrets to tolerate
        #[arg(long)]
        skip: Option<usize>,
    },
}

/// Keyring subcommands.
#[derive(Subcommand)]
pub enum KeysAction {
    /// List known keys
    List {
        /// Only keys with a local secret half
        #[arg(long)]
        secret: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a new key pair
    Generate {
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Email address
        #[arg(long, default_value = "")]
        email: String,
        /// Expire after this many days
        #[arg(long)]
        expires_in: Option<i64>,
    },

    /// Import keys from a file, or stdin when omitted
    Import {
        file: Option<PathBuf>,
    },

    /// Print a public key in importable form
    Export {
        /// Key id, fingerprint or email
        key: String,
    },

    /// Mark a key trusted (or untrusted with --revoke)
    Trust {
        /// Key id, fingerprint or email
        key: String,
        #[arg(long)]
        revoke: bool,
    },

    /// Delete a public key, or its secret half with --secret
    Delete {
        /// Key id, fingerprint or email
        key: String,
        #[arg(long)]
        secret: bool,
    },
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    if let Completions { shell } = cli.command {
        return completions::execute(shell);
    }
    let session = Session::new(cli.store.as_deref(), cli.keyring.as_deref())?;

    match cli.command {
        Init { recipients } => init::execute(&session, &recipients),
        Insert {
            path,
            fields,
            force,
        } => secrets::insert(&session, &path, &fields, force),
        Show { path, field, json } => secrets::show(&session, &path, field.as_deref(), json),
        Edit {
            path,
            secret,
            set,
            unset,
            to,
        } => secrets::edit(&session, &path, secret, &set, &unset, to.as_deref()),
        Mv { from, to } => secrets::mv(&session, &from, &to),
        Rm { path } => secrets::rm(&session, &path),
        Ls { dir, json } => secrets::ls(&session, dir.as_deref(), json),
        Search { needle, skip, json } => secrets::search(&session, &needle, skip, json),
        Reinit {
            dir,
            recipients,
            skip,
        } => reinit::execute(&session, &dir, &recipients, skip),
        Recipients { action } => match action {
            RecipientsAction::List { dir, json } => recipients::list(&session, &dir, json),
            RecipientsAction::Add { key, dir, skip } => recipients::add(&session, &dir, &key, skip),
            RecipientsAction::Rm { key, dir, skip } => recipients::rm(&session, &dir, &key, skip),
        },
        Keys { action } => match action {
            KeysAction::List { secret, json } => keys::list(&session, secret, json),
            KeysAction::Generate {
                name,
                email,
                expires_in,
            } => keys::generate(&session, name, &email, expires_in),
            KeysAction::Import { file } => keys::import(&session, file.as_deref()),
            KeysAction::Export { key } => keys::export(&session, &key),
            KeysAction::Trust { key, revoke } => keys::trust(&session, &key, !revoke),
            KeysAction::Delete { key, secret } => keys::delete(&session, &key, secret),
        },
        Scan { json } => scan::execute(&session, json),
        Log { count } => log::execute(&session, count),
        Serve => serve::execute(&session),
        Import {
            chrome,
            overwrite,
            ignore_failures,
            json,
        } => import::execute(&session, &chrome, overwrite, ignore_failures, json),
        Completions { .. } => Ok(()),
    }
}
