//! Cellar - a git-native password store with per-directory recipients.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── secrets       # insert, show, edit, mv, rm, ls, search
//! │   ├── recipients    # reinit and recipient add/remove
//! │   ├── keys          # keyring management
//! │   └── completions   # Shell completions
//! ├── protocol          # Length-prefixed JSON request loop
//! └── core/             # Core library components
//!     ├── config        # ~/.cellar/config.toml
//!     ├── keyring/      # Keyring trait + age backend
//!     ├── history/      # VersionedStore trait, git and in-memory backends
//!     ├── domain/       # Secret records, fields, key records
//!     ├── codec         # Plaintext layout
//!     ├── trust         # Per-directory recipient resolution
//!     └── store/        # PasswordStore: CRUD, rotation, scan
//! ```
//!
//! # Features
//!
//! - age encryption with x25519 keys, one envelope per secret
//! - Recipients declared per directory with `.age-id` markers
//! - Every change is one git commit; failed changes roll back
//! - All-or-nothing re-encryption when recipients change

pub mod cli;
pub mod core;
pub mod error;
pub mod protocol;
