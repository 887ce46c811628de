//! Error types.
//!
//! Each concern gets its own enum; they fold into [`Error`]. Callers that
//! need to branch on the failure class use [`Error::kind`].

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A secret, tracked path, key or recipient does not exist.
    NotFound,
    /// A secret, tracked path or recipient already exists.
    AlreadyExists,
    /// The store root has no recipient marker.
    MissingDefaultDomain,
    /// The keyring could not encrypt for the requested recipients.
    EncryptionFailed,
    /// No held secret key could open the ciphertext, or it is corrupt.
    DecryptionFailed,
    /// Key material could not be imported.
    ImportFailed,
    /// The versioned store could not durably apply staged changes.
    CommitFailed,
    /// Bad input: paths outside the tree, empty recipient sets, etc.
    InvalidArgument,
    /// Configuration could not be loaded or saved.
    Config,
    /// Underlying I/O failure.
    Io,
}

/// Top-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Keyring(#[from] KeyringError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{operation} {path}: {source}")]
    Operation {
        operation: &'static str,
        path: String,
        source: Box<Error>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Classify the error, looking through operation context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Secret(e) => match e {
                SecretError::NotFound(_) => ErrorKind::NotFound,
                SecretError::AlreadyExists(_) => ErrorKind::AlreadyExists,
                SecretError::Malformed(_) => ErrorKind::DecryptionFailed,
            },
            Self::Store(e) => match e {
                StoreError::NotTracked(_) | StoreError::UnknownRevision(_) => ErrorKind::NotFound,
                StoreError::AlreadyTracked(_) => ErrorKind::AlreadyExists,
                StoreError::MissingDefaultDomain => ErrorKind::MissingDefaultDomain,
                StoreError::CommitFailed { .. } | StoreError::RollbackFailed { .. } => {
                    ErrorKind::CommitFailed
                }
                StoreError::NotARepository(_) | StoreError::GitNotFound | StoreError::Git { .. } => {
                    ErrorKind::Io
                }
            },
            Self::Keyring(e) => match e {
                KeyringError::EncryptionFailed(_) | KeyringError::UnknownRecipient(_) => {
                    ErrorKind::EncryptionFailed
                }
                KeyringError::DecryptionFailed(_) => ErrorKind::DecryptionFailed,
                KeyringError::ImportFailed(_) => ErrorKind::ImportFailed,
                KeyringError::KeyNotFound(_) | KeyringError::NotRecipient(_) => {
                    ErrorKind::NotFound
                }
                KeyringError::AlreadyRecipient(_) => ErrorKind::AlreadyExists,
                KeyringError::SecretKeyPresent(_) | KeyringError::InvalidKey(_) => {
                    ErrorKind::InvalidArgument
                }
                KeyringError::Pubring(_) | KeyringError::Storage(_) => ErrorKind::Io,
            },
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) | Self::Json(_) | Self::Csv(_) => ErrorKind::InvalidArgument,
            Self::Operation { source, .. } => source.kind(),
            Self::Io(_) | Self::Prompt(_) => ErrorKind::Io,
        }
    }

    /// Wrap with the failing operation and the path it was applied to.
    pub fn during(self, operation: &'static str, path: impl Into<String>) -> Self {
        Self::Operation {
            operation,
            path: path.into(),
            source: Box::new(self),
        }
    }
}

/// Secret-level errors.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret already exists: {0}")]
    AlreadyExists(String),

    #[error("malformed secret: {0}")]
    Malformed(String),
}

/// Versioned store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("path is not tracked: {0}")]
    NotTracked(String),

    #[error("path is already tracked: {0}")]
    AlreadyTracked(String),

    #[error("no recipient marker in the store root")]
    MissingDefaultDomain,

    #[error("could not commit \"{message}\": {reason}")]
    CommitFailed { message: String, reason: String },

    #[error("could not roll back after failed commit: {reason} (original failure: {cause})")]
    RollbackFailed { reason: String, cause: String },

    #[error("unknown revision: {0}")]
    UnknownRevision(String),

    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("git executable not found in PATH")]
    GitNotFound,

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },
}

/// Keyring errors.
#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("import failed: {0}")]
    ImportFailed(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("cannot encrypt for {0}: key is unknown, expired or not encryption-capable")]
    UnknownRecipient(String),

    #[error("secret key for {0} is still present; delete it first")]
    SecretKeyPresent(String),

    #[error("key {0} is already a recipient")]
    AlreadyRecipient(String),

    #[error("key {0} is not a recipient")]
    NotRecipient(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid public keyring: {0}")]
    Pubring(String),

    #[error("keyring storage: {0}")]
    Storage(#[source] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("unable to determine home directory")]
    NoHomeDir,

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("recipient set cannot be empty")]
    EmptyRecipients,

    #[error("invalid field name '{key}': {reason}")]
    InvalidFieldKey { key: String, reason: String },

    #[error("secret value cannot span multiple lines")]
    MultilineSecret,

    #[error("frame of {0} bytes exceeds the size limit")]
    FrameTooLarge(usize),

    #[error("{0}")]
    Invalid(String),
}
