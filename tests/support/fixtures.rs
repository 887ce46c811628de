//! Stores and keys for in-process tests.

use cellar::core::constants::DEFAULT_MODE;
use cellar::core::domain::{Fields, PublicKeyRecord, SecretRecord};
use cellar::core::history::{MemoryStore, VersionedStore};
use cellar::core::keyring::{AgeKeyring, Keyring};
use cellar::core::store::PasswordStore;
use tempfile::TempDir;

pub type MemStore = PasswordStore<AgeKeyring, MemoryStore>;

/// A memory-backed store whose root is encrypted to `keys[0]`.
pub struct Fixture {
    pub tmp: TempDir,
    pub store: MemStore,
    pub keys: Vec<PublicKeyRecord>,
}

impl Fixture {
    /// Generate `count` keys (k0, k1, ...) and init the root for the first.
    pub fn new(count: usize) -> Self {
        let tmp = TempDir::new().expect("failed to create temp keyring");
        let mut keyring = AgeKeyring::open(tmp.path()).expect("failed to open keyring");
        let keys: Vec<PublicKeyRecord> = (0..count.max(1))
            .map(|i| {
                keyring
                    .generate(&format!("k{}", i), &format!("k{}@example.com", i), None)
                    .expect("failed to generate key")
            })
            .collect();
        let store = PasswordStore::init(keyring, MemoryStore::new(), &[keys[0].fingerprint.clone()])
            .expect("failed to init store");
        Self { tmp, store, keys }
    }

    pub fn fp(&self, i: usize) -> String {
        self.keys[i].fingerprint.clone()
    }

    /// Create secrets with no fields.
    pub fn create(&mut self, paths: &[&str]) {
        for path in paths {
            self.store
                .create(path, &record(&format!("secret of {}", path), &[]), DEFAULT_MODE)
                .expect("failed to create secret");
        }
    }

    /// Fingerprints embedded in a secret's ciphertext.
    pub fn embedded(&self, path: &str) -> Vec<String> {
        let ciphertext = self.raw(path);
        self.store
            .keyring()
            .recipients_of(&ciphertext)
            .expect("unreadable envelope")
    }

    /// Raw ciphertext of a secret.
    pub fn raw(&self, path: &str) -> Vec<u8> {
        self.store
            .store()
            .read(&format!("{}.age", path))
            .expect("secret file not tracked")
    }

    /// Every tracked file with its contents.
    pub fn snapshot(&self) -> Vec<(String, Vec<u8>)> {
        let history = self.store.store();
        let mut paths = history.list_paths().expect("list failed");
        paths.sort();
        paths
            .into_iter()
            .map(|p| {
                let contents = history.read(&p).expect("read failed");
                (p, contents)
            })
            .collect()
    }
}

pub fn record(secret: &str, pairs: &[(&str, &str)]) -> SecretRecord {
    let mut fields = Fields::new();
    for (k, v) in pairs {
        fields.set(k, v).expect("invalid field");
    }
    SecretRecord::new(secret, fields).expect("invalid record")
}
