//! Secret CRUD.

use tracing::debug;

use super::PasswordStore;
use crate::core::domain::SecretRecord;
use crate::core::history::{Transaction, VersionedStore};
use crate::core::keyring::Keyring;
use crate::core::path;
use crate::error::{Error, ErrorKind, Result, SecretError};

impl<K: Keyring, S: VersionedStore> PasswordStore<K, S> {
    /// Every secret path, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self
            .store
            .list_paths()?
            .iter()
            .filter_map(|f| path::secret_of(f))
            .map(str::to_string)
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Whether a secret exists at `path`.
    pub fn contains(&self, path: &str) -> Result<bool> {
        let path = path::secret(path)?;
        self.exists(&path)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let file = path::secret_file(path);
        Ok(self.store.list_paths()?.contains(&file))
    }

    /// Encrypt a record for the domain governing `path`.
    fn seal(&self, path: &str, record: &SecretRecord) -> Result<Vec<u8>> {
        let recipients = self.domains.recipients_for(path);
        debug!(path, recipients = recipients.len(), "encrypting secret");
        self.keyring.encrypt(&record.encode(), recipients)
    }

    /// Add a new secret.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if a secret occupies `path`; encryption and commit
    /// failures leave the store unchanged.
    pub fn create(&mut self, path: &str, record: &SecretRecord, mode: u32) -> Result<()> {
        let path = path::secret(path)?;
        self.create_at(&path, record, mode)
            .map_err(|e| e.during("create", &path))
    }

    fn create_at(&mut self, path: &str, record: &SecretRecord, mode: u32) -> Result<()> {
        if self.exists(path)? {
            return Err(SecretError::AlreadyExists(path.to_string()).into());
        }
        let ciphertext = self.seal(path, record)?;

        let mut tx = Transaction::begin(&mut self.store);
        tx.stage_create(&path::secret_file(path), ciphertext, mode)?;
        tx.commit(&format!("created {}", path))
    }

    /// Replace the content of an existing secret.
    ///
    /// # Errors
    ///
    /// `NotFound` if no secret exists at `path`.
    pub fn update(&mut self, path: &str, record: &SecretRecord) -> Result<()> {
        let path = path::secret(path)?;
        self.update_at(&path, record)
            .map_err(|e| e.during("update", &path))
    }

    fn update_at(&mut self, path: &str, record: &SecretRecord) -> Result<()> {
        if !self.exists(path)? {
            return Err(SecretError::NotFound(path.to_string()).into());
        }
        let ciphertext = self.seal(path, record)?;

        let mut tx = Transaction::begin(&mut self.store);
        tx.stage_update(&path::secret_file(path), ciphertext)?;
        tx.commit(&format!("updated {}", path))
    }

    /// Create or update.
    pub fn write(&mut self, path: &str, record: &SecretRecord, mode: u32) -> Result<()> {
        if self.contains(path)? {
            self.update(path, record)
        } else {
            self.create(path, record, mode)
        }
    }

    /// Move a secret and give it new content in one commit.
    ///
    /// The content is encrypted for the domain governing `new`.
    pub fn replace(&mut self, old: &str, new: &str, record: &SecretRecord) -> Result<()> {
        let old = path::secret(old)?;
        let new = path::secret(new)?;
        if old == new {
            return self.update(&old, record);
        }
        self.replace_at(&old, &new, record)
            .map_err(|e| e.during("replace", &old))
    }

    fn replace_at(&mut self, old: &str, new: &str, record: &SecretRecord) -> Result<()> {
        if !self.exists(old)? {
            return Err(SecretError::NotFound(old.to_string()).into());
        }
        if self.exists(new)? {
            return Err(SecretError::AlreadyExists(new.to_string()).into());
        }
        let ciphertext = self.seal(new, record)?;
        let new_file = path::secret_file(new);

        let mut tx = Transaction::begin(&mut self.store);
        tx.stage_rename(&path::secret_file(old), &new_file)?;
        tx.stage_update(&new_file, ciphertext)?;
        tx.commit(&format!("replaced {} with {}", old, new))
    }

    /// Move a secret.
    ///
    /// The ciphertext moves unchanged when both paths share a recipient
    /// set; otherwise it is re-encrypted for the new domain.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let old = path::secret(old)?;
        let new = path::secret(new)?;
        if old == new {
            return Ok(());
        }
        self.rename_at(&old, &new)
            .map_err(|e| e.during("rename", &old))
    }

    fn rename_at(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.exists(old)? {
            return Err(SecretError::NotFound(old.to_string()).into());
        }
        if self.exists(new)? {
            return Err(SecretError::AlreadyExists(new.to_string()).into());
        }

        let mut from = self.domains.recipients_for(old).to_vec();
        let mut to = self.domains.recipients_for(new).to_vec();
        from.sort();
        to.sort();
        let old_file = path::secret_file(old);
        let new_file = path::secret_file(new);

        let reencrypted = if from == to {
            None
        } else {
            debug!(old, new, "recipients differ, re-encrypting");
            let plaintext = self.keyring.decrypt(&self.store.read(&old_file)?)?;
            Some(self.keyring.encrypt(&plaintext, self.domains.recipients_for(new))?)
        };

        let mut tx = Transaction::begin(&mut self.store);
        tx.stage_rename(&old_file, &new_file)?;
        if let Some(ciphertext) = reencrypted {
            tx.stage_update(&new_file, ciphertext)?;
        }
        tx.commit(&format!("renamed {} to {}", old, new))
    }

    /// Decrypt and parse a secret.
    ///
    /// # Errors
    ///
    /// `NotFound` or `DecryptionFailed`.
    pub fn read(&self, path: &str) -> Result<SecretRecord> {
        let path = path::secret(path)?;
        self.read_at(&path).map_err(|e| e.during("read", &path))
    }

    fn read_at(&self, path: &str) -> Result<SecretRecord> {
        let ciphertext = self
            .store
            .read(&path::secret_file(path))
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::from(SecretError::NotFound(path.to_string())),
                _ => e,
            })?;
        let plaintext = self.keyring.decrypt(&ciphertext)?;
        SecretRecord::decode(&plaintext)
    }

    /// Remove a secret.
    pub fn delete(&mut self, path: &str) -> Result<()> {
        let path = path::secret(path)?;
        self.delete_at(&path).map_err(|e| e.during("delete", &path))
    }

    fn delete_at(&mut self, path: &str) -> Result<()> {
        if !self.exists(path)? {
            return Err(SecretError::NotFound(path.to_string()).into());
        }
        let mut tx = Transaction::begin(&mut self.store);
        tx.stage_remove(&path::secret_file(path))?;
        tx.commit(&format!("deleted {}", path))
    }
}
