//! age-backed keyring.
//!
//! Layout on disk:
//!
//! ```text
//! <dir>/
//! ├── pubring.toml          # every known public key with its labels
//! └── private/
//!     └── <FINGERPRINT>.key # age identity, mode 0600
//! ```
//!
//! Ciphertext is ASCII-armored age wrapped in an [`Envelope`] that lists
//! the recipient fingerprints.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ::age::x25519;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use super::{Envelope, ImportOutcome, Keyring};
use crate::core::constants::{PRIVATE_DIR, PRIVATE_KEY_MODE, PUBRING_FILE};
use crate::core::domain::{fingerprint_of, key_id_of, PublicKeyRecord, X25519_BITS};
use crate::core::types::Fingerprint;
use crate::error::{KeyringError, Result};

const SECRET_KEY_PREFIX: &str = "AGE-SECRET-KEY-";
const PUBLIC_KEY_PREFIX: &str = "age1";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Pubring {
    #[serde(default, rename = "key")]
    keys: Vec<KeyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyEntry {
    recipient: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<DateTime<Utc>>,
    #[serde(default)]
    trusted: bool,
}

impl KeyEntry {
    fn fingerprint(&self) -> Fingerprint {
        fingerprint_of(&self.recipient)
    }
}

/// Labels collected from `# key: value` comments ahead of a key line.
#[derive(Debug, Default)]
struct Labels {
    name: String,
    email: String,
    created: Option<DateTime<Utc>>,
    expires: Option<DateTime<Utc>>,
}

impl Labels {
    fn absorb(&mut self, comment: &str) -> Result<()> {
        let Some((key, value)) = comment.split_once(':') else {
            return Ok(());
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => self.name = value.to_string(),
            "email" => self.email = value.to_string(),
            "created" => self.created = Some(parse_timestamp(value)?),
            "expires" => self.expires = Some(parse_timestamp(value)?),
            _ => {}
        }
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| KeyringError::ImportFailed(format!("bad timestamp '{}': {}", value, e)).into())
}

/// One key parsed from import material.
enum Parsed {
    Public(x25519::Recipient, Labels),
    Secret(x25519::Identity, Labels),
}

/// Keyring stored as files under one directory.
pub struct AgeKeyring {
    dir: PathBuf,
    entries: Vec<KeyEntry>,
    identities: BTreeMap<Fingerprint, x25519::Identity>,
}

impl AgeKeyring {
    /// Open the keyring at `dir`. A missing directory is an empty keyring.
    pub fn open(dir: &Path) -> Result<Self> {
        debug!(path = %dir.display(), "opening keyring");

        let pubring = dir.join(PUBRING_FILE);
        let entries = if pubring.exists() {
            let contents = fs::read_to_string(&pubring).map_err(KeyringError::Storage)?;
            let ring: Pubring =
                toml::from_str(&contents).map_err(|e| KeyringError::Pubring(e.to_string()))?;
            ring.keys
        } else {
            Vec::new()
        };

        let mut keyring = Self {
            dir: dir.to_path_buf(),
            entries,
            identities: BTreeMap::new(),
        };
        keyring.load_identities()?;

        debug!(
            public = keyring.entries.len(),
            secret = keyring.identities.len(),
            "keyring loaded"
        );
        Ok(keyring)
    }

    /// Keyring directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generate a fresh x25519 key, store both halves and trust it.
    pub fn generate(
        &mut self,
        name: &str,
        email: &str,
        expires: Option<DateTime<Utc>>,
    ) -> Result<PublicKeyRecord> {
        let identity = x25519::Identity::generate();
        let labels = Labels {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            created: Some(Utc::now()),
            expires,
        };
        let fingerprint = self.adopt_identity(identity, &labels)?;
        self.save()?;

        debug!(fingerprint = %fingerprint, "generated key");
        self.record_of(&fingerprint)
    }

    fn load_identities(&mut self) -> Result<()> {
        let private = self.dir.join(PRIVATE_DIR);
        if !private.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&private).map_err(KeyringError::Storage)? {
            let path = entry.map_err(KeyringError::Storage)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("key") {
                continue;
            }

            #[cfg(unix)]
            warn_if_loose(&path);

            let contents =
                Zeroizing::new(fs::read_to_string(&path).map_err(KeyringError::Storage)?);
            let identity = contents
                .lines()
                .map(str::trim)
                .find(|l| l.starts_with(SECRET_KEY_PREFIX))
                .ok_or_else(|| {
                    KeyringError::InvalidKey(format!("{}: no secret key", path.display()))
                })?
                .parse::<x25519::Identity>()
                .map_err(|e| KeyringError::InvalidKey(format!("{}: {}", path.display(), e)))?;

            let recipient = identity.to_public().to_string();
            let fingerprint = fingerprint_of(&recipient);
            if self.entry(&fingerprint).is_none() {
                self.entries.push(KeyEntry {
                    recipient,
                    name: String::new(),
                    email: String::new(),
                    created: Utc::now(),
                    expires: None,
                    trusted: true,
                });
            }
            trace!(fingerprint = %fingerprint, "loaded secret key");
            self.identities.insert(fingerprint, identity);
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        debug!("saving keyring");
        fs::create_dir_all(&self.dir).map_err(KeyringError::Storage)?;
        let ring = Pubring {
            keys: self.entries.clone(),
        };
        let contents =
            toml::to_string_pretty(&ring).map_err(|e| KeyringError::Pubring(e.to_string()))?;
        fs::write(self.dir.join(PUBRING_FILE), contents).map_err(KeyringError::Storage)?;
        Ok(())
    }

    fn private_path(&self, fingerprint: &str) -> PathBuf {
        self.dir
            .join(PRIVATE_DIR)
            .join(format!("{}.key", fingerprint))
    }

    fn write_identity(&self, fingerprint: &str, identity: &x25519::Identity) -> Result<()> {
        use ::age::secrecy::ExposeSecret;

        let dir = self.dir.join(PRIVATE_DIR);
        fs::create_dir_all(&dir).map_err(KeyringError::Storage)?;

        let path = self.private_path(fingerprint);
        let secret = identity.to_string();
        let contents = Zeroizing::new(format!(
            "# created: {}\n# public key: {}\n{}\n",
            Utc::now().to_rfc3339(),
            identity.to_public(),
            secret.expose_secret()
        ));
        fs::write(&path, contents.as_bytes()).map_err(KeyringError::Storage)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(PRIVATE_KEY_MODE))
                .map_err(KeyringError::Storage)?;
        }

        debug!(path = %path.display(), "secret key saved");
        Ok(())
    }

    fn entry(&self, fingerprint: &str) -> Option<&KeyEntry> {
        self.entries.iter().find(|e| e.fingerprint() == fingerprint)
    }

    fn entry_mut(&mut self, fingerprint: &str) -> Option<&mut KeyEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.fingerprint() == fingerprint)
    }

    fn record(&self, entry: &KeyEntry) -> PublicKeyRecord {
        let fingerprint = entry.fingerprint();
        PublicKeyRecord {
            key_id: key_id_of(&fingerprint),
            can_decrypt: self.identities.contains_key(&fingerprint),
            fingerprint,
            name: entry.name.clone(),
            email: entry.email.clone(),
            recipient: entry.recipient.clone(),
            subkey: false,
            bits: X25519_BITS,
            created: entry.created,
            expires: entry.expires,
            can_encrypt: true,
            trusted: entry.trusted,
        }
    }

    fn record_of(&self, fingerprint: &str) -> Result<PublicKeyRecord> {
        self.entry(fingerprint)
            .map(|e| self.record(e))
            .ok_or_else(|| KeyringError::KeyNotFound(fingerprint.to_string()).into())
    }

    fn adopt_public(&mut self, recipient: String, labels: &Labels, trusted: bool) -> Fingerprint {
        let fingerprint = fingerprint_of(&recipient);
        if let Some(existing) = self.entry_mut(&fingerprint) {
            if existing.name.is_empty() {
                existing.name = labels.name.clone();
            }
            if existing.email.is_empty() {
                existing.email = labels.email.clone();
            }
        } else {
            self.entries.push(KeyEntry {
                recipient,
                name: labels.name.clone(),
                email: labels.email.clone(),
                created: labels.created.unwrap_or_else(Utc::now),
                expires: labels.expires,
                trusted,
            });
        }
        fingerprint
    }

    fn adopt_identity(&mut self, identity: x25519::Identity, labels: &Labels) -> Result<Fingerprint> {
        let fingerprint = self.adopt_public(identity.to_public().to_string(), labels, true);
        if !self.identities.contains_key(&fingerprint) {
            self.write_identity(&fingerprint, &identity)?;
            self.identities.insert(fingerprint.clone(), identity);
        }
        Ok(fingerprint)
    }

    fn parse_material(text: &str) -> Result<Vec<Parsed>> {
        let mut parsed = Vec::new();
        let mut labels = Labels::default();

        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                labels.absorb(comment)?;
                continue;
            }

            let bad = |e: &str| KeyringError::ImportFailed(format!("line {}: {}", n + 1, e));
            if line.starts_with(SECRET_KEY_PREFIX) {
                let identity = line.parse::<x25519::Identity>().map_err(bad)?;
                parsed.push(Parsed::Secret(identity, std::mem::take(&mut labels)));
            } else if line.starts_with(PUBLIC_KEY_PREFIX) {
                let recipient = line.parse::<x25519::Recipient>().map_err(bad)?;
                parsed.push(Parsed::Public(recipient, std::mem::take(&mut labels)));
            } else {
                return Err(bad("unrecognized key material").into());
            }
        }

        if parsed.is_empty() {
            return Err(KeyringError::ImportFailed("no keys found".to_string()).into());
        }
        Ok(parsed)
    }
}

/// Resolve an argument to a canonical fingerprint.
fn normalize(fingerprint: &str) -> Fingerprint {
    fingerprint.trim().to_ascii_uppercase()
}

fn seal_age(plaintext: &[u8], recipients: &[x25519::Recipient]) -> Result<String> {
    let encryptor =
        ::age::Encryptor::with_recipients(recipients.iter().map(|r| r as &dyn ::age::Recipient))
            .map_err(|e| KeyringError::EncryptionFailed(e.to_string()))?;

    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(::age::armor::ArmoredWriter::wrap_output(
            &mut encrypted,
            ::age::armor::Format::AsciiArmor,
        )?)
        .map_err(|e| KeyringError::EncryptionFailed(e.to_string()))?;

    writer.write_all(plaintext)?;
    let armored = writer
        .finish()
        .map_err(|e| KeyringError::EncryptionFailed(e.to_string()))?;
    armored
        .finish()
        .map_err(|e| KeyringError::EncryptionFailed(format!("armor: {}", e)))?;

    String::from_utf8(encrypted)
        .map_err(|e| KeyringError::EncryptionFailed(format!("UTF-8 error: {}", e)).into())
}

#[cfg(unix)]
fn warn_if_loose(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode != PRIVATE_KEY_MODE {
            warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode),
                "insecure key file permissions"
            );
        }
    }
}

impl Keyring for AgeKeyring {
    fn list_keys(&self) -> Result<Vec<PublicKeyRecord>> {
        Ok(self.entries.iter().map(|e| self.record(e)).collect())
    }

    fn encrypt(&self, plaintext: &[u8], recipients: &[Fingerprint]) -> Result<Vec<u8>> {
        if recipients.is_empty() {
            return Err(KeyringError::EncryptionFailed("no recipients".to_string()).into());
        }

        let mut fingerprints: Vec<Fingerprint> = Vec::with_capacity(recipients.len());
        let mut keys = Vec::with_capacity(recipients.len());
        for fingerprint in recipients.iter().map(|f| normalize(f)) {
            if fingerprints.contains(&fingerprint) {
                continue;
            }
            let entry = self
                .entry(&fingerprint)
                .ok_or_else(|| KeyringError::UnknownRecipient(fingerprint.clone()))?;
            if !self.record(entry).usable() {
                return Err(KeyringError::UnknownRecipient(fingerprint).into());
            }
            let key = entry
                .recipient
                .parse::<x25519::Recipient>()
                .map_err(|e| KeyringError::EncryptionFailed(format!("{}: {}", fingerprint, e)))?;
            keys.push(key);
            fingerprints.push(fingerprint);
        }

        trace!(
            recipients = keys.len(),
            plaintext_len = plaintext.len(),
            "encrypting"
        );
        let armored = seal_age(plaintext, &keys)?;
        let sealed = Envelope::new(fingerprints, armored).seal()?;
        trace!(ciphertext_len = sealed.len(), "encrypted");
        Ok(sealed)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting");

        let armored = match Envelope::parse(ciphertext) {
            Some(envelope) => envelope.age.into_bytes(),
            None if Envelope::is_raw_age(ciphertext) => ciphertext.to_vec(),
            None => {
                return Err(
                    KeyringError::DecryptionFailed("unrecognized ciphertext".to_string()).into(),
                )
            }
        };
        if self.identities.is_empty() {
            return Err(KeyringError::DecryptionFailed("no secret keys held".to_string()).into());
        }

        let decryptor = ::age::Decryptor::new(::age::armor::ArmoredReader::new(armored.as_slice()))
            .map_err(|e| KeyringError::DecryptionFailed(e.to_string()))?;
        let mut reader = decryptor
            .decrypt(
                self.identities
                    .values()
                    .map(|i| i as &dyn ::age::Identity),
            )
            .map_err(|e| KeyringError::DecryptionFailed(e.to_string()))?;

        let mut plaintext = Zeroizing::new(Vec::new());
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| KeyringError::DecryptionFailed(e.to_string()))?;

        trace!(plaintext_len = plaintext.len(), "decrypted");
        Ok(plaintext)
    }

    fn import(&mut self, material: &[u8]) -> Result<ImportOutcome> {
        let text = Zeroizing::new(
            String::from_utf8(material.to_vec())
                .map_err(|_| KeyringError::ImportFailed("key material is not UTF-8".to_string()))?,
        );
        let parsed = Self::parse_material(&text)?;

        let public_before: BTreeSet<Fingerprint> =
            self.entries.iter().map(KeyEntry::fingerprint).collect();
        let secret_before: BTreeSet<Fingerprint> = self.identities.keys().cloned().collect();

        for key in parsed {
            match key {
                Parsed::Public(recipient, labels) => {
                    self.adopt_public(recipient.to_string(), &labels, false);
                }
                Parsed::Secret(identity, labels) => {
                    self.adopt_identity(identity, &labels)?;
                }
            }
        }
        self.save()?;

        let outcome = ImportOutcome {
            public: self
                .entries
                .iter()
                .map(KeyEntry::fingerprint)
                .filter(|f| !public_before.contains(f))
                .collect(),
            secret: self
                .identities
                .keys()
                .filter(|f| !secret_before.contains(*f))
                .cloned()
                .collect(),
        };
        debug!(
            public = outcome.public.len(),
            secret = outcome.secret.len(),
            "imported keys"
        );
        Ok(outcome)
    }

    fn set_trust(&mut self, fingerprint: &str, trusted: bool) -> Result<()> {
        let fingerprint = normalize(fingerprint);
        let entry = self
            .entry_mut(&fingerprint)
            .ok_or_else(|| KeyringError::KeyNotFound(fingerprint.clone()))?;
        entry.trusted = trusted;
        self.save()
    }

    fn delete(&mut self, fingerprint: &str) -> Result<()> {
        let fingerprint = normalize(fingerprint);
        if self.entry(&fingerprint).is_none() {
            return Err(KeyringError::KeyNotFound(fingerprint).into());
        }
        if self.identities.contains_key(&fingerprint) {
            return Err(KeyringError::SecretKeyPresent(fingerprint).into());
        }
        self.entries.retain(|e| e.fingerprint() != fingerprint);
        debug!(fingerprint = %fingerprint, "deleted public key");
        self.save()
    }

    fn delete_secret(&mut self, fingerprint: &str) -> Result<()> {
        let fingerprint = normalize(fingerprint);
        if self.identities.remove(&fingerprint).is_none() {
            return Err(KeyringError::KeyNotFound(fingerprint).into());
        }
        let path = self.private_path(&fingerprint);
        if path.exists() {
            fs::remove_file(&path).map_err(KeyringError::Storage)?;
        }
        debug!(fingerprint = %fingerprint, "deleted secret key");
        Ok(())
    }

    fn export(&self, fingerprint: &str) -> Result<String> {
        let fingerprint = normalize(fingerprint);
        let entry = self
            .entry(&fingerprint)
            .ok_or_else(|| KeyringError::KeyNotFound(fingerprint.clone()))?;

        let mut out = String::new();
        if !entry.name.is_empty() {
            out.push_str(&format!("# name: {}\n", entry.name));
        }
        if !entry.email.is_empty() {
            out.push_str(&format!("# email: {}\n", entry.email));
        }
        out.push_str(&format!("# created: {}\n", entry.created.to_rfc3339()));
        if let Some(expires) = entry.expires {
            out.push_str(&format!("# expires: {}\n", expires.to_rfc3339()));
        }
        out.push_str(&entry.recipient);
        out.push('\n');
        Ok(out)
    }

    fn recipients_of(&self, ciphertext: &[u8]) -> Result<Vec<String>> {
        match Envelope::parse(ciphertext) {
            Some(envelope) => Ok(envelope.recipients),
            None if Envelope::is_raw_age(ciphertext) => Ok(Vec::new()),
            None => Err(KeyringError::DecryptionFailed("unrecognized ciphertext".to_string()).into()),
        }
    }
}

impl fmt::Debug for AgeKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgeKeyring")
            .field("dir", &self.dir)
            .field("public", &self.entries.len())
            .field("secret", &self.identities.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Duration;
    use tempfile::TempDir;

    fn keyring() -> (TempDir, AgeKeyring) {
        let tmp = TempDir::new().unwrap();
        let keyring = AgeKeyring::open(tmp.path()).unwrap();
        (tmp, keyring)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let (_tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "alice@example.com", None).unwrap();

        let ciphertext = keyring.encrypt(b"p@ss\nuser: alice\n", &[key.fingerprint]).unwrap();
        assert!(!ciphertext.windows(4).any(|w| w == b"p@ss"));

        let plaintext = keyring.decrypt(&ciphertext).unwrap();
        assert_eq!(plaintext.as_slice(), b"p@ss\nuser: alice\n");
    }

    #[test]
    fn test_encrypt_large_payload() {
        let (_tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "", None).unwrap();
        let payload = vec![b'A'; 10_000];
        let ciphertext = keyring.encrypt(&payload, &[key.fingerprint]).unwrap();
        assert_eq!(keyring.decrypt(&ciphertext).unwrap().len(), 10_000);
    }

    #[test]
    fn test_every_recipient_can_decrypt() {
        let (_a_dir, mut alice) = keyring();
        let (_b_dir, mut bob) = keyring();
        let a = alice.generate("Alice", "a@example.com", None).unwrap();
        let b = bob.generate("Bob", "b@example.com", None).unwrap();
        alice.import(bob.export(&b.fingerprint).unwrap().as_bytes()).unwrap();

        let ciphertext = alice
            .encrypt(b"shared", &[a.fingerprint.clone(), b.fingerprint.clone()])
            .unwrap();
        assert_eq!(alice.decrypt(&ciphertext).unwrap().as_slice(), b"shared");
        assert_eq!(bob.decrypt(&ciphertext).unwrap().as_slice(), b"shared");
        assert_eq!(
            alice.recipients_of(&ciphertext).unwrap(),
            vec![a.fingerprint, b.fingerprint]
        );
    }

    #[test]
    fn test_fingerprints_are_case_insensitive() {
        let (_tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "", None).unwrap();
        let ciphertext = keyring
            .encrypt(b"x", &[key.fingerprint.to_lowercase()])
            .unwrap();
        assert_eq!(keyring.recipients_of(&ciphertext).unwrap(), vec![key.fingerprint]);
    }

    #[test]
    fn test_encrypt_rejects_empty_and_unknown() {
        let (_tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "", None).unwrap();

        let err = keyring.encrypt(b"x", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncryptionFailed);

        let err = keyring
            .encrypt(b"x", &[key.fingerprint, "0".repeat(40)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncryptionFailed);
    }

    #[test]
    fn test_encrypt_rejects_expired() {
        let (_tmp, mut keyring) = keyring();
        let key = keyring
            .generate("Old", "", Some(Utc::now() - Duration::days(1)))
            .unwrap();
        let err = keyring.encrypt(b"x", &[key.fingerprint]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncryptionFailed);
    }

    #[test]
    fn test_decrypt_without_matching_key() {
        let (_a_dir, alice) = keyring();
        let (_b_dir, mut bob) = keyring();
        let b = bob.generate("Bob", "", None).unwrap();
        let ciphertext = bob.encrypt(b"x", &[b.fingerprint]).unwrap();

        let err = alice.decrypt(&ciphertext).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecryptionFailed);

        let err = bob.decrypt(b"not a ciphertext").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecryptionFailed);
    }

    #[test]
    fn test_decrypt_detects_tampering() {
        let (_tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "", None).unwrap();
        let ciphertext = keyring.encrypt(b"secret", &[key.fingerprint]).unwrap();
        let mut envelope = Envelope::parse(&ciphertext).unwrap();
        let mid = envelope.age.len() / 2;
        let flipped = if &envelope.age[mid..mid + 1] == "A" { "B" } else { "A" };
        envelope.age.replace_range(mid..mid + 1, flipped);

        let err = keyring.decrypt(&envelope.seal().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecryptionFailed);
    }

    #[test]
    fn test_reopen_restores_keys() {
        let (tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "alice@example.com", None).unwrap();
        let ciphertext = keyring.encrypt(b"x", &[key.fingerprint.clone()]).unwrap();

        let reopened = AgeKeyring::open(tmp.path()).unwrap();
        let keys = reopened.list_keys().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].fingerprint, key.fingerprint);
        assert_eq!(keys[0].email, "alice@example.com");
        assert!(keys[0].can_decrypt && keys[0].trusted);
        assert_eq!(reopened.decrypt(&ciphertext).unwrap().as_slice(), b"x");
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "", None).unwrap();
        let path = tmp
            .path()
            .join(PRIVATE_DIR)
            .join(format!("{}.key", key.fingerprint));
        let mode = fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_import_identity_file() {
        let (_tmp, mut keyring) = keyring();
        let identity = x25519::Identity::generate();
        let material = {
            use ::age::secrecy::ExposeSecret;
            format!(
                "# created: 2024-01-02T03:04:05+00:00\n# public key: {}\n{}\n",
                identity.to_public(),
                identity.to_string().expose_secret()
            )
        };

        let outcome = keyring.import(material.as_bytes()).unwrap();
        let fingerprint = fingerprint_of(&identity.to_public().to_string());
        assert_eq!(outcome.public, vec![fingerprint.clone()]);
        assert_eq!(outcome.secret, vec![fingerprint.clone()]);

        let again = keyring.import(material.as_bytes()).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_export_import_keeps_labels() {
        let (_a_dir, mut alice) = keyring();
        let (_b_dir, mut bob) = keyring();
        let expires = Utc::now() + Duration::days(30);
        let key = alice.generate("Alice", "alice@example.com", Some(expires)).unwrap();

        let outcome = bob.import(alice.export(&key.fingerprint).unwrap().as_bytes()).unwrap();
        assert_eq!(outcome.public, vec![key.fingerprint.clone()]);
        assert!(outcome.secret.is_empty());

        let imported = &bob.list_keys().unwrap()[0];
        assert_eq!(imported.name, "Alice");
        assert_eq!(imported.email, "alice@example.com");
        assert!(imported.expires.is_some());
        assert!(!imported.trusted);
        assert!(!imported.can_decrypt);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let (_tmp, mut keyring) = keyring();
        let cases: [&[u8]; 4] = [b"", b"# only comments\n", b"hello world\n", b"age1notakey\n"];
        for bad in cases {
            let err = keyring.import(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ImportFailed);
        }
        assert!(keyring.list_keys().unwrap().is_empty());
    }

    #[test]
    fn test_delete_refused_while_secret_held() {
        let (_tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "", None).unwrap();
        let ciphertext = keyring.encrypt(b"x", &[key.fingerprint.clone()]).unwrap();

        assert!(keyring.delete(&key.fingerprint).is_err());
        keyring.delete_secret(&key.fingerprint).unwrap();
        assert_eq!(
            keyring.decrypt(&ciphertext).unwrap_err().kind(),
            ErrorKind::DecryptionFailed
        );
        keyring.delete(&key.fingerprint).unwrap();
        assert!(keyring.list_keys().unwrap().is_empty());
    }

    #[test]
    fn test_set_trust_persists() {
        let (tmp, mut keyring) = keyring();
        let key = keyring.generate("Alice", "", None).unwrap();
        keyring.set_trust(&key.fingerprint, false).unwrap();

        let reopened = AgeKeyring::open(tmp.path()).unwrap();
        assert!(!reopened.list_keys().unwrap()[0].trusted);
        assert_eq!(
            keyring.set_trust(&"F".repeat(40), true).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
