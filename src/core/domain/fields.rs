//! Optional `key: value` fields stored after the primary secret.
//!
//! Keys and values are trimmed; keys may not contain `:`. An embedded
//! newline is written as `\n\t`, so a physical line starting with a tab
//! continues the previous value. Fields serialize sorted by key, which
//! keeps the plaintext of identical records byte-identical.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Result, ValidationError};

const CONTINUATION: &str = "\n\t";

/// Keys whose values name the account a secret belongs to.
const USERNAME_KEYS: &[&str] = &["username", "user", "login"];

/// Ordered, case-sensitive field map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, String>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a serialized field block.
    ///
    /// Never fails: a line without a colon becomes a key with an empty
    /// value and blank lines are ignored.
    pub fn parse(block: &str) -> Self {
        let mut map = BTreeMap::new();
        for item in split_items(block) {
            let item = item.replace(CONTINUATION, "\n");
            let (key, value) = match item.split_once(':') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (item.trim(), ""),
            };
            if key.is_empty() && value.is_empty() {
                continue;
            }
            map.insert(key.to_string(), value.to_string());
        }
        Self(map)
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::InvalidFieldKey {
                key: key.to_string(),
                reason: "empty".to_string(),
            }
            .into());
        }
        if key.contains(':') {
            return Err(ValidationError::InvalidFieldKey {
                key: key.to_string(),
                reason: "contains ':'".to_string(),
            }
            .into());
        }
        self.0.insert(key.to_string(), value.trim().to_string());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values of the `username`, `user` and `login` fields, any case.
    pub fn usernames(&self) -> Vec<&str> {
        self.iter()
            .filter(|(k, _)| USERNAME_KEYS.iter().any(|u| k.eq_ignore_ascii_case(u)))
            .map(|(_, v)| v)
            .collect()
    }

    /// Canonical serialized form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.0 {
            let key = key.replace('\n', CONTINUATION);
            if value.is_empty() {
                writeln!(f, "{}:", key)?;
            } else {
                writeln!(f, "{}: {}", key, value.replace('\n', CONTINUATION))?;
            }
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, String>> for Fields {
    type Error = crate::error::Error;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self> {
        let mut fields = Self::new();
        for (key, value) in &map {
            fields.set(key, value)?;
        }
        Ok(fields)
    }
}

/// Split at newlines that are not followed by a tab.
fn split_items(block: &str) -> Vec<&str> {
    let bytes = block.as_bytes();
    let mut items = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' && bytes.get(i + 1) != Some(&b'\t') {
            items.push(&block[start..i]);
            start = i + 1;
        }
    }
    items.push(&block[start..]);
    items
}
