use std::collections::HashMap;

use sha2::{Digest, Sha256};

pub type Fingerprint = [u8; 32];

/// Remembers a hash of the last change token seen per category.
#[derive(Debug, Default, Clone)]
pub struct ChangeDetector {
    hashes: HashMap<String, Fingerprint>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fingerprint(token: &str) -> Fingerprint {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(token.as_bytes()));
        out
    }

    /// Record `token` for `category` and report whether it differs from the last one.
    ///
    /// The first observation of a category only records a baseline.
    pub fn observe(&mut self, category: &str, token: &str) -> bool {
        let hash = Self::fingerprint(token);
        match self.hashes.insert(category.to_string(), hash) {
            Some(previous) => previous != hash,
            None => false,
        }
    }

    pub fn has_baseline(&self, category: &str) -> bool {
        self.hashes.contains_key(category)
    }

    /// Forget a category that is no longer listed
    pub fn forget(&mut self, category: &str) {
        self.hashes.remove(category);
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.hashes.keys().map(String::as_str)
    }
}
