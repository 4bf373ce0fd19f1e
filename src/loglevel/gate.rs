//! Change detection for effective level maps.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::loglevel::level::LevelMap;

/// 128-bit content digest of a level map. Used for equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Digest the map serialized as JSON with keys in sorted order.
pub fn fingerprint(levels: &LevelMap) -> Fingerprint {
    let canonical: BTreeMap<&str, &str> = levels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let serialized = serde_json::to_vec(&canonical).expect("string map always serializes");

    let digest = Sha256::digest(&serialized);
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    Fingerprint(out)
}

pub fn should_apply(new: &Fingerprint, last: Option<&Fingerprint>) -> bool {
    last != Some(new)
}

/// Remembers the fingerprint of the last successfully applied map.
#[derive(Debug, Default)]
pub struct ChangeGate {
    last: Option<Fingerprint>,
}

impl ChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_apply(&self, new: &Fingerprint) -> bool {
        should_apply(new, self.last.as_ref())
    }

    /// Record a fingerprint once its map has been applied.
    pub fn commit(&mut self, applied: Fingerprint) {
        self.last = Some(applied);
    }

    pub fn last(&self) -> Option<&Fingerprint> {
        self.last.as_ref()
    }
}
