//! Caller identities.
//!
//! An `Identity` is the principal behind every vault operation. The vault
//! never verifies signatures: whoever hosts it decides which identity is
//! calling and the vault trusts that completely.
//!
//! Identities are 32 opaque bytes. They are only ever compared and used as
//! map keys, so nothing else is attached to them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Domain separator for label-derived identities.
const LABEL_DOMAIN: &[u8] = b"quorum-vault-identity-v1";

/// A 32-byte opaque principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity([u8; 32]);

impl Identity {
    /// Create from bytes.
    ///
    /// Only the first 32 bytes are used; shorter input is zero-padded.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut id = [0u8; 32];
        let len = bytes.len().min(32);
        id[..len].copy_from_slice(&bytes[..len]);
        Self(id)
    }

    /// Derive a stable identity from a human label ("alice", "guardian-1").
    ///
    /// Used by the scenario runner and tests to name principals.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(LABEL_DOMAIN);
        hasher.update(label.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short form for logs: first 4 bytes as hex.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}…", self.short())
    }
}
