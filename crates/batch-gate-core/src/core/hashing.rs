// crates/batch-gate-core/src/core/hashing.rs
// ============================================================================
// Module: Batch Gate Canonical Hashing
// Description: Content digests over RFC 8785 canonical JSON.
// Purpose: Give bundles and commitment preimages one stable digest.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Every digest the engine compares is taken over the RFC 8785 (JCS) form of a
//! serializable value, so field order and whitespace never change a seed or a
//! commitment. The algorithm tag travels with the hex value and is part of
//! equality.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Digest algorithms accepted for seeds and commitments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

/// Algorithm used when none is configured.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

impl HashAlgorithm {
    /// Digests raw bytes into a tagged lowercase-hex value.
    fn digest(self, bytes: &[u8]) -> HashDigest {
        let raw = match self {
            Self::Sha256 => Sha256::digest(bytes),
        };
        let mut value = String::with_capacity(raw.len() * 2);
        for byte in raw {
            let _ = write!(value, "{byte:02x}");
        }
        HashDigest {
            algorithm: self,
            value,
        }
    }
}

/// Tagged content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashDigest {
    /// Algorithm that produced the digest.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

impl HashDigest {
    /// Returns the hex value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// Hashing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// The value could not be rendered as canonical JSON.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Canonical Digest
// ============================================================================

/// Digests the RFC 8785 canonical JSON form of `value`.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when `value` cannot be serialized.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let canonical =
        serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))?;
    Ok(algorithm.digest(&canonical))
}
