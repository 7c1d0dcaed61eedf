//! Content fingerprinting
//!
//! A fingerprint is the SHA-256 hex digest of a file's raw bytes with the
//! applied-transform qualifiers appended in order. Two transform variants of
//! identical source bytes therefore never share a fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Tag identifying a content transform folded into the fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    /// Alpha-bleed image processing
    Bleed,
    /// WAV to OGG/FLAC transcode
    WavToOgg,
}

impl Qualifier {
    /// The tag appended to the digest
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bleed => "(bleed)",
            Self::WavToOgg => "(wav->ogg)",
        }
    }
}

/// Dedup-cache primary key: digest of content plus transform qualifiers
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Fingerprint raw bytes with the given qualifier sequence.
    ///
    /// Deterministic: same bytes and same qualifier order always produce the
    /// same fingerprint.
    pub fn of(bytes: &[u8], qualifiers: &[Qualifier]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut out = hex::encode(digest);
        for q in qualifiers {
            out.push_str(q.tag());
        }
        Self(out)
    }

    /// Wrap an already-computed fingerprint string (e.g. from the shared map)
    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
