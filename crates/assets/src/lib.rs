//! Assets: JSON manifests of named files and a preloader that reads them once
//! at startup.
//!
//! Loaded assets are identified by a hash of their content, so two names
//! pointing at identical bytes share an [`AssetId`].
//!
//! # Invariants
//! - Loaded callbacks run once, after every enqueued asset has been read.
//! - A missing or unreadable asset aborts loading before any callback runs.

mod manifest;
mod preloader;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use manifest::{AssetEntry, AssetManifest};
pub use preloader::{Asset, LoadedAssets, Preloader};

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// First eight bytes of the SHA-256 of `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(head))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset `{name}` not found at {path}")]
    Missing { name: String, path: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("asset name `{0}` is listed twice")]
    DuplicateName(String),
}

pub fn crate_info() -> &'static str {
    "kinloop-assets v0.1.0"
}
