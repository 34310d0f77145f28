use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::manifest::AssetManifest;
use crate::{AssetError, AssetId};

/// A file read by the [`Preloader`].
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Everything a preloader read, by name.
#[derive(Debug, Clone, Default)]
pub struct LoadedAssets {
    by_name: BTreeMap<String, Asset>,
}

impl LoadedAssets {
    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.by_name.get(name)
    }

    pub fn id(&self, name: &str) -> Option<AssetId> {
        self.by_name.get(name).map(|a| a.id)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Total bytes held.
    pub fn size(&self) -> usize {
        self.by_name.values().map(|a| a.bytes.len()).sum()
    }
}

type OnLoaded = Box<dyn FnOnce(&LoadedAssets)>;

/// Reads queued manifests and notifies subscribers once everything is in
/// memory.
#[derive(Default)]
pub struct Preloader {
    manifests: Vec<AssetManifest>,
    on_loaded: Vec<OnLoaded>,
    loaded: Option<LoadedAssets>,
}

impl Preloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, manifest: AssetManifest) -> &mut Self {
        self.manifests.push(manifest);
        self
    }

    /// Run `callback` when loading completes, or right away if it already has.
    pub fn subscribe_on_loaded<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&LoadedAssets) + 'static,
    {
        match &self.loaded {
            Some(loaded) => callback(loaded),
            None => self.on_loaded.push(Box::new(callback)),
        }
        self
    }

    /// Read every queued asset, then run the loaded callbacks in subscription
    /// order. Calling it again after success returns the same assets.
    pub fn start(&mut self) -> Result<&LoadedAssets, AssetError> {
        if self.loaded.is_none() {
            let loaded = self.read_all()?;
            info!(assets = loaded.len(), bytes = loaded.size(), "assets loaded");
            for callback in self.on_loaded.drain(..) {
                callback(&loaded);
            }
            self.loaded = Some(loaded);
        }
        Ok(self.loaded.get_or_insert_with(LoadedAssets::default))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn loaded(&self) -> Option<&LoadedAssets> {
        self.loaded.as_ref()
    }

    fn read_all(&self) -> Result<LoadedAssets, AssetError> {
        let mut by_name = BTreeMap::new();
        for manifest in &self.manifests {
            for entry in &manifest.assets {
                if by_name.contains_key(&entry.name) {
                    return Err(AssetError::DuplicateName(entry.name.clone()));
                }
                let path = manifest.resolve(entry);
                let bytes = std::fs::read(&path).map_err(|source| {
                    let shown = path.display().to_string();
                    if source.kind() == ErrorKind::NotFound {
                        AssetError::Missing {
                            name: entry.name.clone(),
                            path: shown,
                        }
                    } else {
                        AssetError::Io { path: shown, source }
                    }
                })?;
                let id = AssetId::of(&bytes);
                debug!(name = %entry.name, %id, bytes = bytes.len(), "asset read");
                by_name.insert(
                    entry.name.clone(),
                    Asset {
                        id,
                        name: entry.name.clone(),
                        path,
                        bytes,
                    },
                );
            }
        }
        Ok(LoadedAssets { by_name })
    }
}

impl std::fmt::Debug for Preloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preloader")
            .field("manifests", &self.manifests.len())
            .field("pending_callbacks", &self.on_loaded.len())
            .field("loaded", &self.loaded.is_some())
            .finish()
    }
}
