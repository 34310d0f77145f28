use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::AssetError;

/// One named file in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub name: String,
    /// Relative paths resolve against the manifest's directory.
    pub path: PathBuf,
}

/// A list of assets to preload.
///
/// ```json
/// { "assets": [ { "name": "heart", "path": "sprites/heart.png" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
    #[serde(skip)]
    base: Option<PathBuf>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a manifest file; its directory becomes the base for relative
    /// entry paths.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut manifest = Self::from_json(&data)?;
        manifest.base = path.parent().map(Path::to_path_buf);
        Ok(manifest)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn push(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> &mut Self {
        self.assets.push(AssetEntry {
            name: name.into(),
            path: path.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Where `entry` lives on disk.
    pub fn resolve(&self, entry: &AssetEntry) -> PathBuf {
        match &self.base {
            Some(base) if entry.path.is_relative() => base.join(&entry.path),
            _ => entry.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries() {
        let manifest = AssetManifest::from_json(
            r#"{ "assets": [ { "name": "heart", "path": "sprites/heart.png" } ] }"#,
        )
        .unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.assets[0].name, "heart");
    }

    #[test]
    fn empty_object_is_empty_manifest() {
        assert!(AssetManifest::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn relative_paths_resolve_against_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.json");
        let mut manifest = AssetManifest::new();
        manifest.push("heart", "heart.txt").push("abs", "/tmp/abs.txt");
        manifest.save(&path).unwrap();

        let loaded = AssetManifest::load(&path).unwrap();
        assert_eq!(loaded.resolve(&loaded.assets[0]), dir.path().join("heart.txt"));
        assert_eq!(loaded.resolve(&loaded.assets[1]), PathBuf::from("/tmp/abs.txt"));
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(
            AssetManifest::from_json("{ not json"),
            Err(AssetError::Json(_))
        ));
    }
}
