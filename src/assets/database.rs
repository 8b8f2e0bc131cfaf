use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::asset::{Asset, AssetKind};
use super::io::{FileBytes, FileSystemVariant};
use crate::errors::{AssetError, Result};

/// Resolves asset ids of one cartridge to typed assets and their bytes.
///
/// Assets are stored once and handed out as `Arc<Asset>`; resolving the same
/// id twice returns the same allocation.
pub struct AssetDb {
    assets: Vec<Arc<Asset>>,
    lookup: FxHashMap<String, usize>,
    file_system: FileSystemVariant,
}

impl AssetDb {
    /// Builds the database from manifest entries, rejecting duplicate ids.
    pub fn new(
        assets: impl IntoIterator<Item = Asset>,
        file_system: FileSystemVariant,
    ) -> Result<Self> {
        let mut db = Self {
            assets: Vec::new(),
            lookup: FxHashMap::default(),
            file_system,
        };
        for asset in assets {
            if db.lookup.contains_key(asset.id()) {
                return Err(AssetError::DuplicateAsset(asset.id().to_string()).into());
            }
            db.lookup.insert(asset.id().to_string(), db.assets.len());
            db.assets.push(Arc::new(asset));
        }
        log::debug!("Asset database ready with {} assets", db.assets.len());
        Ok(db)
    }

    pub fn resolve(&self, id: &str) -> Result<Arc<Asset>> {
        self.lookup
            .get(id)
            .map(|&index| Arc::clone(&self.assets[index]))
            .ok_or_else(|| AssetError::NotFound(id.to_string()).into())
    }

    /// Like [`AssetDb::resolve`], but also requires a specific kind.
    pub fn resolve_as(&self, id: &str, expected: AssetKind) -> Result<Arc<Asset>> {
        let asset = self.resolve(id)?;
        if asset.kind() != expected {
            return Err(AssetError::TypeMismatch {
                id: id.to_string(),
                expected,
                actual: asset.kind(),
            }
            .into());
        }
        Ok(asset)
    }

    /// Reads the bytes behind an asset.
    ///
    /// The archive file system keeps decompressed entries in memory, so
    /// repeated loads share one buffer. Decoded resources are cached by callers.
    pub async fn load(&self, asset: &Asset) -> Result<FileBytes> {
        log::debug!("Loading asset '{}' from '{}'", asset.id(), asset.path());
        self.file_system.read_file(asset.path()).await
    }

    /// Assets of one kind, in manifest order.
    pub fn assets_of_kind(&self, kind: AssetKind) -> impl Iterator<Item = &Arc<Asset>> {
        self.assets.iter().filter(move |asset| asset.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Asset>> {
        self.assets.iter()
    }

    #[inline]
    #[must_use]
    pub fn file_system(&self) -> &FileSystemVariant {
        &self.file_system
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
