//! Cartridges
//!
//! A cartridge is a packaged game: a zip archive with a `manifest.json` at its
//! root (the scene list and the asset list) plus the raw bytes of every asset
//! at its virtual path.
//!
//! Loading runs in one direction:
//!
//! ```text
//! zip bytes ──► CartridgeArchive ──► CartridgeManifest ──► Cartridge
//!                (decompress)         (serde_json)         (AssetDb + SceneData)
//! ```
//!
//! [`Cartridge`] is built once per load and never mutated. Building it
//! resolves every asset reference, so an invalid manifest fails here, before
//! any scene exists.

pub mod archive;
pub mod data;
pub mod loader;
pub mod manifest;

use std::path::Path;

pub use archive::CartridgeArchive;
pub use data::{
    AmbientLightData, ComponentData, GameObjectData, LightData, SceneData, TransformData,
};
pub use manifest::CartridgeManifest;

use crate::assets::{Asset, AssetDb, DirectoryFileSystem, FileSystemVariant};
use crate::errors::{ArchiveError, AssetError, ConfigError, Error, Result};

pub struct Cartridge {
    assets: AssetDb,
    scenes: Vec<SceneData>,
}

impl Cartridge {
    /// Builds the configuration model for every scene of a manifest.
    pub fn from_manifest(manifest: &CartridgeManifest, file_system: FileSystemVariant) -> Result<Self> {
        let assets = AssetDb::new(
            manifest
                .assets
                .iter()
                .map(|a| Asset::new(a.id.clone(), a.path.clone(), a.hash.clone())),
            file_system,
        )?;

        let scenes = manifest
            .scenes
            .iter()
            .map(|scene| loader::load_scene(scene, &assets))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { assets, scenes })
    }

    pub fn from_archive(archive: CartridgeArchive) -> Result<Self> {
        let (manifest, file_system) = archive.into_parts();
        Self::from_manifest(&manifest, file_system.into())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_archive(CartridgeArchive::from_bytes(bytes)?)
    }

    /// Loads an unpacked cartridge: a directory holding `manifest.json` and
    /// the asset files.
    pub async fn from_directory(root: impl AsRef<Path>) -> Result<Self> {
        let file_system = FileSystemVariant::from(DirectoryFileSystem::new(root));
        let manifest_bytes = file_system
            .read_file(archive::MANIFEST_PATH)
            .await
            .map_err(|err| match err {
                Error::Asset(AssetError::FileNotFound(_)) => ArchiveError::MissingManifest.into(),
                other => other,
            })?;
        let manifest = archive::parse_manifest(&manifest_bytes)?;
        Self::from_manifest(&manifest, file_system)
    }

    #[inline]
    #[must_use]
    pub fn assets(&self) -> &AssetDb {
        &self.assets
    }

    #[inline]
    #[must_use]
    pub fn scenes(&self) -> &[SceneData] {
        &self.scenes
    }

    pub fn scene(&self, index: usize) -> Result<&SceneData> {
        self.scenes.get(index).ok_or_else(|| {
            ConfigError::SceneNotFound {
                index,
                count: self.scenes.len(),
            }
            .into()
        })
    }
}
