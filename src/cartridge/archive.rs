use std::io::{Cursor, Read};
use std::path::Path;

use rustc_hash::FxHashMap;
use zip::ZipArchive;

use super::manifest::CartridgeManifest;
use crate::assets::{ArchiveFileSystem, FileBytes};
use crate::errors::{ArchiveError, Result};

/// Name of the manifest entry at the archive root.
pub const MANIFEST_PATH: &str = "manifest.json";

/// Upper bound on the buffer reserved up front for one entry. The size in a
/// zip header is not trusted beyond this.
const MAX_PREALLOC: usize = 1 << 20;

/// A decompressed cartridge: its manifest plus every file by virtual path.
pub struct CartridgeArchive {
    manifest: CartridgeManifest,
    file_system: ArchiveFileSystem,
}

impl CartridgeArchive {
    /// Decompresses a cartridge held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes)).map_err(ArchiveError::from)?;
        let mut files: FxHashMap<String, FileBytes> = FxHashMap::default();

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(ArchiveError::from)?;
            if entry.is_dir() {
                continue;
            }
            let name = normalize_path(entry.name());
            let declared = entry.size();
            let data = read_entry(&mut entry, declared)?;
            files.insert(name, data.into());
        }

        let manifest_bytes = files
            .remove(MANIFEST_PATH)
            .ok_or(ArchiveError::MissingManifest)?;
        let manifest = parse_manifest(&manifest_bytes)?;

        log::info!(
            "Opened cartridge: {} scenes, {} assets, {} files",
            manifest.scenes.len(),
            manifest.assets.len(),
            files.len()
        );

        Ok(Self {
            manifest,
            file_system: ArchiveFileSystem::new(files),
        })
    }

    /// Reads and decompresses a cartridge file from disk.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading cartridge {}", path.display());
        let bytes = tokio::fs::read(path).await?;
        Self::from_bytes(&bytes)
    }

    #[must_use]
    pub fn manifest(&self) -> &CartridgeManifest {
        &self.manifest
    }

    #[must_use]
    pub fn file_system(&self) -> &ArchiveFileSystem {
        &self.file_system
    }

    #[must_use]
    pub fn into_parts(self) -> (CartridgeManifest, ArchiveFileSystem) {
        (self.manifest, self.file_system)
    }
}

pub(crate) fn parse_manifest(bytes: &[u8]) -> Result<CartridgeManifest> {
    Ok(serde_json::from_slice(bytes).map_err(ArchiveError::from)?)
}

fn read_entry(mut reader: impl Read, declared_size: u64) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::with_capacity(prealloc_hint(declared_size));
    reader.read_to_end(&mut data)?;
    Ok(data)
}

fn prealloc_hint(declared_size: u64) -> usize {
    usize::try_from(declared_size).map_or(MAX_PREALLOC, |size| size.min(MAX_PREALLOC))
}

/// Archive tools differ on separators and leading `./`.
fn normalize_path(name: &str) -> String {
    let name = name.replace('\\', "/");
    name.trim_start_matches("./").trim_start_matches('/').to_string()
}
