use std::path::Path;

use serde::{Deserialize, Serialize};

/// Content category of an asset, inferred from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Mesh,
    /// Side files a mesh format pulls in (e.g. `.mtl` material libraries).
    MeshAuxiliary,
    Script,
    Sound,
    Texture,
    Unknown,
}

impl AssetKind {
    const TABLE: &[(AssetKind, &[&str])] = &[
        (AssetKind::Mesh, &["obj", "fbx", "gltf", "glb", "stl"]),
        (AssetKind::MeshAuxiliary, &["mtl"]),
        (AssetKind::Script, &["rhai"]),
        (AssetKind::Sound, &["mp3", "ogg", "wav"]),
        (
            AssetKind::Texture,
            &["png", "jpg", "jpeg", "bmp", "basis", "dds"],
        ),
    ];

    /// Classifies an extension (without the dot, any case).
    ///
    /// Unrecognized extensions map to [`AssetKind::Unknown`] so that stray
    /// project files never abort a cartridge load.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        let extension = extension.to_ascii_lowercase();
        Self::TABLE
            .iter()
            .find(|(_, extensions)| extensions.contains(&extension.as_str()))
            .map_or(AssetKind::Unknown, |(kind, _)| *kind)
    }

    #[must_use]
    pub fn from_path(path: &str) -> Self {
        extension_of(path).map_or(AssetKind::Unknown, Self::from_extension)
    }
}

/// Returns the extension of a virtual path, without the leading dot.
#[must_use]
pub fn extension_of(path: &str) -> Option<&str> {
    Path::new(path).extension().and_then(|ext| ext.to_str())
}

/// A typed, immutable reference to a file inside a cartridge.
///
/// Identity is the `id`; two assets with the same path but different ids are
/// distinct assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    id: String,
    path: String,
    hash: String,
    kind: AssetKind,
}

impl Asset {
    pub fn new(id: impl Into<String>, path: impl Into<String>, hash: impl Into<String>) -> Self {
        let path = path.into();
        let kind = AssetKind::from_path(&path);
        Self {
            id: id.into(),
            path,
            hash: hash.into(),
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Virtual path inside the cartridge.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        extension_of(&self.path).unwrap_or_default()
    }

    /// URL under which a renderer can fetch this asset through the
    /// file system's protocol indirection.
    #[must_use]
    pub fn fetch_url(&self, protocol: &str) -> String {
        format!("{protocol}{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table_is_case_insensitive() {
        assert_eq!(AssetKind::from_path("models/ship.GLB"), AssetKind::Mesh);
        assert_eq!(AssetKind::from_path("models/ship.mtl"), AssetKind::MeshAuxiliary);
        assert_eq!(AssetKind::from_path("scripts/player.rhai"), AssetKind::Script);
        assert_eq!(AssetKind::from_path("sfx/jump.Ogg"), AssetKind::Sound);
        assert_eq!(AssetKind::from_path("tex/atlas.basis"), AssetKind::Texture);
    }

    #[test]
    fn unrecognized_extensions_are_unknown() {
        assert_eq!(AssetKind::from_path("notes/readme.md"), AssetKind::Unknown);
        assert_eq!(AssetKind::from_path("Makefile"), AssetKind::Unknown);
    }

    #[test]
    fn fetch_url_prefixes_protocol() {
        let asset = Asset::new("a", "models/ship.glb", "");
        assert_eq!(
            asset.fetch_url("cart-0badcafe://"),
            "cart-0badcafe://models/ship.glb"
        );
        assert_eq!(asset.extension(), "glb");
    }
}
