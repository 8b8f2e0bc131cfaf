use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::errors::{AssetError, Result};

/// Bytes of a file inside a cartridge. Cloning shares the buffer.
pub type FileBytes = Arc<[u8]>;

/// Builds a fresh `{prefix}-{8 hex}://` protocol string.
///
/// Each file system instance gets its own token so URLs handed to a renderer
/// can never collide across cartridges.
#[must_use]
pub fn make_resolver_protocol(prefix: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}://", &token[..8])
}

/// Read-only view of a cartridge's files by virtual path.
pub trait FileSystem: Send + Sync {
    /// Reads the file at a virtual path (e.g. `models/ship.glb`).
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<FileBytes>> + Send;

    /// Protocol prefix under which a renderer may fetch virtual paths.
    fn resolver_protocol(&self) -> &str;

    /// Maps a URL produced with [`FileSystem::resolver_protocol`] back to its
    /// virtual path. Foreign URLs yield `None`.
    fn resolve_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.resolver_protocol())
    }
}

/// Files of a decompressed cartridge archive, held in memory.
pub struct ArchiveFileSystem {
    files: FxHashMap<String, FileBytes>,
    protocol: String,
}

impl ArchiveFileSystem {
    pub fn new(files: FxHashMap<String, FileBytes>) -> Self {
        Self {
            files,
            protocol: make_resolver_protocol("cartridge"),
        }
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Synchronous lookup; the archive is fully decompressed up front.
    pub fn get(&self, path: &str) -> Option<FileBytes> {
        self.files.get(path).cloned()
    }
}

impl FileSystem for ArchiveFileSystem {
    async fn read_file(&self, path: &str) -> Result<FileBytes> {
        self.get(path)
            .ok_or_else(|| AssetError::FileNotFound(path.to_string()).into())
    }

    fn resolver_protocol(&self) -> &str {
        &self.protocol
    }
}

/// An unpacked cartridge on disk.
pub struct DirectoryFileSystem {
    root_path: PathBuf,
    protocol: String,
}

impl DirectoryFileSystem {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root_path: root.as_ref().to_path_buf(),
            protocol: make_resolver_protocol("project"),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl FileSystem for DirectoryFileSystem {
    async fn read_file(&self, path: &str) -> Result<FileBytes> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(AssetError::InvalidPath(path.to_string()).into());
        }
        let full = self.root_path.join(relative);
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(data.into()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::FileNotFound(path.to_string()).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn resolver_protocol(&self) -> &str {
        &self.protocol
    }
}

/// Static dispatch over the supported file systems.
#[derive(Clone)]
pub enum FileSystemVariant {
    Archive(Arc<ArchiveFileSystem>),
    Directory(Arc<DirectoryFileSystem>),
}

impl FileSystemVariant {
    pub async fn read_file(&self, path: &str) -> Result<FileBytes> {
        match self {
            Self::Archive(fs) => fs.read_file(path).await,
            Self::Directory(fs) => fs.read_file(path).await,
        }
    }

    #[must_use]
    pub fn resolver_protocol(&self) -> &str {
        match self {
            Self::Archive(fs) => fs.resolver_protocol(),
            Self::Directory(fs) => fs.resolver_protocol(),
        }
    }

    #[must_use]
    pub fn resolve_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        match self {
            Self::Archive(fs) => fs.resolve_url(url),
            Self::Directory(fs) => fs.resolve_url(url),
        }
    }
}

impl From<ArchiveFileSystem> for FileSystemVariant {
    fn from(fs: ArchiveFileSystem) -> Self {
        Self::Archive(Arc::new(fs))
    }
}

impl From<DirectoryFileSystem> for FileSystemVariant {
    fn from(fs: DirectoryFileSystem) -> Self {
        Self::Directory(Arc::new(fs))
    }
}
