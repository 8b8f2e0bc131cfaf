//! Asset Database
//!
//! Maps the opaque asset ids used by scene data to typed files inside a
//! cartridge.
//!
//! - [`Asset`] / [`AssetKind`]: immutable asset records, typed by extension
//! - [`AssetDb`]: id resolution with kind checks, and async byte loading
//! - [`io`]: the [`FileSystem`] abstraction over archives and directories

pub mod asset;
pub mod database;
pub mod io;

pub use asset::{Asset, AssetKind, extension_of};
pub use database::AssetDb;
pub use io::{ArchiveFileSystem, DirectoryFileSystem, FileBytes, FileSystem, FileSystemVariant};
