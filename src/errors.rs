//! Error Types
//!
//! This module defines the error types used throughout the runtime.
//!
//! # Overview
//!
//! The top-level [`Error`] wraps one sub-enum per subsystem:
//! - [`AssetError`]: asset resolution against the cartridge's asset database
//! - [`ArchiveError`]: cartridge decompression and manifest decoding
//! - [`ConfigError`]: converting the manifest into the configuration model
//! - [`ScriptError`]: module registration, resolution and script execution
//! - [`SceneError`]: live scene graph operations
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Sub-errors convert with `?`.
//!
//! ```rust,ignore
//! use pixelcart::errors::{AssetError, Result};
//!
//! fn first_mesh(db: &AssetDb) -> Result<Arc<Asset>> {
//!     let asset = db.resolve_as("crate-model", AssetKind::Mesh)?;
//!     Ok(asset)
//! }
//! ```

use thiserror::Error;

use crate::assets::AssetKind;

/// The main error type for the runtime.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The render backend rejected an operation (e.g. an unsupported mesh format).
    #[error("Render backend error: {0}")]
    Render(String),

    /// Runtime settings could not be decoded.
    #[error("Invalid runtime settings: {0}")]
    Settings(#[source] serde_json::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Asset Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum AssetError {
    /// The requested asset id is not part of the cartridge.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The asset exists but has a different kind than the caller required.
    #[error("Asset '{id}' has kind {actual:?}, expected {expected:?}")]
    TypeMismatch {
        id: String,
        expected: AssetKind,
        actual: AssetKind,
    },

    /// Two manifest entries share one id.
    #[error("Duplicate asset id in manifest: {0}")]
    DuplicateAsset(String),

    /// No file exists at the virtual path.
    #[error("Virtual file not found: {0}")]
    FileNotFound(String),

    /// The virtual path is absolute or climbs out of the cartridge root.
    #[error("Virtual path escapes the cartridge: {0}")]
    InvalidPath(String),
}

// ============================================================================
// Archive Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive has no `manifest.json` at its root.
    #[error("Cartridge has no manifest.json")]
    MissingManifest,

    /// `manifest.json` is not valid JSON or does not match the manifest schema.
    #[error("Invalid cartridge manifest: {0}")]
    InvalidManifest(#[from] serde_json::Error),

    /// The container itself could not be read.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A component definition carries a type tag the runtime does not know.
    #[error("Unknown component type '{kind}' (component '{component}' on object '{object}')")]
    UnknownComponentType {
        kind: String,
        component: String,
        object: String,
    },

    /// A component definition has the right tag but malformed properties.
    #[error("Invalid component '{component}' on object '{object}': {source}")]
    InvalidComponent {
        component: String,
        object: String,
        #[source]
        source: serde_json::Error,
    },

    /// A scene index outside the cartridge's scene list.
    #[error("Scene index {index} out of range (cartridge has {count} scenes)")]
    SceneNotFound { index: usize, count: usize },
}

// ============================================================================
// Script Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum ScriptError {
    /// A module id was registered twice.
    #[error("Module '{0}' is already registered")]
    DuplicateModule(String),

    /// A module was required while it was still being resolved.
    #[error("Cyclic dependency on module '{id}': {}", path.join(" -> "))]
    CyclicDependency { id: String, path: Vec<String> },

    /// A dependency id names no registered or built-in module.
    #[error("Unresolved dependency '{id}' (required by '{required_by}')")]
    UnresolvedDependency { id: String, required_by: String },

    /// The script source is malformed or does not declare exactly one module.
    #[error("Parse error in '{module}': {message}")]
    ParseError { module: String, message: String },

    /// The module resolved, but its export has no `default` entry.
    #[error("Module '{0}' has no default export")]
    MissingDefaultExport(String),

    /// The default export does not implement the script component capability.
    #[error("Module '{module}' does not export a script component: {reason}")]
    InvalidScriptComponent { module: String, reason: String },

    /// Script asset paths must live under `scripts/`.
    #[error("Script path '{0}' is not under 'scripts/'")]
    InvalidModulePath(String),

    /// The dependency is reserved and cannot be used by scripts.
    #[error("Module '{module}' depends on '{id}': {reason}")]
    UnsupportedDependency {
        id: String,
        module: String,
        reason: &'static str,
    },

    /// A script raised an error while executing.
    #[error("Script error in '{module}': {message}")]
    Runtime { module: String, message: String },
}

// ============================================================================
// Scene Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum SceneError {
    /// The key does not refer to a live object in this world.
    #[error("Game object not found in world")]
    ObjectNotFound,

    /// No component with this id is attached to the object.
    #[error("Component '{0}' not found")]
    ComponentNotFound(String),

    /// The object already holds a component with this id.
    #[error("Component '{0}' already exists on this object")]
    DuplicateComponent(String),

    /// Reparenting would make an object its own ancestor.
    #[error("Reparenting '{child}' under '{parent}' would create a cycle")]
    CyclicHierarchy { child: String, parent: String },

    /// A world path query did not match any object.
    #[error("No object at path '{0}'")]
    PathNotFound(String),
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
