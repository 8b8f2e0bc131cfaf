//! Runtime Settings
//!
//! Configuration for an [`Engine`](crate::engine::Engine) instance. Every field
//! has a default, so hosts only spell out what they change:
//!
//! ```rust,ignore
//! use pixelcart::settings::{RuntimeSettings, ScriptLimits};
//!
//! let settings = RuntimeSettings {
//!     initial_scene: 1,
//!     ..Default::default()
//! };
//!
//! // or from a JSON file shipped next to the player
//! let settings = RuntimeSettings::from_json_str(r#"{ "scripts": { "maxOperations": 50000 } }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Engine-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeSettings {
    /// Index into the cartridge's scene list that is instantiated on load.
    pub initial_scene: usize,
    /// Sandbox limits applied to every script engine.
    pub scripts: ScriptLimits,
}

impl RuntimeSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Settings)
    }
}

/// Resource limits for user scripts.
///
/// Cartridges are untrusted; a runaway loop or unbounded allocation in a
/// script must fail the call instead of hanging the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptLimits {
    /// Operations per script call (module factory or component hook).
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_function_expr_depth: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 1_000_000,
            max_call_levels: 64,
            max_expr_depth: 64,
            max_function_expr_depth: 32,
            max_string_size: 64 * 1024,
            max_array_size: 16 * 1024,
            max_map_size: 4 * 1024,
        }
    }
}
