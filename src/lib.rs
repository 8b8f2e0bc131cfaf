#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! A runtime for packaged 3D game cartridges.
//!
//! A cartridge (zip archive + `manifest.json`) is decoded into an immutable
//! configuration model, its Rhai script modules are registered and resolved
//! with dependency injection, and a scene is instantiated into a live
//! [`World`](world::World) of game objects backed by a pluggable
//! [`RenderBackend`](render::RenderBackend).

pub mod assets;
pub mod cartridge;
pub mod engine;
pub mod errors;
pub mod input;
pub mod render;
pub mod script;
pub mod settings;
pub mod world;

pub use assets::{Asset, AssetDb, AssetKind};
pub use cartridge::Cartridge;
pub use engine::Engine;
pub use errors::{Error, Result};
pub use input::{InputButton, InputSource, InputState};
pub use render::{HeadlessRenderer, RenderBackend, SharedRenderer};
pub use settings::{RuntimeSettings, ScriptLimits};
pub use world::{Component, GameObject, ObjectKey, Transform, World};
