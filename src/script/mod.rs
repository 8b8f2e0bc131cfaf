//! Script Modules
//!
//! Cartridge scripts are [Rhai](https://rhai.rs) sources that declare exactly
//! one module:
//!
//! ```text
//! // scripts/spinner.rhai
//! define(["exports", "input", "./config"], |exports, input, config| {
//!     exports["default"] = |object| {
//!         let speed = config.speed;
//!         #{
//!             update: |dt| {
//!                 if input.is_pressed("A") { speed *= -1.0; }
//!                 object.rotate(vec3(0.0, speed * dt, 0.0));
//!             }
//!         }
//!     };
//! });
//! ```
//!
//! - The module id is derived from the asset path (`scripts/spinner.rhai` → `./spinner`).
//! - `exports` is a fresh map for the module's output. A factory may instead
//!   return its export directly.
//! - Built-ins (`input`, `log`) are resolved without registration; `require`
//!   is reserved.
//! - Modules resolve lazily, at most once, with cycle detection.
//!
//! A **script component** module exports a constructor as `default`. It is
//! called once per component with the owning `GameObject` and returns a map of
//! optional hooks: `init()`, `update(dt)` and `on_destroy()`.

pub mod api;
pub mod builtins;
pub mod host;
pub mod loader;

pub use api::{ComponentRef, ScriptInput, ScriptLogger, ScriptObject};
pub use host::{Declaration, ScriptHost};
pub use loader::{ModuleLoader, ModuleState, module_id_for_path};
