//! Built-in module ids.
//!
//! Built-ins are plain values handed to factories in place of a user module.
//! The engine injects them into every fresh [`ModuleLoader`](super::ModuleLoader)
//! before the first user module resolves.

use rhai::Dynamic;

use super::api::{ScriptInput, ScriptLogger};
use crate::input::SharedInput;

/// The module's own output object. Never looked up.
pub const EXPORTS: &str = "exports";

/// Reserved; scripts cannot load modules dynamically.
pub const REQUIRE: &str = "require";

pub const INPUT: &str = "input";

pub const LOG: &str = "log";

/// The standard set of built-ins for a cartridge session.
#[must_use]
pub fn standard(input: &SharedInput) -> Vec<(&'static str, Dynamic)> {
    vec![
        (INPUT, Dynamic::from(ScriptInput::new(input.clone()))),
        (LOG, Dynamic::from(ScriptLogger)),
    ]
}
