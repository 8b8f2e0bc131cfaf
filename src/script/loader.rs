use std::rc::Rc;

use rhai::{Dynamic, FnPtr, Map};
use rustc_hash::{FxHashMap, FxHashSet};

use super::builtins::{EXPORTS, REQUIRE};
use super::host::{Declaration, Dependencies, ScriptHost};
use crate::assets::{Asset, AssetKind};
use crate::errors::{AssetError, Result, ScriptError};

/// Where a module id is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unregistered,
    Registered,
    /// Its factory (or one of its dependencies) is running right now.
    Loading,
    Resolved,
}

struct ModuleRecord {
    dependencies: Dependencies,
    factory: FnPtr,
}

impl From<Declaration> for ModuleRecord {
    fn from(declaration: Declaration) -> Self {
        Self {
            dependencies: declaration.dependencies,
            factory: declaration.factory,
        }
    }
}

/// Derives a module id from a script asset's virtual path:
/// `scripts/enemy/ai.rhai` → `./enemy/ai`.
pub fn module_id_for_path(path: &str) -> Result<String> {
    let relative = path
        .strip_prefix("scripts/")
        .ok_or_else(|| ScriptError::InvalidModulePath(path.to_string()))?;
    let stem = match relative.rfind('.') {
        Some(dot) if !relative[dot..].contains('/') && dot > 0 => &relative[..dot],
        _ => relative,
    };
    Ok(format!("./{stem}"))
}

/// Registry and resolver for one cartridge's script modules.
///
/// Resolution is recursive descent over declared dependencies. An explicit
/// in-progress set turns re-entry into a [`ScriptError::CyclicDependency`],
/// and every factory runs at most once.
pub struct ModuleLoader {
    host: Rc<ScriptHost>,
    builtins: FxHashMap<String, Dynamic>,
    registry: FxHashMap<String, ModuleRecord>,
    resolved: FxHashMap<String, Dynamic>,
    in_progress: FxHashSet<String>,
    // Resolution order of `in_progress`, kept only to report cycle paths.
    stack: Vec<String>,
}

impl ModuleLoader {
    #[must_use]
    pub fn new(host: Rc<ScriptHost>) -> Self {
        Self {
            host,
            builtins: FxHashMap::default(),
            registry: FxHashMap::default(),
            resolved: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn host(&self) -> &Rc<ScriptHost> {
        &self.host
    }

    /// Makes `value` the export of module `id` for every dependent.
    pub fn inject_builtin(&mut self, id: &str, value: Dynamic) {
        if !self.resolved.is_empty() {
            log::warn!("Built-in module '{id}' injected after user modules resolved");
        }
        self.builtins.insert(id.to_string(), value);
    }

    #[must_use]
    pub fn state(&self, id: &str) -> ModuleState {
        if self.resolved.contains_key(id) || self.builtins.contains_key(id) {
            ModuleState::Resolved
        } else if self.in_progress.contains(id) {
            ModuleState::Loading
        } else if self.registry.contains_key(id) {
            ModuleState::Registered
        } else {
            ModuleState::Unregistered
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Parses `source` and registers its declaration under `id`.
    pub fn register(&mut self, id: &str, source: &str) -> Result<()> {
        if self.registry.contains_key(id) {
            return Err(ScriptError::DuplicateModule(id.to_string()).into());
        }
        if self.builtins.contains_key(id) {
            log::warn!("Module '{id}' is shadowed by a built-in module of the same name");
        }

        let declaration = self.host.declare(id, source)?;
        if let Some(name) = &declaration.name
            && name != id
        {
            log::debug!("Module '{id}' declares itself as '{name}'; using the path-derived id");
        }
        log::debug!(
            "Registered module '{id}' with dependencies {:?}",
            declaration.dependencies
        );
        self.registry.insert(id.to_string(), declaration.into());
        Ok(())
    }

    /// Registers a script asset under its path-derived id and returns the id.
    pub fn register_script(&mut self, asset: &Asset, source: &[u8]) -> Result<String> {
        if asset.kind() != AssetKind::Script {
            return Err(AssetError::TypeMismatch {
                id: asset.id().to_string(),
                expected: AssetKind::Script,
                actual: asset.kind(),
            }
            .into());
        }
        let id = module_id_for_path(asset.path())?;
        let source = std::str::from_utf8(source).map_err(|err| ScriptError::ParseError {
            module: id.clone(),
            message: format!("source is not valid UTF-8: {err}"),
        })?;
        self.register(&id, source)?;
        Ok(id)
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Returns the export of module `id`, running factories as needed.
    pub fn resolve(&mut self, id: &str) -> Result<Dynamic> {
        self.resolve_from(id, None)
    }

    /// Resolves a script asset's module.
    pub fn resolve_script(&mut self, asset: &Asset) -> Result<Dynamic> {
        self.resolve(&module_id_for_path(asset.path())?)
    }

    /// The `default` entry of a script asset's export.
    pub fn default_export(&mut self, asset: &Asset) -> Result<Dynamic> {
        let id = module_id_for_path(asset.path())?;
        let export = self.resolve(&id)?;
        export
            .try_cast::<Map>()
            .and_then(|mut map| map.remove("default"))
            .ok_or_else(|| ScriptError::MissingDefaultExport(id).into())
    }

    fn resolve_from(&mut self, id: &str, required_by: Option<&str>) -> Result<Dynamic> {
        if let Some(export) = self.resolved.get(id) {
            return Ok(export.clone());
        }
        if let Some(builtin) = self.builtins.get(id) {
            return Ok(builtin.clone());
        }
        if id == REQUIRE {
            return Err(ScriptError::UnsupportedDependency {
                id: id.to_string(),
                module: required_by.unwrap_or_default().to_string(),
                reason: "nested require is not supported",
            }
            .into());
        }
        if self.in_progress.contains(id) {
            let start = self.stack.iter().position(|s| s == id).unwrap_or_default();
            let mut path = self.stack[start..].to_vec();
            path.push(id.to_string());
            return Err(ScriptError::CyclicDependency {
                id: id.to_string(),
                path,
            }
            .into());
        }
        let Some(record) = self.registry.get(id) else {
            return Err(ScriptError::UnresolvedDependency {
                id: id.to_string(),
                required_by: required_by.unwrap_or("<root>").to_string(),
            }
            .into());
        };
        let dependencies = record.dependencies.clone();
        let factory = record.factory.clone();

        self.in_progress.insert(id.to_string());
        self.stack.push(id.to_string());
        let outcome = self.run_factory(id, &dependencies, &factory);
        self.stack.pop();
        self.in_progress.remove(id);

        let export = outcome?;
        log::debug!("Resolved module '{id}'");
        self.resolved.insert(id.to_string(), export.clone());
        Ok(export)
    }

    fn run_factory(
        &mut self,
        id: &str,
        dependencies: &Dependencies,
        factory: &FnPtr,
    ) -> Result<Dynamic> {
        let exports = Dynamic::from_map(Map::new()).into_shared();
        let mut args = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            if dependency == EXPORTS {
                args.push(exports.clone());
            } else {
                args.push(self.resolve_from(dependency, Some(id))?);
            }
        }

        let returned = self.host.call(id, factory, args)?;
        Ok(if returned.is_unit() {
            exports.flatten()
        } else {
            returned.flatten()
        })
    }
}
