use std::rc::Rc;

use rhai::{Dynamic, FLOAT, FnPtr, Map};

use super::ObjectKey;
use crate::errors::{Result, ScriptError};
use crate::script::{ComponentRef, ScriptHost, ScriptObject};

const INIT: &str = "init";
const UPDATE: &str = "update";
const ON_DESTROY: &str = "on_destroy";

/// A user-defined component backed by a script module's default export.
pub struct ScriptComponent {
    id: String,
    object: ObjectKey,
    module: String,
    host: Rc<ScriptHost>,
    instance: Map,
    init: Option<FnPtr>,
    update: Option<FnPtr>,
    on_destroy: Option<FnPtr>,
}

impl ScriptComponent {
    /// Calls the module's constructor with the owning object and checks that
    /// it produced a hook map.
    pub fn instantiate(
        id: &str,
        object: ObjectKey,
        module: &str,
        constructor: Dynamic,
        handle: ScriptObject,
        host: Rc<ScriptHost>,
    ) -> Result<Self> {
        let invalid = |reason: String| ScriptError::InvalidScriptComponent {
            module: module.to_string(),
            reason,
        };

        let type_name = constructor.type_name();
        let constructor = constructor
            .try_cast::<FnPtr>()
            .ok_or_else(|| invalid(format!("default export is {type_name}, expected a constructor function")))?;

        let instance = host.call(module, &constructor, vec![Dynamic::from(handle)])?.flatten();
        let type_name = instance.type_name();
        let hooks = instance
            .try_cast::<Map>()
            .ok_or_else(|| invalid(format!("constructor returned {type_name}, expected a map of hooks")))?;

        let hook = |name: &str| -> Result<Option<FnPtr>> {
            match hooks.get(name) {
                None => Ok(None),
                Some(value) => value.clone().try_cast::<FnPtr>().map(Some).ok_or_else(|| {
                    invalid(format!("hook '{name}' is {}, expected a function", value.type_name())).into()
                }),
            }
        };

        Ok(Self {
            id: id.to_string(),
            object,
            module: module.to_string(),
            init: hook(INIT)?,
            update: hook(UPDATE)?,
            on_destroy: hook(ON_DESTROY)?,
            instance: hooks,
            host,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn object(&self) -> ObjectKey {
        self.object
    }

    /// Id of the module this component was built from.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    pub(crate) fn script_ref(&self) -> ComponentRef {
        ComponentRef::script(&self.id, &self.module, self.instance.clone())
    }

    pub(crate) fn init(&mut self) -> Result<()> {
        self.invoke(self.init.as_ref(), Vec::new())
    }

    pub(crate) fn update(&mut self, delta: f32) -> Result<()> {
        self.invoke(self.update.as_ref(), vec![Dynamic::from(FLOAT::from(delta))])
    }

    pub(crate) fn on_destroy(&mut self) {
        if let Err(err) = self.invoke(self.on_destroy.as_ref(), Vec::new()) {
            log::error!("Script component '{}' failed in on_destroy: {err}", self.id);
        }
    }

    fn invoke(&self, hook: Option<&FnPtr>, args: Vec<Dynamic>) -> Result<()> {
        if let Some(hook) = hook {
            self.host.call(&self.module, hook, args)?;
        }
        Ok(())
    }
}
