//! Types and functions visible to scripts.
//!
//! | Script name  | Rust type        | Purpose                                  |
//! |--------------|------------------|------------------------------------------|
//! | `Vec3`       | [`glam::Vec3`]   | `vec3(x, y, z)`, `.x`, arithmetic        |
//! | `GameObject` | [`ScriptObject`] | the owning object: transform, components |
//! | `Component`  | [`ComponentRef`] | one component of an object               |
//! | `Input`      | [`ScriptInput`]  | the `input` built-in module              |
//! | `Logger`     | [`ScriptLogger`] | the `log` built-in module                |

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;
use rhai::{Array, Dynamic, Engine, EvalAltResult, FLOAT, INT, Map};

use super::host::script_failure;
use crate::input::{InputButton, InputState, SharedInput};
use crate::render::{LightDesc, LightKind, NodeId, PrimitiveId, SharedRenderer, decompose};
use crate::world::{ComponentDirectory, ComponentKind, DestroyQueue, ObjectKey, update_light};

pub(crate) fn register(engine: &mut Engine) {
    register_vec3(engine);
    register_game_object(engine);
    register_component(engine);
    register_input(engine);
    register_logger(engine);
}

// ============================================================================
// Vec3
// ============================================================================

fn register_vec3(engine: &mut Engine) {
    engine
        .register_type_with_name::<Vec3>("Vec3")
        .register_fn("vec3", |x: FLOAT, y: FLOAT, z: FLOAT| {
            Vec3::new(x as f32, y as f32, z as f32)
        })
        .register_fn("vec3", |x: INT, y: INT, z: INT| {
            Vec3::new(x as f32, y as f32, z as f32)
        })
        .register_get_set(
            "x",
            |v: &mut Vec3| FLOAT::from(v.x),
            |v: &mut Vec3, x: FLOAT| v.x = x as f32,
        )
        .register_get_set(
            "y",
            |v: &mut Vec3| FLOAT::from(v.y),
            |v: &mut Vec3, y: FLOAT| v.y = y as f32,
        )
        .register_get_set(
            "z",
            |v: &mut Vec3| FLOAT::from(v.z),
            |v: &mut Vec3, z: FLOAT| v.z = z as f32,
        )
        .register_fn("+", |a: Vec3, b: Vec3| a + b)
        .register_fn("-", |a: Vec3, b: Vec3| a - b)
        .register_fn("*", |a: Vec3, s: FLOAT| a * s as f32)
        .register_fn("==", |a: Vec3, b: Vec3| a == b)
        .register_fn("length", |v: &mut Vec3| FLOAT::from(v.length()))
        .register_fn("to_string", |v: &mut Vec3| v.to_string())
        .register_fn("to_debug", |v: &mut Vec3| format!("{v:?}"));
}

// ============================================================================
// GameObject
// ============================================================================

/// Script-side handle to a game object.
///
/// Reads and writes go straight to the render node, like
/// [`Transform`](crate::world::Transform) does on the Rust side. Components
/// are looked up in a directory the object keeps current, and
/// [`ScriptObject::destroy`] only queues a request that the world carries out
/// after the running `init` or `update` pass.
#[derive(Clone)]
pub struct ScriptObject {
    key: ObjectKey,
    id: String,
    name: String,
    node: NodeId,
    renderer: SharedRenderer,
    components: ComponentDirectory,
    destroy_queue: DestroyQueue,
}

impl ScriptObject {
    pub(crate) fn new(
        key: ObjectKey,
        id: &str,
        name: &str,
        node: NodeId,
        renderer: SharedRenderer,
        components: ComponentDirectory,
        destroy_queue: DestroyQueue,
    ) -> Self {
        Self {
            key,
            id: id.to_string(),
            name: name.to_string(),
            node,
            renderer,
            components,
            destroy_queue,
        }
    }

    #[must_use]
    pub fn key(&self) -> ObjectKey {
        self.key
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.renderer.borrow().node_position(self.node)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.renderer.borrow_mut().set_node_position(self.node, position);
    }

    #[must_use]
    pub fn rotation(&self) -> Vec3 {
        self.renderer.borrow().node_rotation(self.node)
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.renderer.borrow_mut().set_node_rotation(self.node, rotation);
    }

    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.renderer.borrow().node_scale(self.node)
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.renderer.borrow_mut().set_node_scale(self.node, scale);
    }

    fn world(&self) -> (Vec3, Vec3, Vec3) {
        decompose(self.renderer.borrow().node_world_matrix(self.node))
    }

    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.world().0
    }

    pub fn set_world_position(&mut self, position: Vec3) {
        self.renderer
            .borrow_mut()
            .set_node_world_position(self.node, position);
    }

    #[must_use]
    pub fn world_rotation(&self) -> Vec3 {
        self.world().1
    }

    pub fn set_world_rotation(&mut self, rotation: Vec3) {
        self.renderer
            .borrow_mut()
            .set_node_world_rotation(self.node, rotation);
    }

    #[must_use]
    pub fn world_scale(&self) -> Vec3 {
        self.world().2
    }

    pub fn set_world_scale(&mut self, scale: Vec3) {
        self.renderer.borrow_mut().set_node_world_scale(self.node, scale);
    }

    pub fn translate(&mut self, delta: Vec3) {
        let position = self.position();
        self.set_position(position + delta);
    }

    pub fn rotate(&mut self, delta: Vec3) {
        let rotation = self.rotation();
        self.set_rotation(rotation + delta);
    }

    #[must_use]
    pub fn component(&self, id: &str) -> Option<ComponentRef> {
        self.components.borrow().iter().find(|c| c.id == id).cloned()
    }

    #[must_use]
    pub fn components(&self) -> Vec<ComponentRef> {
        self.components.borrow().clone()
    }

    /// Asks the world to destroy this object and its subtree.
    pub fn destroy(&self) {
        let mut queue = self.destroy_queue.borrow_mut();
        if !queue.contains(&self.key) {
            queue.push(self.key);
        }
    }
}

fn register_game_object(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptObject>("GameObject")
        .register_get("id", |o: &mut ScriptObject| o.id.clone())
        .register_get("name", |o: &mut ScriptObject| o.name.clone())
        .register_get_set(
            "position",
            |o: &mut ScriptObject| o.position(),
            ScriptObject::set_position,
        )
        .register_get_set(
            "rotation",
            |o: &mut ScriptObject| o.rotation(),
            ScriptObject::set_rotation,
        )
        .register_get_set(
            "scale",
            |o: &mut ScriptObject| o.scale(),
            ScriptObject::set_scale,
        )
        .register_get_set(
            "world_position",
            |o: &mut ScriptObject| o.world_position(),
            ScriptObject::set_world_position,
        )
        .register_get_set(
            "world_rotation",
            |o: &mut ScriptObject| o.world_rotation(),
            ScriptObject::set_world_rotation,
        )
        .register_get_set(
            "world_scale",
            |o: &mut ScriptObject| o.world_scale(),
            ScriptObject::set_world_scale,
        )
        .register_fn("translate", ScriptObject::translate)
        .register_fn("rotate", ScriptObject::rotate)
        .register_fn("get_component", |o: &mut ScriptObject, id: &str| {
            o.component(id).map_or(Dynamic::UNIT, Dynamic::from)
        })
        .register_fn("has_component", |o: &mut ScriptObject, id: &str| {
            o.component(id).is_some()
        })
        .register_get("components", |o: &mut ScriptObject| -> Array {
            o.components().into_iter().map(Dynamic::from).collect()
        })
        .register_fn("destroy", |o: &mut ScriptObject| o.destroy())
        .register_fn("to_string", |o: &mut ScriptObject| {
            format!("GameObject({})", o.name)
        });
}

// ============================================================================
// Component
// ============================================================================

/// Script-side handle to one component.
///
/// Lights share their parameters with the live component; other kinds are
/// read-only views.
#[derive(Clone)]
pub struct ComponentRef {
    id: String,
    target: ComponentTarget,
}

#[derive(Clone)]
enum ComponentTarget {
    Mesh {
        asset: Option<String>,
    },
    Script {
        module: String,
        instance: Map,
    },
    Camera {
        camera: PrimitiveId,
        renderer: SharedRenderer,
    },
    Light {
        light: PrimitiveId,
        desc: Rc<Cell<LightDesc>>,
        renderer: SharedRenderer,
    },
}

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

impl ComponentRef {
    pub(crate) fn mesh(id: &str, asset: Option<String>) -> Self {
        Self::with_target(id, ComponentTarget::Mesh { asset })
    }

    pub(crate) fn script(id: &str, module: &str, instance: Map) -> Self {
        Self::with_target(
            id,
            ComponentTarget::Script {
                module: module.to_string(),
                instance,
            },
        )
    }

    pub(crate) fn camera(id: &str, camera: PrimitiveId, renderer: SharedRenderer) -> Self {
        Self::with_target(id, ComponentTarget::Camera { camera, renderer })
    }

    pub(crate) fn light(
        id: &str,
        light: PrimitiveId,
        desc: Rc<Cell<LightDesc>>,
        renderer: SharedRenderer,
    ) -> Self {
        Self::with_target(id, ComponentTarget::Light { light, desc, renderer })
    }

    fn with_target(id: &str, target: ComponentTarget) -> Self {
        Self {
            id: id.to_string(),
            target,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match &self.target {
            ComponentTarget::Mesh { .. } => ComponentKind::Mesh,
            ComponentTarget::Script { .. } => ComponentKind::Script,
            ComponentTarget::Camera { .. } => ComponentKind::Camera,
            ComponentTarget::Light { desc, .. } => match desc.get().kind {
                LightKind::Directional => ComponentKind::DirectionalLight,
                LightKind::Point => ComponentKind::PointLight,
            },
        }
    }

    fn wrong_kind(&self, wanted: &str) -> Box<EvalAltResult> {
        script_failure(format!(
            "component '{}' is a {} component, not a {wanted}",
            self.id,
            self.kind().tag()
        ))
    }

    fn light_desc(&self) -> ScriptResult<LightDesc> {
        match &self.target {
            ComponentTarget::Light { desc, .. } => Ok(desc.get()),
            _ => Err(self.wrong_kind("light")),
        }
    }

    fn set_light_desc(&mut self, change: impl FnOnce(&mut LightDesc)) -> ScriptResult<()> {
        let ComponentTarget::Light { light, desc, renderer } = &self.target else {
            return Err(self.wrong_kind("light"));
        };
        let mut next = desc.get();
        change(&mut next);
        update_light(renderer, *light, desc, next);
        Ok(())
    }

    fn point_at(&mut self, target: Vec3) -> ScriptResult<()> {
        match &self.target {
            ComponentTarget::Camera { camera, renderer } => {
                renderer.borrow_mut().point_camera_at(*camera, target);
                Ok(())
            }
            _ => Err(self.wrong_kind("camera")),
        }
    }

    fn script_part(&self) -> ScriptResult<(&str, &Map)> {
        match &self.target {
            ComponentTarget::Script { module, instance } => Ok((module.as_str(), instance)),
            _ => Err(self.wrong_kind("script")),
        }
    }
}

fn register_component(engine: &mut Engine) {
    engine
        .register_type_with_name::<ComponentRef>("Component")
        .register_get("id", |c: &mut ComponentRef| c.id.clone())
        .register_get("kind", |c: &mut ComponentRef| c.kind().tag().to_string())
        .register_get_set(
            "intensity",
            |c: &mut ComponentRef| c.light_desc().map(|d| FLOAT::from(d.intensity)),
            |c: &mut ComponentRef, intensity: FLOAT| {
                c.set_light_desc(|d| d.intensity = intensity as f32)
            },
        )
        .register_get_set(
            "color",
            |c: &mut ComponentRef| c.light_desc().map(|d| d.color),
            |c: &mut ComponentRef, color: Vec3| c.set_light_desc(|d| d.color = color),
        )
        .register_fn("point_at", ComponentRef::point_at)
        .register_get("module", |c: &mut ComponentRef| {
            c.script_part().map(|(module, _)| module.to_string())
        })
        .register_get("instance", |c: &mut ComponentRef| {
            c.script_part().map(|(_, instance)| instance.clone())
        })
        .register_get("mesh", |c: &mut ComponentRef| match &c.target {
            ComponentTarget::Mesh { asset } => Ok(asset.clone().map_or(Dynamic::UNIT, Dynamic::from)),
            _ => Err(c.wrong_kind("mesh")),
        })
        .register_fn("to_string", |c: &mut ComponentRef| {
            format!("Component({}: {})", c.id, c.kind().tag())
        });
}

// ============================================================================
// Built-in module objects
// ============================================================================

/// Value of the `input` built-in module.
#[derive(Clone)]
pub struct ScriptInput {
    state: SharedInput,
}

impl ScriptInput {
    #[must_use]
    pub fn new(state: SharedInput) -> Self {
        Self { state }
    }

    fn query(
        &self,
        name: &str,
        check: fn(&InputState, InputButton) -> bool,
    ) -> Result<bool, Box<EvalAltResult>> {
        let button: InputButton = name
            .parse()
            .map_err(|err| script_failure(format!("{err}")))?;
        Ok(check(&self.state.borrow(), button))
    }
}

fn register_input(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptInput>("Input")
        .register_fn("is_pressed", |input: &mut ScriptInput, button: &str| {
            input.query(button, InputState::is_pressed)
        })
        .register_fn("was_pressed", |input: &mut ScriptInput, button: &str| {
            input.query(button, InputState::was_pressed)
        })
        .register_fn("was_released", |input: &mut ScriptInput, button: &str| {
            input.query(button, InputState::was_released)
        });
}

/// Value of the `log` built-in module. Routes to the `script` log target.
#[derive(Clone, Copy, Default)]
pub struct ScriptLogger;

fn register_logger(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptLogger>("Logger")
        .register_fn("debug", |_: &mut ScriptLogger, message: Dynamic| {
            log::debug!(target: "script", "{message}");
        })
        .register_fn("info", |_: &mut ScriptLogger, message: Dynamic| {
            log::info!(target: "script", "{message}");
        })
        .register_fn("warn", |_: &mut ScriptLogger, message: Dynamic| {
            log::warn!(target: "script", "{message}");
        })
        .register_fn("error", |_: &mut ScriptLogger, message: Dynamic| {
            log::error!(target: "script", "{message}");
        });
}
