//! Scene Graph Runtime
//!
//! Live counterpart of the configuration model.
//!
//! # Ownership
//!
//! A [`World`] owns every [`GameObject`] in a slotmap arena and remembers the
//! order objects were added in. Hierarchy links are [`ObjectKey`]s stored in
//! each object's [`Transform`]: a non-owning `parent` and an ordered list of
//! `children`. The World keeps both directions consistent; they are only
//! changed through [`World::set_parent`] and [`World::destroy_object`].
//!
//! # Renderer coupling
//!
//! Each transform is backed by a render node. Local position, rotation and
//! scale are never cached: every read and write goes to the backend, and
//! values come back by value.
//!
//! # Lifecycle
//!
//! ```text
//! instantiate ─► add_object (pre-order) ─► init() all, in insertion order
//!     ─► update(dt) every frame ─► destroy_object / destroy
//!                                   (on_destroy hooks, then node disposal)
//! ```

mod component;
mod components;
mod graph;
mod instantiate;
mod object;
mod query;
mod script;
mod transform;

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::script::ComponentRef;

pub use component::{Component, ComponentKind};
pub use components::{CameraComponent, LightComponent, MeshComponent};
pub(crate) use components::update_light;
pub use graph::World;
pub use instantiate::{MeshCache, SceneInstantiator};
pub use object::GameObject;
pub use script::ScriptComponent;
pub use transform::Transform;

new_key_type! {
    /// Handle to a game object inside a [`World`].
    pub struct ObjectKey;
}

/// Script views of one object's components, kept in attachment order.
pub(crate) type ComponentDirectory = Rc<RefCell<Vec<ComponentRef>>>;

/// Objects scripts asked to destroy, carried out by the owning [`World`]
/// between passes.
pub(crate) type DestroyQueue = Rc<RefCell<Vec<ObjectKey>>>;
