use super::component::Component;
use super::{ComponentDirectory, DestroyQueue, ObjectKey};
use super::transform::Transform;
use crate::cartridge::TransformData;
use crate::errors::{Result, SceneError};
use crate::render::SharedRenderer;
use crate::script::ScriptObject;

/// A named entity with a transform and an ordered list of components.
///
/// Objects are owned by a [`World`](super::World); the key is assigned when
/// the object is added and stays null before that.
pub struct GameObject {
    key: ObjectKey,
    id: String,
    name: String,
    transform: Transform,
    components: Vec<Component>,
    directory: ComponentDirectory,
}

impl GameObject {
    /// Creates the object and its render node, unattached to any world.
    pub fn new(id: &str, name: &str, renderer: &SharedRenderer, transform: &TransformData) -> Self {
        Self {
            key: ObjectKey::default(),
            id: id.to_string(),
            name: name.to_string(),
            transform: Transform::new(renderer, name, transform),
            components: Vec::new(),
            directory: ComponentDirectory::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        self.key
    }

    pub(super) fn set_key(&mut self, key: ObjectKey) {
        self.key = key;
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    // ========================================================================
    // Components
    // ========================================================================

    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    #[must_use]
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id() == id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id() == id)
    }

    /// Appends a component. Ids are unique per object.
    pub fn add_component(&mut self, component: Component) -> Result<()> {
        if self.component(component.id()).is_some() {
            return Err(SceneError::DuplicateComponent(component.id().to_string()).into());
        }
        self.directory.borrow_mut().push(component.script_ref());
        self.components.push(component);
        Ok(())
    }

    /// Detaches a component and runs its destroy step.
    pub fn remove_component(&mut self, id: &str) -> Result<()> {
        let index = self
            .components
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| SceneError::ComponentNotFound(id.to_string()))?;
        let mut component = self.components.remove(index);
        self.directory.borrow_mut().retain(|c| c.id() != id);
        component.on_destroy();
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Runs `init` on every component in order, stopping at the first error.
    pub fn init(&mut self) -> Result<()> {
        self.components.iter_mut().try_for_each(Component::init)
    }

    /// Runs `update` on every component. A failing component is logged and
    /// does not stop the others.
    pub fn update(&mut self, delta: f32) {
        for component in &mut self.components {
            if let Err(err) = component.update(delta) {
                log::error!(
                    "Component '{}' on '{}' failed to update: {err}",
                    component.id(),
                    self.id
                );
            }
        }
    }

    pub(crate) fn on_destroy(&mut self) {
        for mut component in self.components.drain(..) {
            component.on_destroy();
        }
        // Script instances hold handles back to this directory.
        self.directory.borrow_mut().clear();
    }

    pub(crate) fn script_handle(&self, destroy_queue: &DestroyQueue) -> ScriptObject {
        ScriptObject::new(
            self.key,
            &self.id,
            &self.name,
            self.transform.node(),
            self.transform.renderer().clone(),
            self.directory.clone(),
            destroy_queue.clone(),
        )
    }
}
