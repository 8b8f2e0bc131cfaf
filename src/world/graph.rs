use slotmap::SlotMap;

use super::component::Component;
use super::{DestroyQueue, ObjectKey};
use super::object::GameObject;
use crate::cartridge::TransformData;
use crate::errors::{Result, SceneError};
use crate::render::SharedRenderer;
use crate::script::ScriptObject;

/// The live scene: every game object of one instantiated scene.
///
/// Objects sit in a slotmap arena; `order` keeps insertion order, which is
/// the order of `init` and `update`. Scripts cannot mutate the world while a
/// pass is running, so their destroy requests wait in `destroy_requests`
/// until the pass ends.
pub struct World {
    objects: SlotMap<ObjectKey, GameObject>,
    order: Vec<ObjectKey>,
    renderer: SharedRenderer,
    destroy_requests: DestroyQueue,
}

impl World {
    #[must_use]
    pub fn new(renderer: SharedRenderer) -> Self {
        Self {
            objects: SlotMap::with_key(),
            order: Vec::new(),
            renderer,
            destroy_requests: DestroyQueue::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Appends an object at the root of the hierarchy.
    pub fn add_object(&mut self, object: GameObject) -> ObjectKey {
        let key = self.objects.insert_with_key(|key| {
            let mut object = object;
            object.set_key(key);
            object
        });
        self.order.push(key);
        key
    }

    /// Creates an object with a fresh render node and appends it, optionally
    /// under `parent`.
    pub fn create_object(
        &mut self,
        id: &str,
        name: &str,
        transform: &TransformData,
        parent: Option<ObjectKey>,
    ) -> Result<ObjectKey> {
        if let Some(parent) = parent
            && !self.contains(parent)
        {
            return Err(SceneError::ObjectNotFound.into());
        }
        let key = self.add_object(GameObject::new(id, name, &self.renderer, transform));
        if parent.is_some() {
            self.set_parent(key, parent)?;
        }
        Ok(key)
    }

    // ========================================================================
    // Access
    // ========================================================================

    #[must_use]
    pub fn get(&self, key: ObjectKey) -> Option<&GameObject> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut GameObject> {
        self.objects.get_mut(key)
    }

    #[must_use]
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.order.iter().filter_map(|&key| self.objects.get(key))
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> &[ObjectKey] {
        &self.order
    }

    /// Objects without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|&key| self.parent(key).is_none())
    }

    #[must_use]
    pub fn parent(&self, key: ObjectKey) -> Option<ObjectKey> {
        self.objects.get(key).and_then(|o| o.transform().parent)
    }

    #[must_use]
    pub fn children(&self, key: ObjectKey) -> &[ObjectKey] {
        self.objects
            .get(key)
            .map_or(&[][..], |o| o.transform().children.as_slice())
    }

    /// Handle to hand to script code running on behalf of `key`.
    pub fn script_handle(&self, key: ObjectKey) -> Result<ScriptObject> {
        let object = self.objects.get(key).ok_or(SceneError::ObjectNotFound)?;
        Ok(object.script_handle(&self.destroy_requests))
    }

    /// Objects queued for destruction by scripts.
    #[must_use]
    pub fn pending_destroys(&self) -> Vec<ObjectKey> {
        self.destroy_requests.borrow().clone()
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Moves `child` under `parent`, or to the root when `parent` is `None`.
    ///
    /// Local position, rotation and scale are kept as they are, so the world
    /// transform generally changes.
    pub fn set_parent(&mut self, child: ObjectKey, parent: Option<ObjectKey>) -> Result<()> {
        let child_object = self.objects.get(child).ok_or(SceneError::ObjectNotFound)?;
        let child_node = child_object.transform().node();
        let old_parent = child_object.transform().parent;

        let parent_node = match parent {
            Some(parent) => {
                let parent_object = self.objects.get(parent).ok_or(SceneError::ObjectNotFound)?;
                if self.is_ancestor_or_self(child, parent) {
                    return Err(SceneError::CyclicHierarchy {
                        child: child_object.id().to_string(),
                        parent: parent_object.id().to_string(),
                    }
                    .into());
                }
                Some(parent_object.transform().node())
            }
            None => None,
        };

        if old_parent == parent {
            return Ok(());
        }

        if let Some(old) = old_parent
            && let Some(old_object) = self.objects.get_mut(old)
        {
            old_object.transform_mut().children.retain(|&c| c != child);
        }

        self.renderer
            .borrow_mut()
            .set_node_parent(child_node, parent_node);

        if let Some(parent) = parent
            && let Some(parent_object) = self.objects.get_mut(parent)
        {
            parent_object.transform_mut().children.push(child);
        }
        if let Some(child_object) = self.objects.get_mut(child) {
            child_object.transform_mut().parent = parent;
        }
        Ok(())
    }

    /// Whether `ancestor` is `key` itself or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: ObjectKey, key: ObjectKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn add_component(&mut self, key: ObjectKey, component: Component) -> Result<()> {
        self.objects
            .get_mut(key)
            .ok_or(SceneError::ObjectNotFound)?
            .add_component(component)
    }

    pub fn remove_component(&mut self, key: ObjectKey, id: &str) -> Result<()> {
        self.objects
            .get_mut(key)
            .ok_or(SceneError::ObjectNotFound)?
            .remove_component(id)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Initializes every object in insertion order, then carries out the
    /// destroy requests made meanwhile.
    pub fn init(&mut self) -> Result<()> {
        for &key in &self.order {
            if let Some(object) = self.objects.get_mut(key) {
                object.init()?;
            }
        }
        self.flush_destroy_requests();
        Ok(())
    }

    /// Updates every object in insertion order, then carries out the destroy
    /// requests made meanwhile.
    pub fn update(&mut self, delta: f32) {
        for &key in &self.order {
            if let Some(object) = self.objects.get_mut(key) {
                object.update(delta);
            }
        }
        self.flush_destroy_requests();
    }

    fn flush_destroy_requests(&mut self) {
        loop {
            let requested = std::mem::take(&mut *self.destroy_requests.borrow_mut());
            if requested.is_empty() {
                break;
            }
            for key in requested {
                // An ancestor's request may already have taken this one.
                if self.objects.contains_key(key) {
                    self.destroy_object(key);
                }
            }
        }
    }

    /// Destroys an object and its whole subtree.
    ///
    /// Returns `false` (and logs an error) when the object is not part of
    /// this world.
    pub fn destroy_object(&mut self, key: ObjectKey) -> bool {
        if !self.objects.contains_key(key) {
            log::error!("destroy_object: {key:?} is not part of this world");
            return false;
        }
        self.destroy_subtree(key);
        true
    }

    fn destroy_subtree(&mut self, key: ObjectKey) {
        let children = self.children(key).to_vec();
        for child in children {
            self.destroy_subtree(child);
        }

        let Some(mut object) = self.objects.remove(key) else {
            return;
        };
        object.on_destroy();

        if let Some(parent) = object.transform().parent
            && let Some(parent_object) = self.objects.get_mut(parent)
        {
            parent_object.transform_mut().children.retain(|&c| c != key);
        }
        self.order.retain(|&k| k != key);
        self.renderer.borrow_mut().dispose_node(object.transform().node());
        log::debug!("Destroyed object '{}'", object.id());
    }

    /// Destroys every object. Pending destroy requests are dropped.
    pub fn destroy(&mut self) {
        let count = self.objects.len();
        let roots: Vec<ObjectKey> = self.roots().collect();
        self.order.clear();
        for root in roots {
            self.destroy_subtree(root);
        }
        debug_assert!(self.objects.is_empty());
        self.destroy_requests.borrow_mut().clear();
        if count > 0 {
            log::debug!("World destroyed ({count} objects)");
        }
    }
}
