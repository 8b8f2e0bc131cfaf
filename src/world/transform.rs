use glam::{Affine3A, Vec3};

use super::ObjectKey;
use crate::cartridge::TransformData;
use crate::render::{NodeId, SharedRenderer, decompose};

/// Position, rotation and scale of a game object, plus its place in the
/// hierarchy.
///
/// # Design Principles
///
/// - Local values live in the render node only. Getters read the node,
///   setters write it; a returned `Vec3` is a copy and never changes later.
/// - Hierarchy links are edited by the [`World`](super::World), which keeps
///   `parent` and `children` consistent across all objects.
/// - Reparenting keeps local values. Code that wants an object to stay in
///   place reads [`Transform::world_position`] before the move and hands it
///   to [`Transform::set_world_position`] afterwards (likewise for rotation
///   and scale).
pub struct Transform {
    node: NodeId,
    renderer: SharedRenderer,
    pub(super) parent: Option<ObjectKey>,
    pub(super) children: Vec<ObjectKey>,
}

impl Transform {
    /// Creates the backing node at the scene root.
    pub(crate) fn new(renderer: &SharedRenderer, name: &str, data: &TransformData) -> Self {
        let node = {
            let mut backend = renderer.borrow_mut();
            let node = backend.create_node(name);
            backend.set_node_position(node, data.position);
            backend.set_node_rotation(node, data.rotation);
            backend.set_node_scale(node, data.scale);
            node
        };
        Self {
            node,
            renderer: renderer.clone(),
            parent: None,
            children: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    #[must_use]
    pub(crate) fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }

    // ========================================================================
    // Local TRS
    // ========================================================================

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.renderer.borrow().node_position(self.node)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.renderer.borrow_mut().set_node_position(self.node, position);
    }

    /// Euler angles (XYZ order, radians).
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

    pub fn translate(&mut self, delta: Vec3) {
        let position = self.position();
        self.set_position(position + delta);
    }

    // ========================================================================
    // World space (resolved by the renderer)
    // ========================================================================

    #[must_use]
    pub fn world_matrix(&self) -> Affine3A {
        self.renderer.borrow().node_world_matrix(self.node)
    }

    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        decompose(self.world_matrix()).0
    }

    #[must_use]
    pub fn world_rotation(&self) -> Vec3 {
        decompose(self.world_matrix()).1
    }

    #[must_use]
    pub fn world_scale(&self) -> Vec3 {
        decompose(self.world_matrix()).2
    }

    /// Moves the object to a world-space position, keeping its parent.
    pub fn set_world_position(&mut self, position: Vec3) {
        self.renderer
            .borrow_mut()
            .set_node_world_position(self.node, position);
    }

    pub fn set_world_rotation(&mut self, rotation: Vec3) {
        self.renderer
            .borrow_mut()
            .set_node_world_rotation(self.node, rotation);
    }

    /// See [`RenderBackend::set_node_world_scale`] for parents scaled to zero.
    ///
    /// [`RenderBackend::set_node_world_scale`]: crate::render::RenderBackend::set_node_world_scale
    pub fn set_world_scale(&mut self, scale: Vec3) {
        self.renderer.borrow_mut().set_node_world_scale(self.node, scale);
    }
}
