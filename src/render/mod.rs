//! Render Backend Abstraction
//!
//! The runtime does not render. It drives an external render engine through
//! the [`RenderBackend`] trait, which exposes exactly what the scene graph
//! needs:
//!
//! - transform nodes with local position, Euler rotation (XYZ, radians) and scale
//! - parenting one node under another, or back to the scene root
//! - mesh containers loaded from raw bytes plus a file extension
//! - camera and light primitives attached to nodes
//! - the scene environment (clear color, ambient light)
//!
//! Handles are slotmap keys allocated by the backend. A backend should
//! tolerate stale handles, since objects may be torn down in any order during
//! unload.
//!
//! [`HeadlessRenderer`] is a complete in-memory backend used by tests and
//! by tooling that runs cartridges without a GPU.

mod headless;

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Affine3A, EulerRot, Quat, Vec3};
use slotmap::new_key_type;

pub use headless::{HeadlessPrimitive, HeadlessRenderer, decompose};

use crate::errors::Result;

new_key_type! {
    /// A transform node owned by the render backend.
    pub struct NodeId;
    /// A camera, light or mesh instance attached to a node.
    pub struct PrimitiveId;
    /// A loaded mesh container that can be instantiated many times.
    pub struct MeshId;
}

/// Light primitive variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
}

/// Parameters for creating or updating a light primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDesc {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

/// Per-scene rendering environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub clear_color: Vec3,
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            clear_color: Vec3::ZERO,
            ambient_color: Vec3::ONE,
            ambient_intensity: 1.0,
        }
    }
}

/// The render engine as seen by the runtime.
pub trait RenderBackend {
    // ========================================================================
    // Transform nodes
    // ========================================================================

    fn create_node(&mut self, name: &str) -> NodeId;

    /// Disposes a node together with its descendants and attached primitives.
    fn dispose_node(&mut self, node: NodeId);

    /// Moves `node` under `parent`, or to the scene root when `None`.
    /// Local values are kept as-is.
    fn set_node_parent(&mut self, node: NodeId, parent: Option<NodeId>);

    fn node_parent(&self, node: NodeId) -> Option<NodeId>;

    fn node_position(&self, node: NodeId) -> Vec3;
    fn set_node_position(&mut self, node: NodeId, position: Vec3);

    /// Euler angles, XYZ order, radians.
    fn node_rotation(&self, node: NodeId) -> Vec3;
    fn set_node_rotation(&mut self, node: NodeId, rotation: Vec3);

    fn node_scale(&self, node: NodeId) -> Vec3;
    fn set_node_scale(&mut self, node: NodeId, scale: Vec3);

    /// Resolved node-to-world matrix.
    fn node_world_matrix(&self, node: NodeId) -> Affine3A;

    /// World matrix of the node's parent, identity at the scene root.
    fn parent_world_matrix(&self, node: NodeId) -> Affine3A {
        self.node_parent(node)
            .map_or(Affine3A::IDENTITY, |parent| self.node_world_matrix(parent))
    }

    /// Places the node at a world-space position by rewriting its local one.
    fn set_node_world_position(&mut self, node: NodeId, position: Vec3) {
        let parent = self.parent_world_matrix(node);
        if parent.matrix3.determinant().abs() <= f32::EPSILON {
            log::warn!("Cannot set world position of {node:?}: a parent is scaled to zero");
            return;
        }
        let local = parent.inverse().transform_point3(position);
        self.set_node_position(node, local);
    }

    /// Gives the node a world-space Euler rotation (XYZ, radians).
    fn set_node_world_rotation(&mut self, node: NodeId, rotation: Vec3) {
        let parent = self.parent_world_matrix(node);
        if parent.matrix3.determinant().abs() <= f32::EPSILON {
            log::warn!("Cannot set world rotation of {node:?}: a parent is scaled to zero");
            return;
        }
        let (_, parent_rotation, _) = parent.to_scale_rotation_translation();
        let world = Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
        let (x, y, z) = (parent_rotation.inverse() * world).to_euler(EulerRot::XYZ);
        self.set_node_rotation(node, Vec3::new(x, y, z));
    }

    /// Gives the node a world-space scale.
    ///
    /// Axes on which the parents' combined scale is zero cannot be solved;
    /// their local scale becomes 1 and a warning is logged.
    fn set_node_world_scale(&mut self, node: NodeId, scale: Vec3) {
        let m = self.parent_world_matrix(node).matrix3;
        let parent = Vec3::new(m.x_axis.length(), m.y_axis.length(), m.z_axis.length());

        let mut local = Vec3::ONE;
        for axis in 0..3 {
            if parent[axis] <= f32::EPSILON {
                log::warn!(
                    "Cannot set world scale of {node:?} to {scale}: parent scale on axis {axis} is zero, local scale left at 1"
                );
            } else {
                local[axis] = scale[axis] / parent[axis];
            }
        }
        self.set_node_scale(node, local);
    }

    // ========================================================================
    // Mesh containers
    // ========================================================================

    /// Loads a mesh container from file bytes. `extension` has no leading dot.
    fn load_mesh(&mut self, bytes: &[u8], extension: &str) -> Result<MeshId>;

    fn dispose_mesh(&mut self, mesh: MeshId);

    /// Instantiates a loaded container under `parent`.
    fn instantiate_mesh(&mut self, mesh: MeshId, parent: NodeId) -> Result<PrimitiveId>;

    // ========================================================================
    // Cameras and lights
    // ========================================================================

    fn create_camera(&mut self, parent: NodeId) -> PrimitiveId;

    /// Aims a camera at a world-space point.
    fn point_camera_at(&mut self, camera: PrimitiveId, target: Vec3);

    fn create_light(&mut self, parent: NodeId, light: LightDesc) -> PrimitiveId;

    fn update_light(&mut self, light: PrimitiveId, desc: LightDesc);

    fn dispose_primitive(&mut self, primitive: PrimitiveId);

    // ========================================================================
    // Environment
    // ========================================================================

    fn set_environment(&mut self, environment: Environment);
}

/// The render backend as shared between the engine, the world and script
/// handles. The runtime is single-threaded.
pub type SharedRenderer = Rc<RefCell<dyn RenderBackend>>;
