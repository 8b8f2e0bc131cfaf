use glam::{Affine3A, EulerRot, Quat, Vec3};
use slotmap::SlotMap;

use super::{Environment, LightDesc, MeshId, NodeId, PrimitiveId, RenderBackend};
use crate::errors::{Error, Result};

#[derive(Debug, Clone)]
struct HeadlessNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
}

impl HeadlessNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    fn local_matrix(&self) -> Affine3A {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Affine3A::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// What a primitive is; exposed for inspection in tests and tools.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessPrimitive {
    Mesh(MeshId),
    Camera { target: Option<Vec3> },
    Light(LightDesc),
}

#[derive(Debug, Clone)]
struct HeadlessMesh {
    extension: String,
    byte_len: usize,
}

/// An in-memory render backend.
///
/// Keeps a real node hierarchy (so world matrices resolve the same way a GPU
/// renderer would) and counts mesh loads. Stale handles are ignored with a
/// warning.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    nodes: SlotMap<NodeId, HeadlessNode>,
    root_nodes: Vec<NodeId>,
    primitives: SlotMap<PrimitiveId, (NodeId, HeadlessPrimitive)>,
    meshes: SlotMap<MeshId, HeadlessMesh>,
    mesh_loads: usize,
    environment: Environment,
}

const SUPPORTED_MESH_EXTENSIONS: &[&str] = &["obj", "fbx", "gltf", "glb", "stl"];

impl HeadlessRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Mesh containers currently alive.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Total number of `load_mesh` calls that succeeded.
    #[must_use]
    pub fn mesh_loads(&self) -> usize {
        self.mesh_loads
    }

    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    #[must_use]
    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(|n| n.name.as_str())
    }

    #[must_use]
    pub fn node_children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map_or(&[][..], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    /// Primitives attached directly to a node.
    pub fn primitives_of(&self, node: NodeId) -> impl Iterator<Item = &HeadlessPrimitive> {
        self.primitives
            .values()
            .filter(move |(owner, _)| *owner == node)
            .map(|(_, primitive)| primitive)
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Writes an indented outline of the node hierarchy.
    #[must_use]
    pub fn describe_hierarchy(&self) -> String {
        let mut out = String::new();
        for &root in &self.root_nodes {
            self.describe_node(root, 0, &mut out);
        }
        out
    }

    fn describe_node(&self, node: NodeId, depth: usize, out: &mut String) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        let primitives = self.primitives_of(node).count();
        out.push_str(&format!(
            "{:indent$}{} @ {:?} ({primitives} primitives)\n",
            "",
            n.name,
            n.position,
            indent = depth * 2
        ));
        for &child in &n.children {
            self.describe_node(child, depth + 1, out);
        }
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn node_mut(&mut self, node: NodeId) -> Option<&mut HeadlessNode> {
        let found = self.nodes.get_mut(node);
        if found.is_none() {
            log::warn!("HeadlessRenderer: stale node handle {node:?}");
        }
        found
    }

    fn detach(&mut self, node: NodeId) {
        let old_parent = self.nodes.get(node).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(parent) = self.nodes.get_mut(p)
                && let Some(i) = parent.children.iter().position(|&x| x == node)
            {
                parent.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == node) {
            self.root_nodes.remove(i);
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = None;
        }
    }

    fn attach_primitive(&mut self, parent: NodeId, primitive: HeadlessPrimitive) -> PrimitiveId {
        if !self.nodes.contains_key(parent) {
            log::warn!("HeadlessRenderer: primitive attached to stale node {parent:?}");
        }
        self.primitives.insert((parent, primitive))
    }
}

impl RenderBackend for HeadlessRenderer {
    fn create_node(&mut self, name: &str) -> NodeId {
        let id = self.nodes.insert(HeadlessNode::new(name));
        self.root_nodes.push(id);
        id
    }

    fn dispose_node(&mut self, node: NodeId) {
        let Some(children) = self.nodes.get(node).map(|n| n.children.clone()) else {
            return;
        };
        for child in children {
            self.dispose_node(child);
        }
        self.detach(node);
        self.primitives.retain(|_, (owner, _)| *owner != node);
        self.nodes.remove(node);
    }

    fn set_node_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        if Some(node) == parent {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(node) {
            log::warn!("HeadlessRenderer: stale node handle {node:?}");
            return;
        }
        self.detach(node);

        match parent {
            Some(p) if self.nodes.contains_key(p) => {
                if let Some(parent_node) = self.nodes.get_mut(p) {
                    parent_node.children.push(node);
                }
                if let Some(n) = self.nodes.get_mut(node) {
                    n.parent = Some(p);
                }
            }
            Some(_) => {
                log::error!("Parent node not found during attach!");
                self.root_nodes.push(node);
            }
            None => self.root_nodes.push(node),
        }
    }

    fn node_position(&self, node: NodeId) -> Vec3 {
        self.nodes.get(node).map_or(Vec3::ZERO, |n| n.position)
    }

    fn set_node_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(n) = self.node_mut(node) {
            n.position = position;
        }
    }

    fn node_rotation(&self, node: NodeId) -> Vec3 {
        self.nodes.get(node).map_or(Vec3::ZERO, |n| n.rotation)
    }

    fn set_node_rotation(&mut self, node: NodeId, rotation: Vec3) {
        if let Some(n) = self.node_mut(node) {
            n.rotation = rotation;
        }
    }

    fn node_scale(&self, node: NodeId) -> Vec3 {
        self.nodes.get(node).map_or(Vec3::ONE, |n| n.scale)
    }

    fn set_node_scale(&mut self, node: NodeId, scale: Vec3) {
        if let Some(n) = self.node_mut(node) {
            n.scale = scale;
        }
    }

    fn node_parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    fn node_world_matrix(&self, node: NodeId) -> Affine3A {
        let mut matrix = Affine3A::IDENTITY;
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = self.nodes.get(id) else {
                break;
            };
            matrix = n.local_matrix() * matrix;
            current = n.parent;
        }
        matrix
    }

    fn load_mesh(&mut self, bytes: &[u8], extension: &str) -> Result<MeshId> {
        let extension = extension.to_ascii_lowercase();
        if !SUPPORTED_MESH_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::Render(format!(
                "unsupported mesh format '.{extension}'"
            )));
        }
        self.mesh_loads += 1;
        Ok(self.meshes.insert(HeadlessMesh {
            extension,
            byte_len: bytes.len(),
        }))
    }

    fn dispose_mesh(&mut self, mesh: MeshId) {
        if let Some(removed) = self.meshes.remove(mesh) {
            log::debug!(
                "HeadlessRenderer: disposed .{} mesh ({} bytes)",
                removed.extension,
                removed.byte_len
            );
        }
        self.primitives
            .retain(|_, (_, primitive)| *primitive != HeadlessPrimitive::Mesh(mesh));
    }

    fn instantiate_mesh(&mut self, mesh: MeshId, parent: NodeId) -> Result<PrimitiveId> {
        if !self.meshes.contains_key(mesh) {
            return Err(Error::Render(format!("mesh {mesh:?} is not loaded")));
        }
        Ok(self.attach_primitive(parent, HeadlessPrimitive::Mesh(mesh)))
    }

    fn create_camera(&mut self, parent: NodeId) -> PrimitiveId {
        self.attach_primitive(parent, HeadlessPrimitive::Camera { target: None })
    }

    fn point_camera_at(&mut self, camera: PrimitiveId, target: Vec3) {
        match self.primitives.get_mut(camera) {
            Some((_, HeadlessPrimitive::Camera { target: current })) => *current = Some(target),
            _ => log::warn!("HeadlessRenderer: {camera:?} is not a camera"),
        }
    }

    fn create_light(&mut self, parent: NodeId, light: LightDesc) -> PrimitiveId {
        self.attach_primitive(parent, HeadlessPrimitive::Light(light))
    }

    fn update_light(&mut self, light: PrimitiveId, desc: LightDesc) {
        match self.primitives.get_mut(light) {
            Some((_, HeadlessPrimitive::Light(current))) => *current = desc,
            _ => log::warn!("HeadlessRenderer: {light:?} is not a light"),
        }
    }

    fn dispose_primitive(&mut self, primitive: PrimitiveId) {
        self.primitives.remove(primitive);
    }

    fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }
}

/// Decomposes a world matrix into translation, Euler rotation and scale.
#[must_use]
pub fn decompose(matrix: Affine3A) -> (Vec3, Vec3, Vec3) {
    let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    (translation, Vec3::new(x, y, z), scale)
}
