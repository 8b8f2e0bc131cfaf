//! Configuration Model
//!
//! A renderer-independent, read-only description of a cartridge's scenes.
//! Every asset reference has already been resolved against the
//! [`AssetDb`](crate::assets::AssetDb), so a tree that exists is a tree that
//! can be instantiated.

use std::sync::Arc;

use glam::Vec3;

use crate::assets::Asset;
use crate::render::{Environment, LightDesc, LightKind};

#[derive(Debug, Clone)]
pub struct SceneData {
    pub id: String,
    pub objects: Vec<GameObjectData>,
    pub clear_color: Vec3,
    pub ambient: AmbientLightData,
}

impl SceneData {
    /// Number of objects in the scene, counting every descendant.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.iter().map(GameObjectData::subtree_len).sum()
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        Environment {
            clear_color: self.clear_color,
            ambient_color: self.ambient.color,
            ambient_intensity: self.ambient.intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLightData {
    pub intensity: f32,
    pub color: Vec3,
}

#[derive(Debug, Clone)]
pub struct GameObjectData {
    pub id: String,
    pub name: String,
    pub transform: TransformData,
    pub components: Vec<ComponentData>,
    pub children: Vec<GameObjectData>,
}

impl GameObjectData {
    /// This object plus all of its descendants.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(GameObjectData::subtree_len)
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformData {
    pub position: Vec3,
    /// Euler XYZ, radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Configuration of one component. Carries no live handles.
#[derive(Debug, Clone)]
pub enum ComponentData {
    Mesh {
        id: String,
        mesh: Option<Arc<Asset>>,
    },
    Script {
        id: String,
        script: Option<Arc<Asset>>,
    },
    Camera {
        id: String,
    },
    DirectionalLight {
        id: String,
        light: LightData,
    },
    PointLight {
        id: String,
        light: LightData,
    },
}

impl ComponentData {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Mesh { id, .. }
            | Self::Script { id, .. }
            | Self::Camera { id }
            | Self::DirectionalLight { id, .. }
            | Self::PointLight { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    pub intensity: f32,
    pub color: Vec3,
}

impl LightData {
    #[must_use]
    pub fn describe(self, kind: LightKind) -> LightDesc {
        LightDesc {
            kind,
            color: self.color,
            intensity: self.intensity,
        }
    }
}
