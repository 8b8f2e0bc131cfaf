//! Wire format of `manifest.json`.
//!
//! These types mirror the JSON one-to-one and carry no validation; the
//! [`loader`](super::loader) turns them into the typed configuration model.

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartridgeManifest {
    #[serde(default)]
    pub scenes: Vec<SceneDefinition>,
    #[serde(default)]
    pub assets: Vec<AssetDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDefinition {
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDefinition {
    pub id: String,
    #[serde(default)]
    pub config: SceneConfigDefinition,
    #[serde(default)]
    pub objects: Vec<GameObjectDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfigDefinition {
    #[serde(default)]
    pub clear_color: ColorDefinition,
    #[serde(default)]
    pub lighting: LightingDefinition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingDefinition {
    #[serde(default)]
    pub ambient: AmbientLightDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbientLightDefinition {
    pub intensity: f32,
    pub color: ColorDefinition,
}

impl Default for AmbientLightDefinition {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            color: ColorDefinition::WHITE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObjectDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub transform: TransformDefinition,
    #[serde(default)]
    pub components: Vec<ComponentDefinition>,
    #[serde(default)]
    pub children: Vec<GameObjectDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformDefinition {
    #[serde(default)]
    pub position: VectorDefinition,
    #[serde(default)]
    pub rotation: VectorDefinition,
    #[serde(default = "VectorDefinition::one")]
    pub scale: VectorDefinition,
}

impl Default for TransformDefinition {
    fn default() -> Self {
        Self {
            position: VectorDefinition::default(),
            rotation: VectorDefinition::default(),
            scale: VectorDefinition::one(),
        }
    }
}

/// A component entry. The properties beyond `id` and `type` depend on the
/// tag, so they are kept as raw JSON until the tag has been checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshProperties {
    #[serde(default)]
    pub mesh_file_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptProperties {
    #[serde(default)]
    pub script_file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightProperties {
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "ColorDefinition::white")]
    pub color: ColorDefinition,
}

fn default_intensity() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorDefinition {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl VectorDefinition {
    fn one() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

impl From<VectorDefinition> for Vec3 {
    fn from(v: VectorDefinition) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorDefinition {
    #[serde(default)]
    pub r: f32,
    #[serde(default)]
    pub g: f32,
    #[serde(default)]
    pub b: f32,
}

impl ColorDefinition {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    fn white() -> Self {
        Self::WHITE
    }
}

impl From<ColorDefinition> for Vec3 {
    fn from(c: ColorDefinition) -> Self {
        Vec3::new(c.r, c.g, c.b)
    }
}
