//! Manifest → configuration model conversion.
//!
//! Pure and depth-first: every child is fully built before its parent is
//! returned, and the first error aborts the whole conversion.

use serde::de::DeserializeOwned;

use super::data::{
    AmbientLightData, ComponentData, GameObjectData, LightData, SceneData, TransformData,
};
use super::manifest::{
    ComponentDefinition, GameObjectDefinition, LightProperties, MeshProperties, SceneDefinition,
    ScriptProperties, TransformDefinition,
};
use crate::assets::{AssetDb, AssetKind};
use crate::errors::{ConfigError, Result};

/// Manifest tag of each component kind.
pub mod tags {
    pub const MESH: &str = "mesh";
    pub const SCRIPT: &str = "script";
    pub const CAMERA: &str = "camera";
    pub const DIRECTIONAL_LIGHT: &str = "light_directional";
    pub const POINT_LIGHT: &str = "light_point";
}

pub fn load_scene(definition: &SceneDefinition, assets: &AssetDb) -> Result<SceneData> {
    let objects = definition
        .objects
        .iter()
        .map(|object| load_object(object, assets))
        .collect::<Result<Vec<_>>>()?;

    let ambient = &definition.config.lighting.ambient;
    Ok(SceneData {
        id: definition.id.clone(),
        objects,
        clear_color: definition.config.clear_color.into(),
        ambient: AmbientLightData {
            intensity: ambient.intensity,
            color: ambient.color.into(),
        },
    })
}

pub fn load_object(definition: &GameObjectDefinition, assets: &AssetDb) -> Result<GameObjectData> {
    let children = definition
        .children
        .iter()
        .map(|child| load_object(child, assets))
        .collect::<Result<Vec<_>>>()?;

    let components = definition
        .components
        .iter()
        .map(|component| load_component(component, definition, assets))
        .collect::<Result<Vec<_>>>()?;

    Ok(GameObjectData {
        id: definition.id.clone(),
        name: definition.name.clone(),
        transform: load_transform(&definition.transform),
        components,
        children,
    })
}

fn load_transform(definition: &TransformDefinition) -> TransformData {
    TransformData {
        position: definition.position.into(),
        rotation: definition.rotation.into(),
        scale: definition.scale.into(),
    }
}

fn load_component(
    definition: &ComponentDefinition,
    owner: &GameObjectDefinition,
    assets: &AssetDb,
) -> Result<ComponentData> {
    let id = definition.id.clone();
    let data = match definition.kind.as_str() {
        tags::MESH => {
            let props: MeshProperties = properties(definition, owner)?;
            let mesh = props
                .mesh_file_id
                .map(|asset_id| assets.resolve_as(&asset_id, AssetKind::Mesh))
                .transpose()?;
            ComponentData::Mesh { id, mesh }
        }
        tags::SCRIPT => {
            let props: ScriptProperties = properties(definition, owner)?;
            let script = props
                .script_file_id
                .map(|asset_id| assets.resolve_as(&asset_id, AssetKind::Script))
                .transpose()?;
            ComponentData::Script { id, script }
        }
        tags::CAMERA => ComponentData::Camera { id },
        tags::DIRECTIONAL_LIGHT => ComponentData::DirectionalLight {
            id,
            light: light(definition, owner)?,
        },
        tags::POINT_LIGHT => ComponentData::PointLight {
            id,
            light: light(definition, owner)?,
        },
        other => {
            return Err(ConfigError::UnknownComponentType {
                kind: other.to_string(),
                component: definition.id.clone(),
                object: owner.id.clone(),
            }
            .into());
        }
    };
    Ok(data)
}

fn light(definition: &ComponentDefinition, owner: &GameObjectDefinition) -> Result<LightData> {
    let props: LightProperties = properties(definition, owner)?;
    Ok(LightData {
        intensity: props.intensity,
        color: props.color.into(),
    })
}

fn properties<T: DeserializeOwned>(
    definition: &ComponentDefinition,
    owner: &GameObjectDefinition,
) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(definition.properties.clone())).map_err(
        |source| {
            ConfigError::InvalidComponent {
                component: definition.id.clone(),
                object: owner.id.clone(),
                source,
            }
            .into()
        },
    )
}
