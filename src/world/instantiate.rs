//! Scene Instantiation
//!
//! Turns a [`SceneData`] tree into a live [`World`]:
//!
//! 1. build every object tree in manifest order, adding objects pre-order
//!    (parent before children) to a fresh staging world;
//! 2. once the whole scene exists, `init()` every object in insertion order;
//! 3. apply the scene environment to the renderer.
//!
//! Any failure destroys the staging world, so a failed load leaves no objects,
//! no render nodes and the previous environment behind.

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use rustc_hash::FxHashMap;

use super::ObjectKey;
use super::component::Component;
use super::components::{CameraComponent, LightComponent, MeshComponent};
use super::graph::World;
use super::object::GameObject;
use super::script::ScriptComponent;
use crate::assets::{Asset, AssetDb};
use crate::cartridge::{ComponentData, GameObjectData, SceneData};
use crate::errors::{Result, SceneError};
use crate::render::{LightKind, MeshId, SharedRenderer};
use crate::script::{ModuleLoader, module_id_for_path};

/// Loaded mesh containers of one cartridge, keyed by asset id.
///
/// Entries live until [`MeshCache::dispose`]; there is no eviction.
#[derive(Default)]
pub struct MeshCache {
    containers: FxHashMap<String, MeshId>,
    loads: usize,
}

impl MeshCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, asset_id: &str) -> Option<MeshId> {
        self.containers.get(asset_id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// How many containers were actually loaded (cache misses).
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Returns the cached container for `asset` or loads it.
    pub async fn get_or_load(
        &mut self,
        asset: &Asset,
        assets: &AssetDb,
        renderer: &SharedRenderer,
    ) -> Result<MeshId> {
        if let Some(mesh) = self.get(asset.id()) {
            log::debug!("Mesh cache hit for '{}'", asset.id());
            return Ok(mesh);
        }

        let bytes = assets.load(asset).await?;
        let mesh = renderer
            .borrow_mut()
            .load_mesh(&bytes, asset.extension())?;
        self.containers.insert(asset.id().to_string(), mesh);
        self.loads += 1;
        log::debug!("Loaded mesh container '{}'", asset.id());
        Ok(mesh)
    }

    /// Releases every container.
    pub fn dispose(&mut self, renderer: &SharedRenderer) {
        let mut backend = renderer.borrow_mut();
        for (_, mesh) in self.containers.drain() {
            backend.dispose_mesh(mesh);
        }
    }
}

/// Builds live worlds for one cartridge.
///
/// Borrows the cartridge's long-lived state: its assets, its resolved script
/// modules and its mesh cache.
pub struct SceneInstantiator<'a> {
    assets: &'a AssetDb,
    modules: &'a mut ModuleLoader,
    meshes: &'a mut MeshCache,
    renderer: SharedRenderer,
}

impl<'a> SceneInstantiator<'a> {
    pub fn new(
        assets: &'a AssetDb,
        modules: &'a mut ModuleLoader,
        meshes: &'a mut MeshCache,
        renderer: SharedRenderer,
    ) -> Self {
        Self {
            assets,
            modules,
            meshes,
            renderer,
        }
    }

    /// Instantiates and initializes a scene. The scene environment is applied
    /// only once the scene has been built.
    pub async fn instantiate(&mut self, scene: &SceneData) -> Result<World> {
        let mut world = World::new(self.renderer.clone());
        if let Err(err) = self.populate(&mut world, scene).await {
            log::error!("Failed to instantiate scene '{}': {err}", scene.id);
            world.destroy();
            return Err(err);
        }
        self.renderer.borrow_mut().set_environment(scene.environment());

        log::info!(
            "Scene '{}' instantiated ({} objects, {} mesh containers)",
            scene.id,
            world.len(),
            self.meshes.len()
        );
        Ok(world)
    }

    async fn populate(&mut self, world: &mut World, scene: &SceneData) -> Result<()> {
        for object in &scene.objects {
            self.build_object(world, object, None).await?;
        }
        world.init()
    }

    fn build_object<'s>(
        &'s mut self,
        world: &'s mut World,
        data: &'s GameObjectData,
        parent: Option<ObjectKey>,
    ) -> LocalBoxFuture<'s, Result<ObjectKey>> {
        async move {
            let key = world.add_object(GameObject::new(
                &data.id,
                &data.name,
                &self.renderer,
                &data.transform,
            ));
            if parent.is_some() {
                world.set_parent(key, parent)?;
            }

            for component in &data.components {
                // Duplicates are rejected before any primitive is created.
                if world.get(key).is_some_and(|o| o.component(component.id()).is_some()) {
                    return Err(SceneError::DuplicateComponent(component.id().to_string()).into());
                }
                if let Some(component) = self.build_component(world, key, component).await? {
                    world.add_component(key, component)?;
                }
            }

            for child in &data.children {
                self.build_object(world, child, Some(key)).await?;
            }
            Ok(key)
        }
        .boxed_local()
    }

    /// Creates the live component for `data`. Script components without an
    /// assigned script are skipped.
    async fn build_component(
        &mut self,
        world: &World,
        key: ObjectKey,
        data: &ComponentData,
    ) -> Result<Option<Component>> {
        let object = world.get(key).ok_or(SceneError::ObjectNotFound)?;
        let node = object.transform().node();
        let renderer = self.renderer.clone();

        let component = match data {
            ComponentData::Mesh { id, mesh } => {
                let instance = match mesh {
                    Some(asset) => {
                        let container = self
                            .meshes
                            .get_or_load(asset, self.assets, &self.renderer)
                            .await?;
                        Some(self.renderer.borrow_mut().instantiate_mesh(container, node)?)
                    }
                    None => None,
                };
                Component::Mesh(MeshComponent::new(id, key, mesh.clone(), instance, renderer))
            }
            ComponentData::Script { id, script } => {
                let Some(asset) = script else {
                    log::debug!("Script component '{id}' on '{}' has no script; skipped", object.id());
                    return Ok(None);
                };
                let module = module_id_for_path(asset.path())?;
                let constructor = self.modules.default_export(asset)?;
                Component::Script(ScriptComponent::instantiate(
                    id,
                    key,
                    &module,
                    constructor,
                    world.script_handle(key)?,
                    self.modules.host().clone(),
                )?)
            }
            ComponentData::Camera { id } => {
                let camera = self.renderer.borrow_mut().create_camera(node);
                Component::Camera(CameraComponent::new(id, key, camera, renderer))
            }
            ComponentData::DirectionalLight { id, light } => {
                let desc = light.describe(LightKind::Directional);
                let primitive = self.renderer.borrow_mut().create_light(node, desc);
                Component::DirectionalLight(LightComponent::new(id, key, primitive, desc, renderer))
            }
            ComponentData::PointLight { id, light } => {
                let desc = light.describe(LightKind::Point);
                let primitive = self.renderer.borrow_mut().create_light(node, desc);
                Component::PointLight(LightComponent::new(id, key, primitive, desc, renderer))
            }
        };
        Ok(Some(component))
    }
}
