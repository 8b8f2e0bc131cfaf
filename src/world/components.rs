use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;

use super::ObjectKey;
use crate::assets::Asset;
use crate::render::{LightDesc, LightKind, PrimitiveId, SharedRenderer};
use crate::script::ComponentRef;

/// Displays a mesh container under the owning object's node.
pub struct MeshComponent {
    id: String,
    object: ObjectKey,
    mesh: Option<Arc<Asset>>,
    instance: Option<PrimitiveId>,
    renderer: SharedRenderer,
}

impl MeshComponent {
    pub(crate) fn new(
        id: &str,
        object: ObjectKey,
        mesh: Option<Arc<Asset>>,
        instance: Option<PrimitiveId>,
        renderer: SharedRenderer,
    ) -> Self {
        Self {
            id: id.to_string(),
            object,
            mesh,
            instance,
            renderer,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn object(&self) -> ObjectKey {
        self.object
    }

    /// The mesh asset, if one is assigned.
    #[must_use]
    pub fn mesh(&self) -> Option<&Arc<Asset>> {
        self.mesh.as_ref()
    }

    #[must_use]
    pub fn instance(&self) -> Option<PrimitiveId> {
        self.instance
    }

    pub(crate) fn script_ref(&self) -> ComponentRef {
        ComponentRef::mesh(&self.id, self.mesh.as_ref().map(|asset| asset.id().to_string()))
    }

    pub(crate) fn on_destroy(&mut self) {
        if let Some(instance) = self.instance.take() {
            self.renderer.borrow_mut().dispose_primitive(instance);
        }
    }
}

pub struct CameraComponent {
    id: String,
    object: ObjectKey,
    camera: PrimitiveId,
    renderer: SharedRenderer,
}

impl CameraComponent {
    pub(crate) fn new(id: &str, object: ObjectKey, camera: PrimitiveId, renderer: SharedRenderer) -> Self {
        Self {
            id: id.to_string(),
            object,
            camera,
            renderer,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn object(&self) -> ObjectKey {
        self.object
    }

    #[must_use]
    pub fn primitive(&self) -> PrimitiveId {
        self.camera
    }

    /// Aims the camera at a world-space point.
    pub fn point_at(&mut self, target: Vec3) {
        self.renderer.borrow_mut().point_camera_at(self.camera, target);
    }

    pub(crate) fn script_ref(&self) -> ComponentRef {
        ComponentRef::camera(&self.id, self.camera, self.renderer.clone())
    }

    pub(crate) fn on_destroy(&mut self) {
        self.renderer.borrow_mut().dispose_primitive(self.camera);
    }
}

/// A directional or point light.
///
/// The parameters are shared with script handles to the same light, so a
/// change made from either side is seen by both.
pub struct LightComponent {
    id: String,
    object: ObjectKey,
    light: PrimitiveId,
    desc: Rc<Cell<LightDesc>>,
    renderer: SharedRenderer,
}

impl LightComponent {
    pub(crate) fn new(
        id: &str,
        object: ObjectKey,
        light: PrimitiveId,
        desc: LightDesc,
        renderer: SharedRenderer,
    ) -> Self {
        Self {
            id: id.to_string(),
            object,
            light,
            desc: Rc::new(Cell::new(desc)),
            renderer,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn object(&self) -> ObjectKey {
        self.object
    }

    #[must_use]
    pub fn primitive(&self) -> PrimitiveId {
        self.light
    }

    #[must_use]
    pub fn kind(&self) -> LightKind {
        self.desc.get().kind
    }

    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.desc.get().intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        let desc = LightDesc {
            intensity,
            ..self.desc.get()
        };
        update_light(&self.renderer, self.light, &self.desc, desc);
    }

    #[must_use]
    pub fn color(&self) -> Vec3 {
        self.desc.get().color
    }

    pub fn set_color(&mut self, color: Vec3) {
        let desc = LightDesc {
            color,
            ..self.desc.get()
        };
        update_light(&self.renderer, self.light, &self.desc, desc);
    }

    pub(crate) fn script_ref(&self) -> ComponentRef {
        ComponentRef::light(&self.id, self.light, self.desc.clone(), self.renderer.clone())
    }

    pub(crate) fn on_destroy(&mut self) {
        self.renderer.borrow_mut().dispose_primitive(self.light);
    }
}

/// Stores new light parameters and pushes them to the primitive.
pub(crate) fn update_light(
    renderer: &SharedRenderer,
    light: PrimitiveId,
    shared: &Cell<LightDesc>,
    desc: LightDesc,
) {
    shared.set(desc);
    renderer.borrow_mut().update_light(light, desc);
}
