use super::ObjectKey;
use super::components::{CameraComponent, LightComponent, MeshComponent};
use super::script::ScriptComponent;
use crate::cartridge::loader::tags;
use crate::errors::Result;
use crate::script::ComponentRef;

/// Discriminant of a [`Component`], matching the manifest type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Mesh,
    Script,
    Camera,
    DirectionalLight,
    PointLight,
}

impl ComponentKind {
    /// The manifest type tag, also used as the kind name seen by scripts.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Mesh => tags::MESH,
            Self::Script => tags::SCRIPT,
            Self::Camera => tags::CAMERA,
            Self::DirectionalLight => tags::DIRECTIONAL_LIGHT,
            Self::PointLight => tags::POINT_LIGHT,
        }
    }
}

/// A live component attached to a game object.
///
/// The set of kinds is closed; built-in kinds do their work when created and
/// disposed, script components forward every lifecycle step to their hooks.
pub enum Component {
    Mesh(MeshComponent),
    Script(ScriptComponent),
    Camera(CameraComponent),
    DirectionalLight(LightComponent),
    PointLight(LightComponent),
}

impl Component {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Mesh(c) => c.id(),
            Self::Script(c) => c.id(),
            Self::Camera(c) => c.id(),
            Self::DirectionalLight(c) | Self::PointLight(c) => c.id(),
        }
    }

    /// The object this component is attached to.
    #[must_use]
    pub fn object(&self) -> ObjectKey {
        match self {
            Self::Mesh(c) => c.object(),
            Self::Script(c) => c.object(),
            Self::Camera(c) => c.object(),
            Self::DirectionalLight(c) | Self::PointLight(c) => c.object(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Mesh(_) => ComponentKind::Mesh,
            Self::Script(_) => ComponentKind::Script,
            Self::Camera(_) => ComponentKind::Camera,
            Self::DirectionalLight(_) => ComponentKind::DirectionalLight,
            Self::PointLight(_) => ComponentKind::PointLight,
        }
    }

    #[must_use]
    pub fn as_script(&self) -> Option<&ScriptComponent> {
        match self {
            Self::Script(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_light_mut(&mut self) -> Option<&mut LightComponent> {
        match self {
            Self::DirectionalLight(c) | Self::PointLight(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_camera_mut(&mut self) -> Option<&mut CameraComponent> {
        match self {
            Self::Camera(c) => Some(c),
            _ => None,
        }
    }

    /// Script-side view of this component.
    pub(crate) fn script_ref(&self) -> ComponentRef {
        match self {
            Self::Mesh(c) => c.script_ref(),
            Self::Script(c) => c.script_ref(),
            Self::Camera(c) => c.script_ref(),
            Self::DirectionalLight(c) | Self::PointLight(c) => c.script_ref(),
        }
    }

    pub(crate) fn init(&mut self) -> Result<()> {
        match self {
            Self::Script(c) => c.init(),
            _ => Ok(()),
        }
    }

    pub(crate) fn update(&mut self, delta: f32) -> Result<()> {
        match self {
            Self::Script(c) => c.update(delta),
            _ => Ok(()),
        }
    }

    /// Releases the component's renderer resources or runs its script hook.
    /// Errors are logged, never returned.
    pub(crate) fn on_destroy(&mut self) {
        match self {
            Self::Mesh(c) => c.on_destroy(),
            Self::Script(c) => c.on_destroy(),
            Self::Camera(c) => c.on_destroy(),
            Self::DirectionalLight(c) | Self::PointLight(c) => c.on_destroy(),
        }
    }
}
