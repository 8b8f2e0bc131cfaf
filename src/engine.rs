//! Engine Core Module
//!
//! [`Engine`] sequences a cartridge from bytes to a running scene and drives
//! it frame by frame. It owns no window and no GPU: rendering goes through the
//! injected [`RenderBackend`](crate::render::RenderBackend) and input through
//! an [`InputSource`] passed to every update.
//!
//! # Lifecycle
//!
//! 1. Create with [`Engine::new`]
//! 2. Load a cartridge with [`Engine::load_cartridge`] (or one of the
//!    `load_archive_*` / [`load_directory`](Engine::load_directory) helpers)
//! 3. Call [`Engine::update`] every frame
//! 4. Switch scenes with [`Engine::load_scene`], or tear down with [`Engine::dispose`]
//!
//! # Example
//!
//! ```rust,ignore
//! use std::{cell::RefCell, rc::Rc};
//! use pixelcart::{Engine, RuntimeSettings, input::NoInput, render::HeadlessRenderer};
//!
//! let renderer = Rc::new(RefCell::new(HeadlessRenderer::new()));
//! let mut engine = Engine::new(renderer.clone(), RuntimeSettings::default());
//!
//! // File loaders read through `tokio::fs`, so they need a Tokio runtime.
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()?;
//! runtime.block_on(engine.load_archive_file("game.cart"))?;
//!
//! loop {
//!     engine.update(1.0 / 60.0, &NoInput);
//! }
//! ```

use std::path::Path;
use std::rc::Rc;

use crate::assets::AssetKind;
use crate::cartridge::{Cartridge, CartridgeArchive};
use crate::errors::Result;
use crate::input::{InputSource, InputState, SharedInput};
use crate::render::SharedRenderer;
use crate::script::{ModuleLoader, ScriptHost, builtins};
use crate::settings::RuntimeSettings;
use crate::world::{MeshCache, SceneInstantiator, World};

/// Everything that lives exactly as long as one loaded cartridge.
struct Session {
    cartridge: Cartridge,
    modules: ModuleLoader,
    meshes: MeshCache,
    world: World,
    scene_index: usize,
}

/// The runtime instance that owns the loaded cartridge and its live scene.
pub struct Engine {
    settings: RuntimeSettings,
    renderer: SharedRenderer,
    input: SharedInput,
    session: Option<Session>,

    time: f32,
    frame_count: u64,
}

impl Engine {
    #[must_use]
    pub fn new(renderer: SharedRenderer, settings: RuntimeSettings) -> Self {
        Self {
            settings,
            renderer,
            input: SharedInput::default(),
            session: None,
            time: 0.0,
            frame_count: 0,
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Loads a cartridge and instantiates its initial scene.
    ///
    /// Any previous cartridge is disposed first. Every script is registered
    /// before a scene is built, so a malformed script fails the load with no
    /// world created. On error the engine is left unloaded.
    pub async fn load_cartridge(&mut self, cartridge: Cartridge) -> Result<()> {
        self.dispose();

        let host = Rc::new(ScriptHost::new(&self.settings.scripts));
        let mut modules = ModuleLoader::new(host);
        for (id, value) in builtins::standard(&self.input) {
            modules.inject_builtin(id, value);
        }

        let assets = cartridge.assets();
        for asset in assets.assets_of_kind(AssetKind::Script) {
            let source = assets.load(asset).await?;
            modules.register_script(asset, &source)?;
        }

        let scene_index = self.settings.initial_scene;
        let scene = cartridge.scene(scene_index)?;
        let mut meshes = MeshCache::new();
        let world = SceneInstantiator::new(assets, &mut modules, &mut meshes, self.renderer.clone())
            .instantiate(scene)
            .await;

        let world = match world {
            Ok(world) => world,
            Err(err) => {
                meshes.dispose(&self.renderer);
                return Err(err);
            }
        };

        self.session = Some(Session {
            cartridge,
            modules,
            meshes,
            world,
            scene_index,
        });
        Ok(())
    }

    /// Loads a cartridge from zip bytes held in memory.
    pub async fn load_archive_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let cartridge = Cartridge::from_bytes(bytes)?;
        self.load_cartridge(cartridge).await
    }

    /// Loads a cartridge zip from disk.
    pub async fn load_archive_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let archive = CartridgeArchive::open(path).await?;
        self.load_cartridge(Cartridge::from_archive(archive)?).await
    }

    /// Loads an unpacked cartridge directory.
    pub async fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let cartridge = Cartridge::from_directory(path).await?;
        self.load_cartridge(cartridge).await
    }

    /// Replaces the live world with another scene of the loaded cartridge.
    ///
    /// Resolved script modules and loaded mesh containers are reused. If the
    /// new scene fails to build the engine keeps the cartridge with an empty
    /// world.
    pub async fn load_scene(&mut self, index: usize) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            log::warn!("load_scene({index}) called with no cartridge loaded");
            return Ok(());
        };
        let scene = session.cartridge.scene(index)?;

        session.world.destroy();
        let built = SceneInstantiator::new(
            session.cartridge.assets(),
            &mut session.modules,
            &mut session.meshes,
            self.renderer.clone(),
        )
        .instantiate(scene)
        .await;

        match built {
            Ok(world) => {
                session.world = world;
                session.scene_index = index;
                Ok(())
            }
            Err(err) => {
                session.world = World::new(self.renderer.clone());
                Err(err)
            }
        }
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Advances one frame: polls input, then updates the live world.
    pub fn update(&mut self, delta: f32, input: &dyn InputSource) {
        self.input.borrow_mut().poll(input);
        self.time += delta;
        self.frame_count += 1;

        if let Some(session) = self.session.as_mut() {
            session.world.update(delta);
        }
    }

    /// Destroys the live world and releases the cartridge's render resources.
    pub fn dispose(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.world.destroy();
            session.meshes.dispose(&self.renderer);
            log::info!("Cartridge unloaded");
        }
        self.input.borrow_mut().clear();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn world(&self) -> Option<&World> {
        self.session.as_ref().map(|s| &s.world)
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.session.as_mut().map(|s| &mut s.world)
    }

    #[must_use]
    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.session.as_ref().map(|s| &s.cartridge)
    }

    #[must_use]
    pub fn modules(&self) -> Option<&ModuleLoader> {
        self.session.as_ref().map(|s| &s.modules)
    }

    #[must_use]
    pub fn mesh_cache(&self) -> Option<&MeshCache> {
        self.session.as_ref().map(|s| &s.meshes)
    }

    /// Index of the scene currently in the world.
    #[must_use]
    pub fn scene_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.scene_index)
    }

    #[must_use]
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    #[must_use]
    pub fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    #[must_use]
    pub fn input(&self) -> std::cell::Ref<'_, InputState> {
        self.input.borrow()
    }

    /// Seconds of simulated time since creation.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
