//! Engine Integration Tests
//!
//! Tests for:
//! - Cartridge loading end to end: object counts, mesh sharing, failures
//! - Per-frame updates: script hooks, input edges, timing
//! - Scene switching and disposal
//! - Runtime settings

mod common;

use common::{CartridgeBuilder, object};
use glam::Vec3;
use pixelcart::errors::{ConfigError, Error, ScriptError};
use pixelcart::input::{InputButton, NoInput};
use pixelcart::{Engine, RuntimeSettings};
use rustc_hash::FxHashSet;
use serde_json::json;

const SPINNER: &str = r#"
define(["exports", "input", "./tuning"], |exports, input, tuning| {
    exports["default"] = |object| #{
        update: |dt| {
            if input.is_pressed("A") {
                object.translate(vec3(tuning.step, 0.0, 0.0));
            }
        },
    };
});
"#;

const TUNING: &str = r#"define([], || #{ step: 2.0 });"#;

fn two_crates() -> CartridgeBuilder {
    CartridgeBuilder::new()
        .asset("crate", "models/crate.glb", b"glb")
        .scene(
            "main",
            json!([
                object("left", "Left", json!([{ "id": "m", "type": "mesh", "meshFileId": "crate" }]), json!([])),
                object("right", "Right", json!([{ "id": "m", "type": "mesh", "meshFileId": "crate" }]), json!([])),
            ]),
        )
}

fn pad(buttons: &[InputButton]) -> FxHashSet<InputButton> {
    buttons.iter().copied().collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn two_objects_one_shared_mesh() {
    let (renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    pollster::block_on(engine.load_archive_bytes(&two_crates().build())).unwrap();

    assert!(engine.is_loaded());
    assert_eq!(engine.world().unwrap().len(), 2);
    assert_eq!(engine.mesh_cache().unwrap().loads(), 1);
    assert_eq!(renderer.borrow().mesh_loads(), 1);
    assert_eq!(renderer.borrow().primitive_count(), 2);
    assert_eq!(engine.scene_index(), Some(0));
}

#[test]
fn live_object_count_matches_configuration() {
    let bytes = CartridgeBuilder::new()
        .scene(
            "main",
            json!([
                object("a", "A", json!([]), json!([
                    object("b", "B", json!([]), json!([
                        object("c", "C", json!([]), json!([])),
                    ])),
                    object("d", "D", json!([]), json!([])),
                ])),
                object("e", "E", json!([]), json!([])),
            ]),
        )
        .build();
    let (_renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    pollster::block_on(engine.load_archive_bytes(&bytes)).unwrap();

    let expected = engine.cartridge().unwrap().scene(0).unwrap().object_count();
    assert_eq!(expected, 5);
    assert_eq!(engine.world().unwrap().len(), expected);
}

#[test]
fn script_without_define_fails_before_any_scene_exists() {
    let bytes = two_crates()
        .script("bad", "bad", "let speed = 3;")
        .build();
    let (renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    let err = pollster::block_on(engine.load_archive_bytes(&bytes)).unwrap_err();

    assert!(matches!(
        err,
        Error::Script(ScriptError::ParseError { ref module, .. }) if module == "./bad"
    ));
    assert!(!engine.is_loaded());
    assert!(engine.world().is_none());
    assert_eq!(renderer.borrow().node_count(), 0);
    assert_eq!(renderer.borrow().mesh_loads(), 0);
}

#[test]
fn failed_load_replaces_previous_cartridge_with_nothing() {
    let (renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    pollster::block_on(engine.load_archive_bytes(&two_crates().build())).unwrap();

    let broken = CartridgeBuilder::new()
        .script("cycle-a", "a", r#"define(["./b"], |b| #{});"#)
        .script("cycle-b", "b", r#"define(["./a"], |a| #{});"#)
        .scene(
            "main",
            json!([object("o", "O", json!([
                { "id": "s", "type": "script", "scriptFileId": "cycle-a" },
            ]), json!([]))]),
        )
        .build();
    let err = pollster::block_on(engine.load_archive_bytes(&broken)).unwrap_err();

    assert!(matches!(err, Error::Script(ScriptError::CyclicDependency { .. })));
    assert!(!engine.is_loaded());
    assert_eq!(renderer.borrow().node_count(), 0);
    assert_eq!(renderer.borrow().mesh_count(), 0);
}

#[test]
fn initial_scene_comes_from_settings() {
    let bytes = CartridgeBuilder::new()
        .scene("title", json!([object("logo", "Logo", json!([]), json!([]))]))
        .scene("level", json!([
            object("p", "Player", json!([]), json!([])),
            object("g", "Ground", json!([]), json!([])),
        ]))
        .build();
    let settings = RuntimeSettings {
        initial_scene: 1,
        ..RuntimeSettings::default()
    };
    let (_renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, settings);
    pollster::block_on(engine.load_archive_bytes(&bytes)).unwrap();

    assert_eq!(engine.scene_index(), Some(1));
    assert!(engine.world().unwrap().find_by_id("p").is_some());
}

#[test]
fn missing_initial_scene_is_a_config_error() {
    let bytes = CartridgeBuilder::new().build();
    let (_renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    let err = pollster::block_on(engine.load_archive_bytes(&bytes)).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::SceneNotFound { index: 0, count: 0 })
    ));
    assert!(!engine.is_loaded());
}

#[tokio::test]
async fn directory_and_file_loaders() -> anyhow::Result<()> {
    let root = common::scratch_dir("engine");
    let builder = two_crates();
    let unpacked = root.join("unpacked");
    std::fs::create_dir_all(&unpacked)?;
    builder.write_to_dir(&unpacked)?;
    let packed = root.join("game.cart");
    std::fs::write(&packed, builder.build())?;

    let (renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());

    engine.load_directory(&unpacked).await?;
    assert_eq!(engine.world().map(|w| w.len()), Some(2));

    engine.load_archive_file(&packed).await?;
    assert_eq!(engine.world().map(|w| w.len()), Some(2));
    assert_eq!(renderer.borrow().node_count(), 2);

    std::fs::remove_dir_all(root)?;
    Ok(())
}

// ============================================================================
// Frames
// ============================================================================

#[test]
fn scripts_react_to_input_each_frame() {
    let bytes = CartridgeBuilder::new()
        .script("spinner", "spinner", SPINNER)
        .script("tuning", "tuning", TUNING)
        .scene(
            "main",
            json!([object("ship", "Ship", json!([
                { "id": "ctl", "type": "script", "scriptFileId": "spinner" },
            ]), json!([]))]),
        )
        .build();
    let (_renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    pollster::block_on(engine.load_archive_bytes(&bytes)).unwrap();

    let ship = engine.world().unwrap().find_by_id("ship").unwrap();
    let position = |engine: &Engine| engine.world().unwrap().get(ship).unwrap().transform().position();

    engine.update(0.016, &NoInput);
    assert_eq!(position(&engine), Vec3::ZERO);

    engine.update(0.016, &pad(&[InputButton::A]));
    assert!(engine.input().was_pressed(InputButton::A));
    assert_eq!(position(&engine), Vec3::new(2.0, 0.0, 0.0));

    engine.update(0.016, &pad(&[InputButton::A]));
    assert!(engine.input().is_pressed(InputButton::A));
    assert!(!engine.input().was_pressed(InputButton::A));
    assert_eq!(position(&engine), Vec3::new(4.0, 0.0, 0.0));

    engine.update(0.016, &NoInput);
    assert!(engine.input().was_released(InputButton::A));
    assert_eq!(position(&engine), Vec3::new(4.0, 0.0, 0.0));

    assert_eq!(engine.frame_count(), 4);
    assert!((engine.time() - 0.064).abs() < 1e-6);
}

#[test]
fn failing_update_hook_does_not_stop_the_frame() {
    let bytes = CartridgeBuilder::new()
        .script(
            "faulty",
            "faulty",
            r#"define(["exports"], |exports| {
                exports["default"] = |object| #{ update: |dt| { throw "bad frame"; } };
            });"#,
        )
        .script(
            "mover",
            "mover",
            r#"define(["exports"], |exports| {
                exports["default"] = |object| #{ update: |dt| object.translate(vec3(0, 1, 0)) };
            });"#,
        )
        .scene(
            "main",
            json!([
                object("a", "A", json!([{ "id": "f", "type": "script", "scriptFileId": "faulty" }]), json!([])),
                object("b", "B", json!([{ "id": "m", "type": "script", "scriptFileId": "mover" }]), json!([])),
            ]),
        )
        .build();
    let (_renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    pollster::block_on(engine.load_archive_bytes(&bytes)).unwrap();

    engine.update(0.1, &NoInput);
    engine.update(0.1, &NoInput);

    let world = engine.world().unwrap();
    let b = world.find_by_id("b").unwrap();
    assert_eq!(world.get(b).unwrap().transform().position(), Vec3::new(0.0, 2.0, 0.0));
}

#[test]
fn failing_init_hook_aborts_the_load() {
    let bytes = CartridgeBuilder::new()
        .script(
            "grumpy",
            "grumpy",
            r#"define(["exports"], |exports| {
                exports["default"] = |object| #{ init: || { throw "no"; } };
            });"#,
        )
        .scene(
            "main",
            json!([object("o", "O", json!([{ "id": "s", "type": "script", "scriptFileId": "grumpy" }]), json!([]))]),
        )
        .build();
    let (renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    let err = pollster::block_on(engine.load_archive_bytes(&bytes)).unwrap_err();

    assert!(matches!(err, Error::Script(ScriptError::Runtime { .. })));
    assert!(!engine.is_loaded());
    assert_eq!(renderer.borrow().node_count(), 0);
}

// ============================================================================
// Scenes & Disposal
// ============================================================================

#[test]
fn load_scene_reuses_mesh_cache() {
    let bytes = two_crates()
        .scene(
            "second",
            json!([object("solo", "Solo", json!([{ "id": "m", "type": "mesh", "meshFileId": "crate" }]), json!([]))]),
        )
        .build();
    let (renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    pollster::block_on(engine.load_archive_bytes(&bytes)).unwrap();

    pollster::block_on(engine.load_scene(1)).unwrap();

    assert_eq!(engine.scene_index(), Some(1));
    assert_eq!(engine.world().unwrap().len(), 1);
    assert_eq!(renderer.borrow().node_count(), 1);
    assert_eq!(renderer.borrow().primitive_count(), 1);
    assert_eq!(renderer.borrow().mesh_loads(), 1);
    assert_eq!(engine.mesh_cache().unwrap().loads(), 1);
}

#[test]
fn load_scene_out_of_range_keeps_current_world() {
    let (_renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    pollster::block_on(engine.load_archive_bytes(&two_crates().build())).unwrap();

    let err = pollster::block_on(engine.load_scene(9)).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::SceneNotFound { index: 9, .. })));
    assert_eq!(engine.world().unwrap().len(), 2);
    assert_eq!(engine.scene_index(), Some(0));
}

#[test]
fn dispose_releases_all_render_resources() {
    let (renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    pollster::block_on(engine.load_archive_bytes(&two_crates().build())).unwrap();

    engine.dispose();

    assert!(!engine.is_loaded());
    let renderer = renderer.borrow();
    assert_eq!(renderer.node_count(), 0);
    assert_eq!(renderer.primitive_count(), 0);
    assert_eq!(renderer.mesh_count(), 0);
}

#[test]
fn update_without_cartridge_only_advances_time() {
    let (_renderer, shared) = common::headless();
    let mut engine = Engine::new(shared, RuntimeSettings::default());
    engine.update(0.5, &pad(&[InputButton::Start]));
    assert_eq!(engine.frame_count(), 1);
    assert!(engine.input().is_pressed(InputButton::Start));
    assert!(engine.world().is_none());
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_parse_from_partial_json() {
    let settings =
        RuntimeSettings::from_json_str(r#"{ "initialScene": 2, "scripts": { "maxOperations": 500 } }"#)
            .unwrap();
    assert_eq!(settings.initial_scene, 2);
    assert_eq!(settings.scripts.max_operations, 500);
    assert_eq!(
        settings.scripts.max_call_levels,
        RuntimeSettings::default().scripts.max_call_levels
    );

    assert!(matches!(
        RuntimeSettings::from_json_str("[1, 2]"),
        Err(Error::Settings(_))
    ));
}
