//! Script Module Integration Tests
//!
//! Tests for:
//! - Declaration parsing: exactly one `define` call per script
//! - Dependency resolution: memoization, cycles, missing and reserved ids
//! - Built-in modules and the `exports` object
//! - Script components: default export contract and lifecycle hooks
//! - Scene access from scripts: component lookup and deferred destruction

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{CartridgeBuilder, object};
use glam::Vec3;
use pixelcart::assets::{Asset, AssetKind};
use pixelcart::cartridge::{Cartridge, TransformData};
use pixelcart::errors::{Error, Result, ScriptError};
use pixelcart::input::{InputButton, InputState};
use pixelcart::render::{HeadlessPrimitive, HeadlessRenderer};
use pixelcart::script::{ModuleLoader, ModuleState, ScriptHost, builtins};
use pixelcart::settings::ScriptLimits;
use pixelcart::world::{Component, MeshCache, SceneInstantiator, ScriptComponent, World};
use rhai::{INT, Map};
use rustc_hash::FxHashSet;
use serde_json::json;

/// A loader whose `print` output is captured instead of logged.
fn capturing_loader() -> (ModuleLoader, Rc<RefCell<Vec<String>>>) {
    let printed = Rc::new(RefCell::new(Vec::new()));
    let sink = printed.clone();
    let host = ScriptHost::with_engine(&ScriptLimits::default(), move |engine| {
        engine.on_print(move |text| sink.borrow_mut().push(text.to_string()));
    });
    (ModuleLoader::new(Rc::new(host)), printed)
}

fn loader() -> ModuleLoader {
    ModuleLoader::new(Rc::new(ScriptHost::new(&ScriptLimits::default())))
}

fn int_field(export: &rhai::Dynamic, field: &str) -> INT {
    export
        .clone()
        .try_cast::<Map>()
        .and_then(|map| map.get(field).cloned())
        .and_then(|value| value.as_int().ok())
        .unwrap_or_else(|| panic!("export has no integer field '{field}'"))
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn script_without_define_is_a_parse_error() {
    let mut loader = loader();
    let err = loader.register("./lonely", "let x = 1 + 1;").unwrap_err();
    assert!(matches!(
        err,
        Error::Script(ScriptError::ParseError { ref module, .. }) if module == "./lonely"
    ));
    assert_eq!(loader.state("./lonely"), ModuleState::Unregistered);
}

#[test]
fn script_with_two_defines_is_a_parse_error() {
    let mut loader = loader();
    let source = r#"
        define([], |exports| 1);
        define([], |exports| 2);
    "#;
    let err = loader.register("./twice", source).unwrap_err();
    assert!(matches!(err, Error::Script(ScriptError::ParseError { .. })));
}

#[test]
fn syntax_error_is_a_parse_error() {
    let mut loader = loader();
    let err = loader.register("./broken", "define([], |exports| {").unwrap_err();
    assert!(matches!(err, Error::Script(ScriptError::ParseError { .. })));
}

#[test]
fn malformed_define_call_is_a_parse_error() {
    let mut loader = loader();
    let err = loader.register("./odd", r#"define("only-a-name");"#).unwrap_err();
    assert!(matches!(err, Error::Script(ScriptError::ParseError { .. })));
}

#[test]
fn non_string_dependency_ids_fail_registration() {
    let mut loader = loader();
    let err = loader.register("./numbers", "define([1, 2], |a, b| a);").unwrap_err();
    assert!(matches!(err, Error::Script(ScriptError::Runtime { .. })));
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut loader = loader();
    loader.register("./a", "define([], || 1);").unwrap();
    let err = loader.register("./a", "define([], || 2);").unwrap_err();
    assert!(matches!(err, Error::Script(ScriptError::DuplicateModule(ref id)) if id == "./a"));
}

#[test]
fn named_define_form_is_accepted() {
    let mut loader = loader();
    loader
        .register("./named", r#"define("named", [], || #{ answer: 42 });"#)
        .unwrap();
    let export = loader.resolve("./named").unwrap();
    assert_eq!(int_field(&export, "answer"), 42);
}

#[test]
fn registration_does_not_run_factories() {
    let (mut loader, printed) = capturing_loader();
    loader
        .register("./lazy", r#"define([], || { print("ran"); 1 });"#)
        .unwrap();
    assert!(printed.borrow().is_empty());
    assert_eq!(loader.state("./lazy"), ModuleState::Registered);

    loader.resolve("./lazy").unwrap();
    assert_eq!(*printed.borrow(), ["ran"]);
    assert_eq!(loader.state("./lazy"), ModuleState::Resolved);
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn shared_dependency_factory_runs_once() {
    let (mut loader, printed) = capturing_loader();
    loader
        .register(
            "./b",
            r#"define(["exports", "./c"], |exports, c| {
                print("b");
                exports.value = c.value * 2;
            });"#,
        )
        .unwrap();
    loader
        .register("./c", r#"define([], || { print("c"); #{ value: 3 } });"#)
        .unwrap();
    loader
        .register("./a", r#"define(["./b"], |b| #{ total: b.value + 1 });"#)
        .unwrap();
    loader
        .register("./d", r#"define(["./b"], |b| #{ total: b.value + 100 });"#)
        .unwrap();

    let a = loader.resolve("./a").unwrap();
    let d = loader.resolve("./d").unwrap();

    assert_eq!(int_field(&a, "total"), 7);
    assert_eq!(int_field(&d, "total"), 106);
    assert_eq!(*printed.borrow(), ["c", "b"]);
}

#[test]
fn resolved_exports_are_cached() {
    let (mut loader, printed) = capturing_loader();
    loader
        .register("./once", r#"define([], || { print("factory"); #{ n: 1 } });"#)
        .unwrap();
    for _ in 0..3 {
        loader.resolve("./once").unwrap();
    }
    assert_eq!(printed.borrow().len(), 1);
}

#[test]
fn two_module_cycle_reports_path() {
    let mut loader = loader();
    loader.register("./a", r#"define(["./b"], |b| 1);"#).unwrap();
    loader.register("./b", r#"define(["./a"], |a| 2);"#).unwrap();

    let err = loader.resolve("./a").unwrap_err();
    match err {
        Error::Script(ScriptError::CyclicDependency { id, path }) => {
            assert_eq!(id, "./a");
            assert_eq!(path, ["./a", "./b", "./a"]);
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
    // Nothing in the cycle was cached, and the in-progress marks are cleared.
    assert_eq!(loader.state("./a"), ModuleState::Registered);
    assert_eq!(loader.state("./b"), ModuleState::Registered);
}

#[test]
fn self_dependency_is_a_cycle() {
    let mut loader = loader();
    loader.register("./me", r#"define(["./me"], |me| 1);"#).unwrap();
    let err = loader.resolve("./me").unwrap_err();
    assert!(matches!(
        err,
        Error::Script(ScriptError::CyclicDependency { ref path, .. }) if path.len() == 2
    ));
}

#[test]
fn missing_dependency_names_requiring_module() {
    let mut loader = loader();
    loader
        .register("./needy", r#"define(["./ghost"], |ghost| 1);"#)
        .unwrap();
    let err = loader.resolve("./needy").unwrap_err();
    match err {
        Error::Script(ScriptError::UnresolvedDependency { id, required_by }) => {
            assert_eq!(id, "./ghost");
            assert_eq!(required_by, "./needy");
        }
        other => panic!("expected UnresolvedDependency, got {other:?}"),
    }
}

#[test]
fn require_is_not_a_dependency() {
    let mut loader = loader();
    loader
        .register("./dyn", r#"define(["require"], |require| 1);"#)
        .unwrap();
    let err = loader.resolve("./dyn").unwrap_err();
    assert!(matches!(
        err,
        Error::Script(ScriptError::UnsupportedDependency { ref id, .. }) if id == "require"
    ));
}

#[test]
fn factory_runtime_error_is_reported_per_module() {
    let mut loader = loader();
    loader
        .register("./boom", r#"define([], || { throw "kaboom"; });"#)
        .unwrap();
    let err = loader.resolve("./boom").unwrap_err();
    match err {
        Error::Script(ScriptError::Runtime { module, message }) => {
            assert_eq!(module, "./boom");
            assert!(message.contains("kaboom"));
        }
        other => panic!("expected Runtime, got {other:?}"),
    }
}

#[test]
fn runaway_factory_hits_operation_limit() {
    let limits = ScriptLimits {
        max_operations: 10_000,
        ..ScriptLimits::default()
    };
    let mut loader = ModuleLoader::new(Rc::new(ScriptHost::new(&limits)));
    loader
        .register("./spin", "define([], || { loop { } });")
        .unwrap();
    let err = loader.resolve("./spin").unwrap_err();
    assert!(matches!(err, Error::Script(ScriptError::Runtime { .. })));
}

// ============================================================================
// Built-ins
// ============================================================================

#[test]
fn builtins_are_injected_by_id() {
    let input = Rc::new(RefCell::new(InputState::new()));
    let mut loader = loader();
    for (id, value) in builtins::standard(&input) {
        loader.inject_builtin(id, value);
    }
    loader
        .register(
            "./reader",
            r#"define(["input", "log"], |input, log| {
                log.info("checking input");
                #{ held: input.is_pressed("a") }
            });"#,
        )
        .unwrap();

    let pad: FxHashSet<InputButton> = [InputButton::A].into_iter().collect();
    input.borrow_mut().poll(&pad);

    let export = loader.resolve("./reader").unwrap();
    let held = export
        .try_cast::<Map>()
        .and_then(|map| map.get("held").cloned())
        .and_then(|value| value.as_bool().ok());
    assert_eq!(held, Some(true));
    assert_eq!(loader.state("input"), ModuleState::Resolved);
}

#[test]
fn unknown_button_name_fails_the_script() {
    let input = Rc::new(RefCell::new(InputState::new()));
    let mut loader = loader();
    for (id, value) in builtins::standard(&input) {
        loader.inject_builtin(id, value);
    }
    loader
        .register("./typo", r#"define(["input"], |input| input.is_pressed("Turbo"));"#)
        .unwrap();
    assert!(loader.resolve("./typo").is_err());
}

#[test]
fn exports_object_is_the_default_output() {
    let mut loader = loader();
    loader
        .register(
            "./config",
            r#"define(["exports"], |exports| {
                exports.speed = 4;
                exports["default"] = 9;
            });"#,
        )
        .unwrap();
    let export = loader.resolve("./config").unwrap();
    assert_eq!(int_field(&export, "speed"), 4);
    assert_eq!(int_field(&export, "default"), 9);
}

// ============================================================================
// Script Components
// ============================================================================

fn script_asset(name: &str) -> Asset {
    Asset::new(name, format!("scripts/{name}.rhai"), "")
}

#[test]
fn missing_default_export_is_reported() {
    let mut loader = loader();
    let asset = script_asset("plain");
    loader
        .register_script(&asset, br#"define([], || #{ speed: 1 });"#)
        .unwrap();
    let err = loader.default_export(&asset).unwrap_err();
    assert!(matches!(
        err,
        Error::Script(ScriptError::MissingDefaultExport(ref id)) if id == "./plain"
    ));
}

#[test]
fn register_script_rejects_non_scripts_and_bad_paths() {
    let mut loader = loader();
    let mesh = Asset::new("m", "models/m.obj", "");
    assert!(loader.register_script(&mesh, b"").is_err());

    let stray = Asset::new("s", "logic/s.rhai", "");
    let err = loader.register_script(&stray, b"define([], || 1);").unwrap_err();
    assert!(matches!(err, Error::Script(ScriptError::InvalidModulePath(_))));
}

#[test]
fn script_component_runs_hooks_in_order() {
    let (_renderer, shared) = common::headless();
    let mut world = World::new(shared);
    let key = world
        .create_object("mover", "Mover", &TransformData::default(), None)
        .unwrap();

    let (mut loader, printed) = capturing_loader();
    let asset = script_asset("mover");
    let module = loader
        .register_script(
            &asset,
            br#"define(["exports"], |exports| {
                exports["default"] = |object| #{
                    init: || {
                        print("init " + object.name);
                        object.position = vec3(1, 2, 3);
                    },
                    update: |dt| {
                        print("update " + dt);
                        object.translate(vec3(dt, 0.0, 0.0));
                    },
                    on_destroy: || print("destroy"),
                };
            });"#,
        )
        .unwrap();
    assert_eq!(module, "./mover");

    let constructor = loader.default_export(&asset).unwrap();
    let handle = world.script_handle(key).unwrap();
    let component = ScriptComponent::instantiate(
        "behaviour",
        key,
        &module,
        constructor,
        handle,
        loader.host().clone(),
    )
    .unwrap();
    world.add_component(key, Component::Script(component)).unwrap();

    world.init().unwrap();
    world.update(0.5);
    let position = world.get(key).unwrap().transform().position();
    assert_eq!(position, Vec3::new(1.5, 2.0, 3.0));

    assert!(world.destroy_object(key));
    assert_eq!(*printed.borrow(), ["init Mover", "update 0.5", "destroy"]);
}

#[test]
fn constructor_must_return_a_hook_map() {
    let (_renderer, shared) = common::headless();
    let mut world = World::new(shared);
    let key = world
        .create_object("o", "O", &TransformData::default(), None)
        .unwrap();

    let mut loader = loader();
    let asset = script_asset("bad");
    let module = loader
        .register_script(
            &asset,
            br#"define(["exports"], |exports| { exports["default"] = |object| 42; });"#,
        )
        .unwrap();
    let constructor = loader.default_export(&asset).unwrap();
    let handle = world.script_handle(key).unwrap();
    let err = ScriptComponent::instantiate("c", key, &module, constructor, handle, loader.host().clone())
        .err()
        .unwrap();
    assert!(matches!(err, Error::Script(ScriptError::InvalidScriptComponent { .. })));
}

#[test]
fn default_export_must_be_callable() {
    let (_renderer, shared) = common::headless();
    let mut world = World::new(shared);
    let key = world
        .create_object("o", "O", &TransformData::default(), None)
        .unwrap();

    let mut loader = loader();
    let asset = script_asset("data");
    let module = loader
        .register_script(
            &asset,
            br#"define(["exports"], |exports| { exports["default"] = "not a function"; });"#,
        )
        .unwrap();
    let constructor = loader.default_export(&asset).unwrap();
    let handle = world.script_handle(key).unwrap();
    let result =
        ScriptComponent::instantiate("c", key, &module, constructor, handle, loader.host().clone());
    assert!(matches!(
        result,
        Err(Error::Script(ScriptError::InvalidScriptComponent { .. }))
    ));
}

// ============================================================================
// Scene Access
// ============================================================================

/// Registers the cartridge's scripts with `loader` and builds its first scene.
fn build_scene(
    loader: &mut ModuleLoader,
    bytes: &[u8],
) -> (Rc<RefCell<HeadlessRenderer>>, Result<World>) {
    let cartridge = Cartridge::from_bytes(bytes).unwrap();
    for asset in cartridge.assets().assets_of_kind(AssetKind::Script) {
        let source = pollster::block_on(cartridge.assets().load(asset)).unwrap();
        loader.register_script(asset, &source).unwrap();
    }
    let (renderer, shared) = common::headless();
    let mut meshes = MeshCache::new();
    let world = pollster::block_on(
        SceneInstantiator::new(cartridge.assets(), loader, &mut meshes, shared)
            .instantiate(cartridge.scene(0).unwrap()),
    );
    (renderer, world)
}

fn lamp_scene(script: &str) -> Vec<u8> {
    CartridgeBuilder::new()
        .script("dimmer", "dimmer", script)
        .scene(
            "main",
            json!([object("lamp", "Lamp", json!([
                { "id": "bulb", "type": "light_point", "intensity": 2.0 },
                { "id": "dimmer", "type": "script", "scriptFileId": "dimmer" },
            ]), json!([]))]),
        )
        .build()
}

#[test]
fn scripts_look_up_components_by_id() {
    let (mut loader, printed) = capturing_loader();
    let bytes = lamp_scene(
        r#"define(["exports"], |exports| {
            exports["default"] = |object| #{
                init: || {
                    let bulb = object.get_component("bulb");
                    print(bulb.kind);
                    print("intensity " + bulb.intensity);
                    bulb.intensity = 0.25;
                    print("has nothing " + object.has_component("nothing"));
                    print("missing is " + type_of(object.get_component("nothing")));
                    print("count " + object.components.len());
                    print("module " + object.get_component("dimmer").module);
                },
            };
        });"#,
    );
    let (renderer, world) = build_scene(&mut loader, &bytes);
    let mut world = world.unwrap();

    assert_eq!(
        *printed.borrow(),
        [
            "light_point",
            "intensity 2.0",
            "has nothing false",
            "missing is ()",
            "count 2",
            "module ./dimmer",
        ]
    );

    // The script and the live component share one set of light parameters.
    let key = world.find_by_id("lamp").unwrap();
    let node = world.get(key).unwrap().transform().node();
    let bulb = world
        .get_mut(key)
        .unwrap()
        .component_mut("bulb")
        .and_then(Component::as_light_mut)
        .unwrap();
    assert_eq!(bulb.intensity(), 0.25);
    assert!(renderer.borrow().primitives_of(node).any(|p| matches!(
        p,
        HeadlessPrimitive::Light(desc) if desc.intensity == 0.25
    )));
}

#[test]
fn component_calls_of_the_wrong_kind_fail() {
    let mut loader = loader();
    let bytes = lamp_scene(
        r#"define(["exports"], |exports| {
            exports["default"] = |object| #{
                init: || object.get_component("bulb").point_at(vec3(0, 0, 0)),
            };
        });"#,
    );
    let (renderer, world) = build_scene(&mut loader, &bytes);

    assert!(matches!(
        world.err().unwrap(),
        Error::Script(ScriptError::Runtime { .. })
    ));
    assert_eq!(renderer.borrow().node_count(), 0);
}

#[test]
fn destroy_requests_run_after_the_update_pass() {
    let (mut loader, printed) = capturing_loader();
    let bytes = CartridgeBuilder::new()
        .script(
            "self_destruct",
            "self_destruct",
            r#"define(["exports"], |exports| {
                exports["default"] = |object| #{
                    update: |dt| {
                        print("bye " + object.name);
                        object.destroy();
                        object.destroy();
                    },
                    on_destroy: || print("destroyed " + object.name),
                };
            });"#,
        )
        .script(
            "ticker",
            "ticker",
            r#"define(["exports"], |exports| {
                exports["default"] = |object| #{ update: |dt| print("tick " + object.name) };
            });"#,
        )
        .scene(
            "main",
            json!([
                object("doomed", "Doomed", json!([
                    { "id": "s", "type": "script", "scriptFileId": "self_destruct" },
                ]), json!([
                    object("kid", "Kid", json!([
                        { "id": "s", "type": "script", "scriptFileId": "ticker" },
                    ]), json!([])),
                ])),
                object("watcher", "Watcher", json!([
                    { "id": "s", "type": "script", "scriptFileId": "ticker" },
                ]), json!([])),
            ]),
        )
        .build();
    let (renderer, world) = build_scene(&mut loader, &bytes);
    let mut world = world.unwrap();

    world.update(0.1);
    // Kid still updates in the pass that requested its parent's destruction.
    assert_eq!(
        *printed.borrow(),
        ["bye Doomed", "tick Kid", "tick Watcher", "destroyed Doomed"]
    );
    assert_eq!(world.len(), 1);
    assert!(world.find_by_id("kid").is_none());
    assert!(world.pending_destroys().is_empty());
    assert_eq!(renderer.borrow().node_count(), 1);

    printed.borrow_mut().clear();
    world.update(0.1);
    assert_eq!(*printed.borrow(), ["tick Watcher"]);
}
