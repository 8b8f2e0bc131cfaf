//! Headless Player
//!
//! Loads a cartridge (a `.zip` archive or an unpacked directory) into the
//! in-memory renderer, runs a number of frames with no input and prints the
//! resulting node hierarchy.
//!
//! ```text
//! headless_player <cartridge> [frames] [settings.json]
//! ```
//!
//! Set `RUST_LOG=debug` to trace module resolution and object lifecycles, or
//! `RUST_LOG=script=info` to see only script output.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use pixelcart::input::NoInput;
use pixelcart::{Engine, HeadlessRenderer, RuntimeSettings};

const FRAME_TIME: f32 = 1.0 / 60.0;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let cartridge = PathBuf::from(
        args.next()
            .context("usage: headless_player <cartridge> [frames] [settings.json]")?,
    );
    let frames: u32 = match args.next() {
        Some(frames) => frames.parse().context("frame count must be a number")?,
        None => 60,
    };
    let settings = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings file {path}"))?;
            RuntimeSettings::from_json_str(&json)?
        }
        None => RuntimeSettings::default(),
    };

    let renderer = Rc::new(RefCell::new(HeadlessRenderer::new()));
    let mut engine = Engine::new(renderer.clone(), settings);

    // File-backed loads go through tokio::fs, which needs a runtime.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime
        .block_on(async {
            if cartridge.is_dir() {
                engine.load_directory(&cartridge).await
            } else {
                engine.load_archive_file(&cartridge).await
            }
        })
        .with_context(|| format!("loading {}", cartridge.display()))?;

    for _ in 0..frames {
        engine.update(FRAME_TIME, &NoInput);
    }

    let objects = engine.world().map_or(0, pixelcart::World::len);
    log::info!(
        "Ran {} frames ({:.2}s simulated), {objects} live objects",
        engine.frame_count(),
        engine.time()
    );
    println!("{}", renderer.borrow().describe_hierarchy());

    engine.dispose();
    Ok(())
}
