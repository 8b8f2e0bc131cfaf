//! Shared helpers for integration tests: in-memory cartridges and a
//! headless renderer handle.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{Cursor, Write};
use std::rc::Rc;

use pixelcart::render::{HeadlessRenderer, SharedRenderer};
use serde_json::{Value, json};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Routes library logs to the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A headless renderer plus the same renderer as the runtime sees it.
pub fn headless() -> (Rc<RefCell<HeadlessRenderer>>, SharedRenderer) {
    init_logging();
    let renderer = Rc::new(RefCell::new(HeadlessRenderer::new()));
    let shared: SharedRenderer = renderer.clone();
    (renderer, shared)
}

/// Builds cartridge zips in memory.
#[derive(Default)]
pub struct CartridgeBuilder {
    scenes: Vec<Value>,
    assets: Vec<Value>,
    files: Vec<(String, Vec<u8>)>,
    manifest_override: Option<String>,
}

impl CartridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scene with the given top-level objects.
    pub fn scene(mut self, id: &str, objects: Value) -> Self {
        self.scenes.push(json!({ "id": id, "objects": objects }));
        self
    }

    /// Adds a raw scene definition.
    pub fn scene_json(mut self, scene: Value) -> Self {
        self.scenes.push(scene);
        self
    }

    /// Adds an asset entry and its file.
    pub fn asset(mut self, id: &str, path: &str, bytes: &[u8]) -> Self {
        self.assets.push(json!({ "id": id, "path": path, "hash": "test" }));
        self.files.push((path.to_string(), bytes.to_vec()));
        self
    }

    /// Adds a script asset at `scripts/<name>.rhai`.
    pub fn script(self, id: &str, name: &str, source: &str) -> Self {
        let path = format!("scripts/{name}.rhai");
        self.asset(id, &path, source.as_bytes())
    }

    /// Adds a file that no manifest entry refers to.
    pub fn file(mut self, path: &str, bytes: &[u8]) -> Self {
        self.files.push((path.to_string(), bytes.to_vec()));
        self
    }

    /// Replaces the generated manifest text.
    pub fn raw_manifest(mut self, text: &str) -> Self {
        self.manifest_override = Some(text.to_string());
        self
    }

    pub fn manifest(&self) -> Value {
        json!({ "scenes": self.scenes, "assets": self.assets })
    }

    pub fn build(&self) -> Vec<u8> {
        let manifest = self
            .manifest_override
            .clone()
            .unwrap_or_else(|| self.manifest().to_string());
        let mut entries = vec![("manifest.json".to_string(), manifest.into_bytes())];
        entries.extend(self.files.iter().cloned());
        zip_entries(&entries)
    }

    /// Writes the cartridge unpacked into `root`.
    pub fn write_to_dir(&self, root: &std::path::Path) -> std::io::Result<()> {
        std::fs::write(root.join("manifest.json"), self.manifest().to_string())?;
        for (path, bytes) in &self.files {
            let target = root.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(target, bytes)?;
        }
        Ok(())
    }
}

/// Zips arbitrary entries with deflate compression.
pub fn zip_entries(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (path, bytes) in entries {
        writer.start_file(path.as_str(), options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A game object definition.
pub fn object(id: &str, name: &str, components: Value, children: Value) -> Value {
    json!({
        "id": id,
        "name": name,
        "components": components,
        "children": children,
    })
}

/// A fresh scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pixelcart-{tag}-{}-{}",
        std::process::id(),
        uuid::Uuid::new_v4().simple()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
