//! Build script: validates config/defaults.json at compile time.

use std::path::PathBuf;

fn main() {
    let manifest_dir =
        std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR set by Cargo");
    let config_path: PathBuf = [&manifest_dir, "config", "defaults.json"].iter().collect();
    println!("cargo:rerun-if-changed={}", config_path.display());
    let json = std::fs::read_to_string(&config_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read {}: {}. defaults.json must exist and be valid.",
            config_path.display(),
            e
        )
    });
    #[derive(serde::Deserialize)]
    #[serde(deny_unknown_fields)]
    #[allow(dead_code)]
    struct Defaults {
        container_id: Option<String>,
        message_selector: Option<String>,
        skip_tags: Option<Vec<String>>,
    }
    let _: Defaults = serde_json::from_str(&json).unwrap_or_else(|e| {
        panic!(
            "defaults.json is invalid: {}. Fix the file and rebuild.",
            e
        )
    });
}
