//! Scene loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files.

use std::fs;
use std::path::Path;

use super::Scene;
use crate::error::Result;

/// Load a scene from a RON file.
///
/// A relative texture path is resolved against the scene file's directory.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let mut scene = load_scene_from_str(&contents)?;

    if !scene.texture.is_empty() && Path::new(&scene.texture).is_relative() {
        if let Some(dir) = path.parent() {
            scene.texture = dir.join(&scene.texture).to_string_lossy().into_owned();
        }
    }

    log::info!(
        "Loaded scene {}: {}x{}, {} meshes, {} lights",
        path.display(),
        scene.width,
        scene.height,
        scene.meshes.len(),
        scene.lights.len()
    );
    Ok(scene)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<()> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a scene from a RON string (for embedded scenes or testing)
pub fn load_scene_from_str(s: &str) -> Result<Scene> {
    Ok(ron::from_str(s)?)
}
