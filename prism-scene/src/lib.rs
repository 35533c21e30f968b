pub mod format;
pub mod ppm;
mod textures;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use prism_impl::scene::Scene;

#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("scene file does not define a camera")]
    MissingCamera,
    #[error("malformed PPM image: {0}")]
    PpmFormat(String),
}

/// Loads a scene description file and resolves its texture references
/// from the sibling `Textures` directory.
pub fn load_scene(path: &Path) -> Result<Scene, SceneError> {
    info!("loading scene from {}", path.display());
    let file = File::open(path)?;
    let mut parsed = format::parse_scene(BufReader::new(file))?;
    textures::attach_textures(path, &mut parsed.scene, &parsed.texture_stems);
    info!(
        "scene loaded: {} objects, {} lights",
        parsed.scene.objects.len(),
        parsed.scene.lights.len()
    );
    Ok(parsed.scene)
}
