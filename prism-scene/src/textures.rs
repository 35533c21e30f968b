use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{ Path, PathBuf };
use std::sync::Arc;

use log::{ info, warn };
use prism_impl::image::Image;
use prism_impl::scene::Scene;

use crate::ppm;
use crate::SceneError;

/// Resolves each object's texture stem against the Textures directory and
/// attaches the decoded images. Unresolvable textures degrade to the
/// primitive's flat albedo with a warning.
pub(crate) fn attach_textures(scene_path: &Path, scene: &mut Scene, stems: &[Option<String>]) {
    if stems.iter().all(Option::is_none) {
        return;
    }

    let dir = texture_directory(scene_path);
    let mut cache: HashMap<PathBuf, Arc<Image>> = HashMap::new();
    let mut loaded = 0;

    for (obj, stem) in scene.objects.iter_mut().zip(stems) {
        let Some(stem) = stem else { continue };
        let path = dir.join(format!("{stem}.ppm"));
        let texture = match cache.get(&path) {
            Some(texture) => texture.clone(),
            None => match load_texture(&path) {
                Ok(texture) => {
                    let texture = Arc::new(texture);
                    cache.insert(path.clone(), texture.clone());
                    loaded += 1;
                    texture
                }
                Err(err) => {
                    warn!("texture {} unavailable, {} keeps its flat color: {err}", path.display(), obj.name);
                    continue;
                }
            },
        };
        obj.texture = Some(texture);
    }

    info!("loaded {loaded} textures");
}

/// Textures live in `<scene-parent>/Textures`; when that directory is
/// missing, fall back to the scene file's own directory.
fn texture_directory(scene_path: &Path) -> PathBuf {
    let scene_dir = scene_path.parent().unwrap_or_else(|| Path::new("."));
    if let Some(candidate) = scene_dir.parent().map(|parent| parent.join("Textures")) {
        if candidate.is_dir() {
            return candidate;
        }
    }
    warn!("no Textures directory beside {}, searching the scene directory", scene_dir.display());
    scene_dir.to_path_buf()
}

fn load_texture(path: &Path) -> Result<Image, SceneError> {
    let file = File::open(path)?;
    ppm::load_ppm(BufReader::new(file))
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::attach_textures;
    use prism_impl::camera::Camera;
    use prism_impl::scene::Scene;
    use prism_impl::shapes::{ Primitive, Shape, Sphere };
    use prism_impl::types::V3;

    fn sphere(name: &str) -> Primitive {
        Primitive::new(name, Shape::Sphere(Sphere::new(V3::ZERO, 1.0)))
    }

    #[test]
    fn textures_resolve_and_missing_ones_degrade() {
        let root = std::env::temp_dir().join(format!("prism-textures-{}", std::process::id()));
        let ascii_dir = root.join("ASCII");
        let texture_dir = root.join("Textures");
        fs::create_dir_all(&ascii_dir).unwrap();
        fs::create_dir_all(&texture_dir).unwrap();
        fs::write(texture_dir.join("checker.ppm"), "P3\n1 1\n255\n255 0 0\n").unwrap();

        let mut scene = Scene::new(Camera::default());
        scene.objects.push(sphere("textured"));
        scene.objects.push(sphere("missing"));
        scene.objects.push(sphere("plain"));
        let stems = vec![Some("checker".to_string()), Some("absent".to_string()), None];

        attach_textures(&ascii_dir.join("scene.txt"), &mut scene, &stems);

        assert!(scene.objects[0].texture.is_some());
        assert!(scene.objects[1].texture.is_none());
        assert!(scene.objects[2].texture.is_none());
        let texel = scene.objects[0].texture.as_ref().unwrap().sample_uv(0.5, 0.5);
        assert_eq!(texel, V3(1.0, 0.0, 0.0));

        fs::remove_dir_all(&root).ok();
    }
}
