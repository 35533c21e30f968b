//! Line-oriented scene description parser.
//!
//! `Background` and `AmbientLight` are single-line directives; every other
//! keyword opens a named block terminated by a line reading `end`. Lengths
//! in camera blocks are millimeters and are converted to meters here; light
//! intensities are scaled down by 1000 on load.

use std::io;
use std::io::BufRead;

use log::warn;
use prism_impl::camera::Camera;
use prism_impl::lights::PointLight;
use prism_impl::materials::Material;
use prism_impl::scene::Scene;
use prism_impl::shapes::{ Cuboid, Primitive, Quad, Shape, Sphere };
use prism_impl::types::V3;

use crate::SceneError;

pub struct ParsedScene {
    pub scene: Scene,
    /// Texture stem per object, to be resolved against the Textures directory.
    pub texture_stems: Vec<Option<String>>,
}

pub fn parse_scene(reader: impl io::BufRead) -> Result<ParsedScene, SceneError> {
    let mut lines = reader.lines();

    let mut camera: Option<Camera> = None;
    let mut objects: Vec<Primitive> = vec![];
    let mut texture_stems: Vec<Option<String>> = vec![];
    let mut lights: Vec<PointLight> = vec![];
    let mut background = V3(0.8, 0.9, 1.0);
    let mut ambient = V3(0.2, 0.2, 0.2);

    while let Some(line) = lines.next() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (token, rest) = split_key(line);

        match token {
            "Background" => {
                if let Some(color) = v3_value(token, rest) {
                    background = color;
                }
                continue;
            }
            "AmbientLight" => {
                if let Some(color) = v3_value(token, rest) {
                    ambient = color;
                }
                continue;
            }
            _ => {}
        }

        let Some(name) = rest.split_whitespace().next() else {
            warn!("missing name for {token} block, skipping");
            let _ = block_entries(&mut lines)?;
            continue;
        };

        match token {
            "Camera" => {
                camera = Some(parse_camera(block_entries(&mut lines)?));
            }
            "PointLight" => {
                lights.push(parse_light(block_entries(&mut lines)?));
            }
            "Sphere" => {
                let (primitive, stem) = parse_sphere(name, block_entries(&mut lines)?);
                objects.push(primitive);
                texture_stems.push(stem);
            }
            "Plane" => {
                let (primitive, stem) = parse_quad(name, block_entries(&mut lines)?);
                objects.push(primitive);
                texture_stems.push(stem);
            }
            "Cube" => {
                let (primitive, stem) = parse_cuboid(name, block_entries(&mut lines)?);
                objects.push(primitive);
                texture_stems.push(stem);
            }
            "Scene" => {
                for (key, rest) in block_entries(&mut lines)? {
                    match key.as_str() {
                        "ambient" => {
                            if let Some(color) = v3_value(&key, &rest) {
                                ambient = color;
                            }
                        }
                        "background" => {
                            if let Some(color) = v3_value(&key, &rest) {
                                background = color;
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {
                warn!("unknown scene token {token:?}, skipping block");
                let _ = block_entries(&mut lines)?;
            }
        }
    }

    let camera = camera.ok_or(SceneError::MissingCamera)?;
    let mut scene = Scene::new(camera);
    scene.objects = objects;
    scene.lights = lights;
    scene.background = background;
    scene.ambient = ambient;
    Ok(ParsedScene { scene, texture_stems })
}

/// Splits a line into its leading key and the remainder.
fn split_key(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((key, rest)) => (key, rest.trim()),
        None => (line, ""),
    }
}

/// Collects a block's key/value lines up to the terminating `end`.
/// EOF before `end` closes the block, matching the original loader.
fn block_entries(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Vec<(String, String)>, SceneError> {
    let mut entries = vec![];
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line == "end" {
            break;
        }
        if line.is_empty() {
            continue;
        }
        let (key, rest) = split_key(line);
        entries.push((key.to_string(), rest.to_string()));
    }
    Ok(entries)
}

fn values<const N: usize>(text: &str) -> Option<[f64; N]> {
    let mut parsed = [0.0; N];
    let mut parts = text.split_whitespace();
    for value in parsed.iter_mut() {
        *value = parts.next()?.parse().ok()?;
    }
    Some(parsed)
}

fn v3_value(key: &str, text: &str) -> Option<V3> {
    match values::<3>(text) {
        Some([x, y, z]) => Some(V3(x, y, z)),
        None => {
            warn!("ignoring malformed {key} value {text:?}");
            None
        }
    }
}

fn f64_value(key: &str, text: &str) -> Option<f64> {
    match values::<1>(text) {
        Some([v]) => Some(v),
        None => {
            warn!("ignoring malformed {key} value {text:?}");
            None
        }
    }
}

/// Applies one of the material keys shared by all primitives.
/// Returns false when the key is not a material key.
fn apply_material_key(material: &mut Material, key: &str, text: &str) -> bool {
    let slot = match key {
        "reflectivity" => &mut material.reflectivity,
        "refractivity" => &mut material.refractivity,
        "ior" => &mut material.ior,
        "shininess" => &mut material.shininess,
        "roughness" => &mut material.roughness,
        _ => return false,
    };
    if let Some(value) = f64_value(key, text) {
        *slot = value;
    }
    true
}

const MM_PER_M: f64 = 1000.0;

fn parse_camera(entries: Vec<(String, String)>) -> Camera {
    let mut camera = Camera::default();
    for (key, text) in entries {
        match key.as_str() {
            "location" => {
                if let Some(v) = v3_value(&key, &text) {
                    camera.position = v;
                }
            }
            "gaze" => {
                if let Some(v) = v3_value(&key, &text) {
                    camera.gaze = v;
                }
            }
            "focal_length" => {
                if let Some(v) = f64_value(&key, &text) {
                    camera.focal_length = v / MM_PER_M;
                }
            }
            "sensor_width" => {
                if let Some(v) = f64_value(&key, &text) {
                    camera.sensor_width = v / MM_PER_M;
                }
            }
            "sensor_height" => {
                if let Some(v) = f64_value(&key, &text) {
                    camera.sensor_height = v / MM_PER_M;
                }
            }
            "resolution" => {
                if let Some([x, y]) = values::<2>(&text) {
                    camera.res_x = x as usize;
                    camera.res_y = y as usize;
                } else {
                    warn!("ignoring malformed resolution value {text:?}");
                }
            }
            "shutter_speed" => {
                if let Some(v) = f64_value(&key, &text) {
                    camera.shutter_speed = v;
                }
            }
            "camera_velocity" => {
                if let Some(v) = v3_value(&key, &text) {
                    camera.velocity = v;
                }
            }
            "aperture" => {
                if let Some(v) = f64_value(&key, &text) {
                    camera.aperture_fstop = v;
                }
            }
            "focus_distance" => {
                if let Some(v) = f64_value(&key, &text) {
                    camera.focus_distance = v / MM_PER_M;
                }
            }
            _ => {}
        }
    }
    camera.compute_basis();
    camera.compute_lens_radius();
    camera
}

fn parse_light(entries: Vec<(String, String)>) -> PointLight {
    let mut position = V3::ZERO;
    let mut intensity = 1.0;
    let mut radius = 0.0;
    for (key, text) in entries {
        match key.as_str() {
            "location" => {
                if let Some(v) = v3_value(&key, &text) {
                    position = v;
                }
            }
            "intensity" => {
                if let Some(v) = f64_value(&key, &text) {
                    intensity = v;
                }
            }
            "radius" => {
                if let Some(v) = f64_value(&key, &text) {
                    radius = v;
                }
            }
            _ => {}
        }
    }
    PointLight::new(position, intensity / 1000.0, radius)
}

struct SurfaceKeys {
    albedo: V3,
    material: Material,
    texture_stem: Option<String>,
}

impl SurfaceKeys {
    fn new() -> SurfaceKeys {
        SurfaceKeys {
            albedo: V3(0.8, 0.8, 0.8),
            material: Material::default(),
            texture_stem: None,
        }
    }

    /// Returns false when the key is not a shared surface key.
    fn apply(&mut self, key: &str, text: &str) -> bool {
        match key {
            "color" => {
                if let Some(v) = v3_value(key, text) {
                    self.albedo = v;
                }
                true
            }
            "texture" => {
                self.texture_stem = text.split_whitespace().next().map(str::to_string);
                true
            }
            _ => apply_material_key(&mut self.material, key, text),
        }
    }

    fn finish(self, name: &str, shape: Shape) -> (Primitive, Option<String>) {
        let primitive = Primitive::new(name, shape)
            .with_albedo(self.albedo)
            .with_material(self.material);
        (primitive, self.texture_stem)
    }
}

fn parse_sphere(name: &str, entries: Vec<(String, String)>) -> (Primitive, Option<String>) {
    let mut surface = SurfaceKeys::new();
    let mut center = V3::ZERO;
    let mut radius = 1.0;
    for (key, text) in entries {
        match key.as_str() {
            "location" => {
                if let Some(v) = v3_value(&key, &text) {
                    center = v;
                }
            }
            "radius" => {
                if let Some(v) = f64_value(&key, &text) {
                    radius = v;
                }
            }
            _ => {
                surface.apply(&key, &text);
            }
        }
    }
    surface.finish(name, Shape::Sphere(Sphere::new(center, radius)))
}

fn parse_quad(name: &str, entries: Vec<(String, String)>) -> (Primitive, Option<String>) {
    let mut surface = SurfaceKeys::new();
    let mut corners = [V3::ZERO; 4];
    for (key, text) in entries {
        if let Some(index) = key.strip_prefix("corner").and_then(|n| n.parse::<usize>().ok()) {
            if (1..=4).contains(&index) {
                if let Some(v) = v3_value(&key, &text) {
                    corners[index - 1] = v;
                }
            } else {
                warn!("ignoring out-of-range corner key {key:?}");
            }
            continue;
        }
        surface.apply(&key, &text);
    }
    surface.finish(name, Shape::Quad(Quad::new(corners)))
}

fn parse_cuboid(name: &str, entries: Vec<(String, String)>) -> (Primitive, Option<String>) {
    let mut surface = SurfaceKeys::new();
    let mut center = V3::ZERO;
    let mut size = V3::ONE;
    let mut rotation = V3::ZERO;
    for (key, text) in entries {
        match key.as_str() {
            "translation" => {
                if let Some(v) = v3_value(&key, &text) {
                    center = v;
                }
            }
            "rotation" => {
                if let Some(v) = v3_value(&key, &text) {
                    rotation = v;
                }
            }
            // Uniform back-compat spelling of size
            "scale" => {
                if let Some(v) = f64_value(&key, &text) {
                    size = V3(v, v, v);
                }
            }
            "size" => {
                if let Some(v) = v3_value(&key, &text) {
                    size = v;
                }
            }
            _ => {
                surface.apply(&key, &text);
            }
        }
    }
    let cuboid = Cuboid::new(center, size).with_rotation_deg(rotation.x(), rotation.y(), rotation.z());
    surface.finish(name, Shape::Cuboid(cuboid))
}
