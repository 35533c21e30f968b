use rand::RngCore;

use crate::shapes::Hit;
use crate::tracer::Tracer;
use crate::types::{ Ray, V3 };

// Offset applied along the surface normal to keep shadow rays from
// re-intersecting the surface they leave.
const SHADOW_BIAS: f64 = 1.0e-4;

/// Ambient plus per-light Blinn-Phong with stochastic shadow rays.
///
/// Each light is sampled `shadow_samples` times; occluded samples contribute
/// nothing and the remainder are averaged, so penumbras emerge from the
/// integrator's per-pixel averaging.
pub fn direct_lighting(tracer: &Tracer, hit: &Hit, rng: &mut dyn RngCore) -> V3 {
    let scene = tracer.scene;

    let base_color = match hit.texture {
        Some(ref texture) => texture.sample_uv(hit.u, hit.v),
        None => hit.albedo,
    };

    let mut result = scene.ambient * base_color;

    for light in scene.lights.iter() {
        let mut accumulated = V3::ZERO;
        let mut valid = 0u32;

        for _ in 0..tracer.shadow_samples {
            let light_pos = light.sample_position(rng);
            let to_light = light_pos - hit.pos;
            let distance = to_light.length();
            let light_dir = to_light.unit();

            let shadow_ray = Ray::new(hit.pos + hit.normal * SHADOW_BIAS, light_dir);
            if tracer.occluded(&shadow_ray, distance) {
                continue;
            }

            let view = (scene.camera.position - hit.pos).unit();
            let half = (light_dir + view).unit();
            let diffuse = f64::max(0.0, V3::dot(hit.normal, light_dir));
            let specular = f64::max(0.0, V3::dot(hit.normal, half)).powf(hit.material.shininess);
            let attenuation = 1.0 / (1.0 + 0.1 * distance);

            let energy = light.intensity * attenuation;
            accumulated = accumulated
                + base_color * (diffuse * energy)
                + V3::ONE * (specular * energy);
            valid += 1;
        }

        if valid > 0 {
            result = result + accumulated / valid as f64;
        }
    }

    result
}
