use std::f64::consts::PI;

use rand::{ Rng, RngCore };

use crate::types::V3;

/// Point light, optionally widened to a disk for soft shadows.
///
/// `intensity` is per-channel energy (the scene loader scales raw file
/// intensities down by 1000). `radius` = 0 is a delta light; > 0 samples a
/// disk of that radius lying in the world XY plane.
#[derive(Debug, Copy, Clone)]
pub struct PointLight {
    pub position: V3,
    pub intensity: f64,
    pub radius: f64,
}

// Delta lights are still jittered by a small offset so that repeated shadow
// samples soften the terminator instead of producing a hard edge.
const DELTA_LIGHT_JITTER: f64 = 0.025;

impl PointLight {
    pub fn new(position: V3, intensity: f64, radius: f64) -> PointLight {
        PointLight { position, intensity, radius }
    }

    /// Draws one stochastic sample position on the light.
    pub fn sample_position(&self, rng: &mut dyn RngCore) -> V3 {
        if self.radius > 0.0 {
            // Uniform sample over a disk in the world XY plane
            let r = rng.random::<f64>().sqrt() * self.radius;
            let theta = rng.random::<f64>() * 2.0 * PI;
            self.position + V3(r * theta.cos(), r * theta.sin(), 0.0)
        } else {
            let jitter = V3(
                rng.random_range(-DELTA_LIGHT_JITTER..DELTA_LIGHT_JITTER),
                rng.random_range(-DELTA_LIGHT_JITTER..DELTA_LIGHT_JITTER),
                rng.random_range(-DELTA_LIGHT_JITTER..DELTA_LIGHT_JITTER),
            );
            self.position + jitter
        }
    }
}
