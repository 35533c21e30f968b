use std::f64::consts::PI;

use rand::{ Rng, RngCore };

use crate::types::{ Ray, V3 };

/// Physical camera model: pinhole projection through a metric sensor, with
/// optional thin-lens depth of field and a finite shutter for motion blur.
///
/// All lengths are meters. Pixel (0, 0) is the top-left of the output image.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: V3,
    pub gaze: V3,
    pub focal_length: f64,
    pub sensor_width: f64,
    pub sensor_height: f64,
    pub res_x: usize,
    pub res_y: usize,

    /// Shutter open time in seconds; 0 disables motion blur.
    pub shutter_speed: f64,
    /// Camera velocity in m/s, applied as a position offset over the shutter.
    pub velocity: V3,
    /// Aperture f-number; <= 0 disables depth of field.
    pub aperture_fstop: f64,
    /// Distance to the plane of perfect focus, in meters.
    pub focus_distance: f64,

    // Derived state, valid after compute_basis / compute_lens_radius
    forward: V3,
    right: V3,
    up: V3,
    lens_radius: f64,
}

impl Default for Camera {
    fn default() -> Camera {
        let mut camera = Camera {
            position: V3::ZERO,
            gaze: V3(0.0, 0.0, -1.0),
            focal_length: 0.05,
            sensor_width: 0.036,
            sensor_height: 0.024,
            res_x: 800,
            res_y: 600,
            shutter_speed: 0.0,
            velocity: V3::ZERO,
            aperture_fstop: 0.0,
            focus_distance: 5.0,
            forward: V3::ZERO,
            right: V3::ZERO,
            up: V3::ZERO,
            lens_radius: 0.0,
        };
        camera.compute_basis();
        camera
    }
}

impl Camera {
    /// Rebuilds the orthonormal basis from the gaze direction.
    /// World Z seeds the up direction, switching to world Y when the gaze
    /// is close to vertical.
    pub fn compute_basis(&mut self) {
        self.forward = self.gaze.unit();
        let mut world_up = V3::POS_Z;
        if V3::dot(self.forward, world_up).abs() > 0.999 {
            world_up = V3::POS_Y;
        }
        self.right = V3::cross(self.forward, world_up).unit();
        self.up = V3::cross(self.right, self.forward).unit();
    }

    /// Derives the thin-lens radius from the aperture f-number.
    pub fn compute_lens_radius(&mut self) {
        self.lens_radius = if self.aperture_fstop <= 0.0 {
            0.0
        } else {
            self.focal_length / (2.0 * self.aperture_fstop)
        };
    }

    pub fn forward(&self) -> V3 {
        self.forward
    }

    pub fn lens_radius(&self) -> f64 {
        self.lens_radius
    }

    fn sensor_offset(&self, px: f64, py: f64) -> (f64, f64) {
        let ndc_x = (px + 0.5) / self.res_x as f64 - 0.5;
        let ndc_y = 0.5 - (py + 0.5) / self.res_y as f64;
        (ndc_x * self.sensor_width, ndc_y * self.sensor_height)
    }

    /// Primary ray through pixel (px, py) with no lens or shutter effects.
    /// Fractional pixel coordinates address points within the pixel.
    pub fn pixel_to_ray(&self, px: f64, py: f64) -> Ray {
        let (sx, sy) = self.sensor_offset(px, py);
        let direction = (self.forward * self.focal_length + self.right * sx + self.up * sy).unit();
        Ray::new(self.position, direction)
    }

    /// Primary ray with motion blur and depth of field applied.
    ///
    /// `time_offset` shifts the camera along its velocity; `lens_pos` is a
    /// point on the lens disk (pass `position` to disable the lens).
    pub fn pixel_to_ray_with_effects(&self, px: f64, py: f64, time_offset: f64, lens_pos: V3) -> Ray {
        let (sx, sy) = self.sensor_offset(px, py);
        let sensor_point = self.forward * self.focal_length + self.right * sx + self.up * sy;

        let mut cam_pos = self.position;
        if time_offset != 0.0 && self.velocity.length() > 0.0 {
            cam_pos = cam_pos + self.velocity * time_offset;
        }

        let using_dof = self.lens_radius > 0.0 && lens_pos != self.position;
        if using_dof {
            // Find where this sensor ray crosses the focus plane, then aim
            // at that point from the sampled lens position
            let original_dir = sensor_point.unit();
            let t_focus = self.focus_distance / V3::dot(original_dir, self.forward);
            let focus_point = cam_pos + original_dir * t_focus;
            Ray::new(lens_pos, (focus_point - lens_pos).unit())
        } else {
            Ray::new(cam_pos, sensor_point.unit())
        }
    }

    /// Uniform sample on the lens disk, in the (right, up) plane through the
    /// camera position. Returns the camera position when DOF is disabled.
    pub fn sample_lens_position(&self, rng: &mut dyn RngCore) -> V3 {
        if self.lens_radius <= 0.0 {
            return self.position;
        }
        let r = rng.random::<f64>() * self.lens_radius;
        let theta = rng.random::<f64>() * 2.0 * PI;
        self.position + self.right * (r * theta.cos()) + self.up * (r * theta.sin())
    }

    /// Random instant within the shutter interval, or 0 with the shutter disabled.
    pub fn get_time_offset(&self, rng: &mut dyn RngCore) -> f64 {
        if self.shutter_speed <= 0.0 {
            return 0.0;
        }
        rng.random::<f64>() * self.shutter_speed
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::Camera;
    use crate::types::{ V3, assert_approx_eq };

    fn looking(gaze: V3) -> Camera {
        let mut camera = Camera::default();
        camera.gaze = gaze;
        camera.compute_basis();
        camera
    }

    #[test]
    fn basis_is_orthonormal() {
        for gaze in [V3(0.0, 0.0, -1.0), V3(1.0, 2.0, 3.0), V3(-0.3, 0.9, 0.1)] {
            let camera = looking(gaze);
            assert_approx_eq!(camera.forward.length(), 1.0);
            assert_approx_eq!(camera.right.length(), 1.0);
            assert_approx_eq!(camera.up.length(), 1.0);
            assert_approx_eq!(V3::dot(camera.right, camera.up), 0.0);
            assert_approx_eq!(V3::dot(camera.right, camera.forward), 0.0);
            assert_approx_eq!(V3::dot(camera.up, camera.forward), 0.0);
        }
    }

    #[test]
    fn vertical_gaze_falls_back_to_the_y_seed() {
        let camera = looking(V3(0.0, 0.0, 1.0));
        assert_approx_eq!(camera.right.length(), 1.0);
        assert_approx_eq!(camera.up.length(), 1.0);
    }

    #[test]
    fn center_pixel_ray_follows_the_gaze() {
        let mut camera = looking(V3(0.2, -0.4, -1.0));
        camera.res_x = 101;
        camera.res_y = 101;
        let ray = camera.pixel_to_ray(50.0, 50.0);
        let forward = camera.forward();
        assert_approx_eq!(ray.direction.x(), forward.x(), EPSILON=1.0e-6);
        assert_approx_eq!(ray.direction.y(), forward.y(), EPSILON=1.0e-6);
        assert_approx_eq!(ray.direction.z(), forward.z(), EPSILON=1.0e-6);
    }

    #[test]
    fn effects_ray_reduces_to_the_plain_ray_without_dof() {
        let mut camera = looking(V3(0.3, 0.1, -1.0));
        camera.aperture_fstop = 0.0;
        camera.compute_lens_radius();
        let plain = camera.pixel_to_ray(12.0, 34.0);
        let effects = camera.pixel_to_ray_with_effects(12.0, 34.0, 0.0, camera.position);
        assert_eq!(plain.origin, effects.origin);
        assert_eq!(plain.direction, effects.direction);
    }

    #[test]
    fn lens_samples_stay_on_the_lens_disk() {
        let mut camera = looking(V3(0.0, 0.0, -1.0));
        camera.aperture_fstop = 2.0;
        camera.compute_lens_radius();
        let radius = camera.lens_radius();
        assert!(radius > 0.0);
        let mut rng = XorShiftRng::seed_from_u64(9);
        for _ in 0..500 {
            let p = camera.sample_lens_position(&mut rng);
            let offset = p - camera.position;
            assert!(offset.length() <= radius + 1.0e-12);
            // Offset lies in the lens plane
            assert_approx_eq!(V3::dot(offset, camera.forward()), 0.0);
        }
    }

    #[test]
    fn disabled_lens_samples_at_the_camera() {
        let camera = looking(V3(0.0, 0.0, -1.0));
        let mut rng = XorShiftRng::seed_from_u64(9);
        assert_eq!(camera.sample_lens_position(&mut rng), camera.position);
    }

    #[test]
    fn time_offset_respects_the_shutter() {
        let mut camera = Camera::default();
        let mut rng = XorShiftRng::seed_from_u64(9);
        assert_eq!(camera.get_time_offset(&mut rng), 0.0);
        camera.shutter_speed = 0.5;
        for _ in 0..100 {
            let t = camera.get_time_offset(&mut rng);
            assert!((0.0..0.5).contains(&t));
        }
    }

    #[test]
    fn dof_ray_passes_through_the_focus_point() {
        let mut camera = looking(V3(0.0, 0.0, -1.0));
        camera.aperture_fstop = 2.0;
        camera.focus_distance = 5.0;
        camera.compute_lens_radius();

        // Center-pixel sensor ray focuses straight ahead at 5m
        camera.res_x = 101;
        camera.res_y = 101;
        let lens_pos = camera.position + camera.right * camera.lens_radius();
        let ray = camera.pixel_to_ray_with_effects(50.0, 50.0, 0.0, lens_pos);
        let focus_point = camera.position + camera.forward() * 5.0;
        let to_focus = (focus_point - lens_pos).unit();
        assert_approx_eq!(ray.direction.x(), to_focus.x(), EPSILON=1.0e-6);
        assert_approx_eq!(ray.direction.y(), to_focus.y(), EPSILON=1.0e-6);
        assert_approx_eq!(ray.direction.z(), to_focus.z(), EPSILON=1.0e-6);
        assert_eq!(ray.origin, lens_pos);
    }
}
