use std::f64::consts::PI;

use crate::aabb::Aabb;
use crate::types::{ Ray, V3 };

use super::{ SurfaceHit, T_EPSILON };

#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: V3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: V3, radius: f64) -> Sphere {
        Sphere { center, radius }
    }

    pub(crate) fn intersect(&self, ray: &Ray, t_best: f64) -> Option<SurfaceHit> {
        // Solve |origin + t*dir - center|^2 = r^2
        let oc = ray.origin - self.center;
        let a = V3::dot(ray.direction, ray.direction);
        let b = 2.0 * V3::dot(ray.direction, oc);
        let c = V3::dot(oc, oc) - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sq = discriminant.sqrt();
        let t0 = (-b - sq) / (2.0 * a);
        let t1 = (-b + sq) / (2.0 * a);
        // Nearest root in front of the origin
        let mut t = t0;
        if t < T_EPSILON {
            t = t1;
        }
        if t < T_EPSILON || t >= t_best {
            return None;
        }

        let pos = ray.point_at_parameter(t);
        let normal = ((pos - self.center) / self.radius).unit();

        // Spherical UV from the outward unit normal
        let u = 0.5 + normal.z().atan2(normal.x()) / (2.0 * PI);
        let v = 0.5 - normal.y().asin() / PI;

        Some(SurfaceHit { t, pos, normal, u, v })
    }

    pub(crate) fn bounds(&self) -> Aabb {
        Aabb::from_min_max(self.center - V3::ONE * self.radius,
                           self.center + V3::ONE * self.radius)
    }
}
