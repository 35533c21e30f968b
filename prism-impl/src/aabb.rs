use crate::types::{ Ray, V3 };

/// Axis-aligned bounding box. The default box is empty (min = +inf, max = -inf)
/// so that expanding it with any point yields that point.
#[derive(Debug, Copy, Clone)]
pub struct Aabb {
    pub min: V3,
    pub max: V3,
}

impl Default for Aabb {
    fn default() -> Aabb {
        Aabb {
            min: V3(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: V3(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
}

impl Aabb {
    pub fn from_min_max(min: V3, max: V3) -> Aabb {
        Aabb { min, max }
    }

    /// Finds the box which fully contains the given sequence of vertices
    pub fn from_vertices_iter(vertices: impl IntoIterator<Item=V3>) -> Aabb {
        let mut aabb = Aabb::default();
        for vert in vertices {
            aabb.expand_point(vert);
        }
        aabb
    }

    pub fn expand_point(&mut self, p: V3) {
        self.min = V3::vmin(self.min, p);
        self.max = V3::vmax(self.max, p);
    }

    pub fn expand(&mut self, other: &Aabb) {
        self.min = V3::vmin(self.min, other.min);
        self.max = V3::vmax(self.max, other.max);
    }

    pub fn center(&self) -> V3 {
        (self.min + self.max) * 0.5
    }

    pub fn surface_area(&self) -> f64 {
        let d = self.max - self.min;
        2.0 * (d.0 * d.1 + d.0 * d.2 + d.1 * d.2)
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.0 <= other.min.0 && self.min.1 <= other.min.1 && self.min.2 <= other.min.2 &&
        self.max.0 >= other.max.0 && self.max.1 >= other.max.1 && self.max.2 >= other.max.2
    }

    /// Slab test: does the ray pass through this box anywhere inside [t_min, t_max]?
    pub fn hit_aabb(&self, ray: &Ray, mut t_min: f64, mut t_max: f64) -> bool {
        const PARALLEL_EPSILON: f64 = 1.0e-8;

        let ray_origin = ray.origin.xyz();
        let ray_direction = ray.direction.xyz();
        let min = self.min.xyz();
        let max = self.max.xyz();

        for dimension in 0..=2 {
            if ray_direction[dimension].abs() < PARALLEL_EPSILON {
                // Ray is parallel to this slab: inside or nothing
                if ray_origin[dimension] < min[dimension] || ray_origin[dimension] > max[dimension] {
                    return false;
                }
                continue;
            }
            let inv_d = 1.0 / ray_direction[dimension];
            let mut t0 = (min[dimension] - ray_origin[dimension]) * inv_d;
            let mut t1 = (max[dimension] - ray_origin[dimension]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = f64::max(t0, t_min);
            t_max = f64::min(t1, t_max);
            if t_max <= t_min {
                return false;
            }
        }

        true
    }
}
