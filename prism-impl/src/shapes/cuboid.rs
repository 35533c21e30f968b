use crate::aabb::Aabb;
use crate::matrix::Matrix3;
use crate::types::{ Ray, V3 };

use super::{ SurfaceHit, T_EPSILON };

/// Oriented box: center, full extents along each local axis, and an
/// object-to-world rotation (with its transpose cached for the inverse).
#[derive(Debug, Clone)]
pub struct Cuboid {
    pub center: V3,
    pub size: V3,
    rot: Matrix3,
    rot_inv: Matrix3,
}

impl Cuboid {
    pub fn new(center: V3, size: V3) -> Cuboid {
        Cuboid {
            center,
            size,
            rot: Matrix3::default(),
            rot_inv: Matrix3::default(),
        }
    }

    /// Sets the orientation from Euler angles in degrees, composed Rz * Ry * Rx.
    pub fn with_rotation_deg(mut self, rx: f64, ry: f64, rz: f64) -> Cuboid {
        self.rot = Matrix3::from_euler_deg(rx, ry, rz);
        self.rot_inv = self.rot.transpose();
        self
    }

    pub(crate) fn intersect(&self, ray: &Ray, t_best: f64) -> Option<SurfaceHit> {
        // The box's three world-space axes
        let axes = [
            self.rot.transform(V3::POS_X),
            self.rot.transform(V3::POS_Y),
            self.rot.transform(V3::POS_Z),
        ];
        let half = self.size * 0.5;
        let halves = half.xyz();

        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        let mut best_normal = V3::ZERO;

        for (axis, h) in axes.iter().copied().zip(halves) {
            let e = V3::dot(axis, self.center - ray.origin);
            let f = V3::dot(axis, ray.direction);

            if f.abs() < 1.0e-6 {
                // Ray parallel to this slab pair
                if e.abs() > h {
                    return None;
                }
                continue;
            }

            let norm = axis.unit();
            let mut t1 = (e - h) / f;
            let mut t2 = (e + h) / f;
            let mut n1 = -norm;
            let mut n2 = norm;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
                std::mem::swap(&mut n1, &mut n2);
            }
            if t1 > t_min {
                t_min = t1;
                best_normal = n1;
            }
            if t2 < t_max {
                t_max = t2;
            }
            if t_min > t_max || t_max < T_EPSILON {
                return None;
            }
        }

        // Inside the box the entry plane is behind us; take the exit instead
        let t = if t_min > T_EPSILON { t_min } else { t_max };
        if t < T_EPSILON || t >= t_best {
            return None;
        }

        let pos = ray.point_at_parameter(t);
        let normal = best_normal.unit();

        // UV from the local-space hit, scaled into [-1, 1] per face
        let local = self.rot_inv.transform(pos - self.center) / half;
        let ax = V3::dot(normal, axes[0]).abs();
        let ay = V3::dot(normal, axes[1]).abs();
        let az = V3::dot(normal, axes[2]).abs();
        let (u, v) = if ax > ay && ax > az {
            (0.5 + 0.5 * local.z(), 0.5 + 0.5 * local.y())
        } else if ay > ax && ay > az {
            (0.5 + 0.5 * local.x(), 0.5 + 0.5 * local.z())
        } else {
            (0.5 + 0.5 * local.x(), 0.5 + 0.5 * local.y())
        };

        Some(SurfaceHit { t, pos, normal, u, v })
    }

    pub(crate) fn bounds(&self) -> Aabb {
        let half = self.size * 0.5;
        let corners = [
            V3(-half.0, -half.1, -half.2),
            V3(-half.0, -half.1,  half.2),
            V3(-half.0,  half.1, -half.2),
            V3(-half.0,  half.1,  half.2),
            V3( half.0, -half.1, -half.2),
            V3( half.0, -half.1,  half.2),
            V3( half.0,  half.1, -half.2),
            V3( half.0,  half.1,  half.2),
        ];
        Aabb::from_vertices_iter(corners.iter().map(|&c| self.center + self.rot.transform(c)))
    }
}
