use crate::aabb::Aabb;
use crate::types::{ Ray, V3 };

use super::{ SurfaceHit, T_EPSILON };

/// Planar quadrilateral given by four corners in counter-clockwise order,
/// tested as the two triangles (0,1,2) and (0,2,3).
#[derive(Debug, Clone)]
pub struct Quad {
    pub corners: [V3; 4],
}

/// Barycentric point-in-triangle test for a point already on the triangle's plane.
fn point_in_triangle(p: V3, a: V3, b: V3, c: V3) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;
    let dot00 = V3::dot(v0, v0);
    let dot01 = V3::dot(v0, v1);
    let dot02 = V3::dot(v0, v2);
    let dot11 = V3::dot(v1, v1);
    let dot12 = V3::dot(v1, v2);
    let denom = dot00 * dot11 - dot01 * dot01;
    // Degenerate triangle
    if denom.abs() < 1.0e-12 {
        return false;
    }
    let u = (dot11 * dot02 - dot01 * dot12) / denom;
    let v = (dot00 * dot12 - dot01 * dot02) / denom;
    u >= -1.0e-8 && v >= -1.0e-8 && u + v <= 1.0 + 1.0e-8
}

impl Quad {
    pub fn new(corners: [V3; 4]) -> Quad {
        Quad { corners }
    }

    pub(crate) fn intersect(&self, ray: &Ray, t_best: f64) -> Option<SurfaceHit> {
        let [a, b, c, d] = self.corners;

        let u_edge = b - a;
        let v_edge = d - a;

        let normal = V3::cross(b - a, c - a).unit();
        let denom = V3::dot(normal, ray.direction);
        // Ray parallel to the plane
        if denom.abs() < 1.0e-12 {
            return None;
        }
        let t = V3::dot(normal, a - ray.origin) / denom;
        if t < T_EPSILON || t >= t_best {
            return None;
        }
        let p = ray.point_at_parameter(t);

        if !point_in_triangle(p, a, b, c) && !point_in_triangle(p, a, c, d) {
            return None;
        }

        // Face the normal against the incident ray
        let normal = if denom < 0.0 { normal } else { -normal };

        // Project onto the quad edges for UV
        let local = p - a;
        let u = V3::dot(local, u_edge) / u_edge.length_squared();
        let v = V3::dot(local, v_edge) / v_edge.length_squared();

        Some(SurfaceHit { t, pos: p, normal, u, v })
    }

    pub(crate) fn bounds(&self) -> Aabb {
        Aabb::from_vertices_iter(self.corners)
    }
}
