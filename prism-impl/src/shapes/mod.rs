pub mod sphere;
pub mod quad;
pub mod cuboid;

pub use sphere::Sphere;
pub use quad::Quad;
pub use cuboid::Cuboid;

use std::sync::Arc;

use crate::aabb::Aabb;
use crate::image::Image;
use crate::materials::Material;
use crate::types::{ Ray, V3 };

/// Intersections below this distance are rejected to avoid self-intersection.
pub(crate) const T_EPSILON: f64 = 1.0e-6;

/// Closest-so-far intersection record.
///
/// `t` doubles as the search cursor: every intersection test rejects
/// candidates at or beyond the current `t`, so chaining tests against a
/// shared `Hit` leaves the nearest intersection in place.
#[derive(Clone)]
pub struct Hit {
    pub hit: bool,
    pub t: f64,
    pub pos: V3,
    pub normal: V3,
    pub albedo: V3,
    pub material: Material,
    pub u: f64,
    pub v: f64,
    pub texture: Option<Arc<Image>>,
}

impl Default for Hit {
    fn default() -> Hit {
        Hit {
            hit: false,
            t: f64::INFINITY,
            pos: V3::ZERO,
            normal: V3::ZERO,
            albedo: V3::ZERO,
            material: Material::default(),
            u: 0.0,
            v: 0.0,
            texture: None,
        }
    }
}

/// Geometry-only intersection result produced by the shape variants.
pub(crate) struct SurfaceHit {
    pub(crate) t: f64,
    pub(crate) pos: V3,
    pub(crate) normal: V3,
    pub(crate) u: f64,
    pub(crate) v: f64,
}

#[derive(Clone)]
pub enum Shape {
    Sphere(Sphere),
    Quad(Quad),
    Cuboid(Cuboid),
}

/// A scene object: a shape plus its surface attributes.
#[derive(Clone)]
pub struct Primitive {
    pub name: String,
    pub albedo: V3,
    pub material: Material,
    pub texture: Option<Arc<Image>>,
    pub shape: Shape,
}

impl Primitive {
    pub fn new(name: impl Into<String>, shape: Shape) -> Primitive {
        Primitive {
            name: name.into(),
            albedo: V3(0.8, 0.8, 0.8),
            material: Material::default(),
            texture: None,
            shape,
        }
    }

    pub fn with_albedo(mut self, albedo: V3) -> Primitive {
        self.albedo = albedo;
        self
    }

    pub fn with_material(mut self, material: Material) -> Primitive {
        self.material = material;
        self
    }

    pub fn with_texture(mut self, texture: Arc<Image>) -> Primitive {
        self.texture = Some(texture);
        self
    }

    /// Tests the ray against this primitive, refining `hit` if a nearer
    /// intersection than `hit.t` is found. Returns true on refinement.
    pub fn intersect(&self, ray: &Ray, hit: &mut Hit) -> bool {
        let surface = match &self.shape {
            Shape::Sphere(s) => s.intersect(ray, hit.t),
            Shape::Quad(q) => q.intersect(ray, hit.t),
            Shape::Cuboid(c) => c.intersect(ray, hit.t),
        };
        match surface {
            None => false,
            Some(s) => {
                hit.hit = true;
                hit.t = s.t;
                hit.pos = s.pos;
                hit.normal = s.normal;
                hit.u = s.u;
                hit.v = s.v;
                hit.albedo = self.albedo;
                hit.material = self.material;
                hit.texture = self.texture.clone();
                true
            }
        }
    }

    /// Worldspace bounding box of this primitive.
    pub fn bounds(&self) -> Aabb {
        match &self.shape {
            Shape::Sphere(s) => s.bounds(),
            Shape::Quad(q) => q.bounds(),
            Shape::Cuboid(c) => c.bounds(),
        }
    }
}
