use crate::camera::Camera;
use crate::lights::PointLight;
use crate::shapes::{ Hit, Primitive };
use crate::types::{ Ray, V3 };

/// Everything the renderer consumes. Built once by the loader and never
/// mutated while rendering, so it is shared across workers by reference.
pub struct Scene {
    pub objects: Vec<Primitive>,
    pub lights: Vec<PointLight>,
    pub camera: Camera,
    pub background: V3,
    pub ambient: V3,
}

impl Scene {
    pub fn new(camera: Camera) -> Scene {
        Scene {
            objects: vec![],
            lights: vec![],
            camera,
            background: V3(0.8, 0.9, 1.0),
            ambient: V3(0.2, 0.2, 0.2),
        }
    }

    /// Closest-hit query by scanning every primitive. The reference path for
    /// the BVH, and the fallback when acceleration is disabled.
    pub fn intersect_linear(&self, ray: &Ray, hit: &mut Hit) -> bool {
        let mut any_hit = false;
        for obj in self.objects.iter() {
            if obj.intersect(ray, hit) {
                any_hit = true;
            }
        }
        any_hit
    }
}
