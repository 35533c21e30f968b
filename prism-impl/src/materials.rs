/// Surface material parameters shared by every primitive.
///
/// `reflectivity` and `refractivity` blend the specular recursion into the
/// shaded color; `ior` is the index of refraction; `shininess` is the
/// Blinn-Phong exponent. `roughness` is accepted by the scene format and
/// stored, but the Blinn-Phong shader does not consume it.
#[derive(Debug, Copy, Clone)]
pub struct Material {
    pub reflectivity: f64,
    pub refractivity: f64,
    pub ior: f64,
    pub shininess: f64,
    pub roughness: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            reflectivity: 0.0,
            refractivity: 0.0,
            ior: 1.0,
            shininess: 32.0,
            roughness: 0.0,
        }
    }
}
