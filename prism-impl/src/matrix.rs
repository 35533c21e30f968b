use std::ops::Mul;

use crate::types::V3;

/// 3x3 rotation matrix, column-vector convention: `m.transform(v)` is `M * v`.
#[derive(Debug, Copy, Clone)]
pub struct Matrix3([[f64; 3]; 3]);

impl Default for Matrix3 {
    fn default() -> Self {
        // Identity matrix
        Matrix3([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }
}

impl Matrix3 {

    pub fn rotate_x(theta_rads: f64) -> Matrix3 {
        let sin = theta_rads.sin();
        let cos = theta_rads.cos();
        Matrix3([
            [1.0, 0.0, 0.0],
            [0.0, cos, -sin],
            [0.0, sin, cos],
        ])
    }

    pub fn rotate_y(theta_rads: f64) -> Matrix3 {
        let sin = theta_rads.sin();
        let cos = theta_rads.cos();
        Matrix3([
            [cos, 0.0, sin],
            [0.0, 1.0, 0.0],
            [-sin, 0.0, cos],
        ])
    }

    pub fn rotate_z(theta_rads: f64) -> Matrix3 {
        let sin = theta_rads.sin();
        let cos = theta_rads.cos();
        Matrix3([
            [cos, -sin, 0.0],
            [sin, cos, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Builds the rotation for intrinsic Euler angles in degrees, composed as `Rz * Ry * Rx`.
    pub fn from_euler_deg(rx_deg: f64, ry_deg: f64, rz_deg: f64) -> Matrix3 {
        Matrix3::rotate_z(rz_deg.to_radians())
            * Matrix3::rotate_y(ry_deg.to_radians())
            * Matrix3::rotate_x(rx_deg.to_radians())
    }

    pub fn transpose(&self) -> Matrix3 {
        let Matrix3(m) = self;
        let mut r = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = m[j][i];
            }
        }
        Matrix3(r)
    }

    pub fn transform(&self, v: V3) -> V3 {
        let Matrix3(m) = self;
        V3(m[0][0] * v.0 + m[0][1] * v.1 + m[0][2] * v.2,
           m[1][0] * v.0 + m[1][1] * v.1 + m[1][2] * v.2,
           m[2][0] * v.0 + m[2][1] * v.1 + m[2][2] * v.2)
    }

    pub fn multiply(Matrix3(m1): &Matrix3, Matrix3(m2): &Matrix3) -> Matrix3 {
        let mut result = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    result[i][j] += m1[i][k] * m2[k][j];
                }
            }
        }
        Matrix3(result)
    }
}

impl Mul for Matrix3 {
    type Output = Matrix3;

    fn mul(self, rhs: Self) -> Self::Output {
        Matrix3::multiply(&self, &rhs)
    }
}

#[cfg(test)]
mod test {
    use super::Matrix3;
    use crate::types::{ V3, assert_approx_eq };

    #[test]
    fn rotate_about_x() {
        let p = Matrix3::rotate_x(90_f64.to_radians()).transform(V3::POS_Y);
        assert_approx_eq!(p.0, 0.0);
        assert_approx_eq!(p.1, 0.0);
        assert_approx_eq!(p.2, 1.0);
    }

    #[test]
    fn rotate_about_y() {
        let p = Matrix3::rotate_y(90_f64.to_radians()).transform(V3::POS_Z);
        assert_approx_eq!(p.0, 1.0);
        assert_approx_eq!(p.1, 0.0);
        assert_approx_eq!(p.2, 0.0);
    }

    #[test]
    fn rotate_about_z() {
        let p = Matrix3::rotate_z(-90_f64.to_radians()).transform(V3::POS_Y);
        assert_approx_eq!(p.0, 1.0);
        assert_approx_eq!(p.1, 0.0);
        assert_approx_eq!(p.2, 0.0);
    }

    #[test]
    fn euler_composition_applies_x_first() {
        // Rz * Ry * Rx: the x rotation carries +Y to +Z, then the z rotation leaves +Z alone
        let m = Matrix3::from_euler_deg(90.0, 0.0, 90.0);
        let p = m.transform(V3::POS_Y);
        assert_approx_eq!(p.0, 0.0);
        assert_approx_eq!(p.1, 0.0);
        assert_approx_eq!(p.2, 1.0);
    }

    #[test]
    fn transpose_inverts_a_rotation() {
        let m = Matrix3::from_euler_deg(30.0, 45.0, 60.0);
        let v = V3(1.0, 2.0, 3.0);
        let roundtrip = m.transpose().transform(m.transform(v));
        assert_approx_eq!(roundtrip.0, v.0);
        assert_approx_eq!(roundtrip.1, v.1);
        assert_approx_eq!(roundtrip.2, v.2);
    }
}
