use nalgebra::{Matrix3, Point2, Vector2, Vector3};

pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Pt2 = Point2<Real>;
pub type Mat3 = Matrix3<Real>;

/// Scalar 2D cross product `u.x * v.y - u.y * v.x`.
#[inline]
pub fn cross2(u: &Vec2, v: &Vec2) -> Real {
    u.x * v.y - u.y * v.x
}
