//! Planar geometry primitives.
//!
//! All functions operate on pixel coordinates of a single image view and use
//! double precision without any regularisation.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{GeometryError, Mat3, Pt2, Real, Vec2, Vec3, cross2};

/// A directed segment between two picked points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Pt2,
    pub end: Pt2,
}

impl Segment {
    pub fn new(start: Pt2, end: Pt2) -> Self {
        Self { start, end }
    }

    /// Direction vector `end - start`.
    #[inline]
    pub fn vector(&self) -> Vec2 {
        self.end - self.start
    }

    #[inline]
    pub fn length(&self) -> Real {
        length(self.start, self.end)
    }

    /// Same segment traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }
}

/// Slope and intercept of a track `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackParameters {
    pub slope: Real,
    pub intercept: Real,
}

/// Euclidean distance between two points.
#[inline]
pub fn length(a: Pt2, b: Pt2) -> Real {
    (a - b).norm()
}

/// Radius of the circle through three points.
///
/// Solves the linear system whose i-th row is `[2 x_i, 2 y_i, 1]` with
/// right-hand side `x_i^2 + y_i^2`. For the solution `(xc, yc, k)` the
/// circle has centre `(xc, yc)` and radius `sqrt(xc^2 + yc^2 + k)`.
///
/// # Errors
///
/// [`GeometryError::DegenerateGeometry`] if the points are collinear (the
/// system is singular).
pub fn radius(a: Pt2, b: Pt2, c: Pt2) -> Result<Real, GeometryError> {
    let (centre, r) = circumcircle(a, b, c)?;
    debug!("circle through 3 points: centre ({}, {}), radius {}", centre.x, centre.y, r);
    Ok(r)
}

/// Centre and radius of the circle through three points.
///
/// Same system as [`radius`]; exposed so callers can draw the fitted track.
pub fn circumcircle(a: Pt2, b: Pt2, c: Pt2) -> Result<(Pt2, Real), GeometryError> {
    let ab = b - a;
    let ac = c - a;
    let area2 = cross2(&ab, &ac);
    if area2.abs() <= Real::EPSILON * ab.norm() * ac.norm() {
        return Err(GeometryError::DegenerateGeometry);
    }

    #[rustfmt::skip]
    let lhs = Mat3::new(
        2.0 * a.x, 2.0 * a.y, 1.0,
        2.0 * b.x, 2.0 * b.y, 1.0,
        2.0 * c.x, 2.0 * c.y, 1.0,
    );
    let rhs = Vec3::new(
        a.coords.norm_squared(),
        b.coords.norm_squared(),
        c.coords.norm_squared(),
    );
    let sol = lhs
        .lu()
        .solve(&rhs)
        .ok_or(GeometryError::DegenerateGeometry)?;

    let (xc, yc, k) = (sol.x, sol.y, sol.z);
    let r2 = xc * xc + yc * yc + k;
    if !r2.is_finite() || r2 < 0.0 {
        return Err(GeometryError::DegenerateGeometry);
    }
    Ok((Pt2::new(xc, yc), r2.sqrt()))
}

/// Unsigned opening angle in `[0, pi]` between two directed segments.
///
/// Each segment is interpreted as the vector `end - start`. The value is the
/// arccos of the normalised dot product, evaluated as `atan2(|u x v|, u . v)`
/// so that parallel and anti-parallel segments give exactly `0` and `pi`.
///
/// # Errors
///
/// [`GeometryError::ZeroLengthSegment`] if either segment has coincident
/// endpoints.
pub fn angle(l1: &Segment, l2: &Segment) -> Result<Real, GeometryError> {
    let u = l1.vector();
    let v = l2.vector();
    if u.norm() == 0.0 || v.norm() == 0.0 {
        return Err(GeometryError::ZeroLengthSegment);
    }
    Ok(cross2(&u, &v).abs().atan2(u.dot(&v)))
}

/// Slope and intercept of the line through the segment endpoints.
///
/// # Errors
///
/// [`GeometryError::VerticalLine`] if both endpoints share the same x.
pub fn track_parameters(line: &Segment) -> Result<TrackParameters, GeometryError> {
    let d = line.vector();
    if d.x == 0.0 {
        return Err(GeometryError::VerticalLine);
    }
    let slope = d.y / d.x;
    let intercept = line.start.y - slope * line.start.x;
    Ok(TrackParameters { slope, intercept })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_4, PI, SQRT_2};

    #[test]
    fn radius_unit_circle() {
        let r = radius(Pt2::new(0.0, 1.0), Pt2::new(1.0, 0.0), Pt2::new(0.0, -1.0)).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn radius_offset_circle() {
        let r = radius(Pt2::new(-6.0, 3.0), Pt2::new(-3.0, 2.0), Pt2::new(0.0, 3.0)).unwrap();
        assert!((r - 5.0).abs() < 1e-9);
    }

    #[test]
    fn radius_skewed_triangle() {
        let r = radius(Pt2::new(1.0, 1.0), Pt2::new(2.0, 2.0), Pt2::new(3.0, 4.0)).unwrap();
        assert!((r - 5.7).abs() / 5.7 < 1e-3, "radius {r}");
    }

    #[test]
    fn radius_matches_circumcentre_distance() {
        let pts = [
            (Pt2::new(120.5, 33.0), Pt2::new(410.25, 87.5), Pt2::new(250.0, 400.0)),
            (Pt2::new(-3.0, 7.0), Pt2::new(2.5, -1.0), Pt2::new(9.0, 4.0)),
            (Pt2::new(310.0, 220.0), Pt2::new(355.0, 260.0), Pt2::new(290.0, 300.0)),
        ];
        for (a, b, c) in pts {
            let (centre, r) = circumcircle(a, b, c).unwrap();
            for p in [a, b, c] {
                let d = length(centre, p);
                assert!((d - r).abs() <= 1e-6 * r, "distance {d} vs radius {r}");
            }
        }
    }

    #[test]
    fn radius_rejects_collinear_points() {
        let err = radius(Pt2::new(0.0, 0.0), Pt2::new(1.0, 1.0), Pt2::new(2.0, 2.0)).unwrap_err();
        assert_eq!(err, GeometryError::DegenerateGeometry);

        let err = radius(Pt2::new(5.0, 5.0), Pt2::new(5.0, 5.0), Pt2::new(1.0, 2.0)).unwrap_err();
        assert_eq!(err, GeometryError::DegenerateGeometry);
    }

    #[test]
    fn length_cases() {
        assert!((length(Pt2::new(0.0, 1.0), Pt2::new(1.0, 0.0)) - SQRT_2).abs() < 1e-12);
        assert_eq!(length(Pt2::new(-3.0, 3.0), Pt2::new(-3.0, 2.0)), 1.0);
        assert!((length(Pt2::new(1.0, 1.0), Pt2::new(3.0, 4.0)) - 13f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn length_is_symmetric_and_zero_on_self() {
        let a = Pt2::new(12.5, -4.0);
        let b = Pt2::new(-7.25, 30.0);
        assert_eq!(length(a, b), length(b, a));
        assert!(length(a, b) >= 0.0);
        assert_eq!(length(a, a), 0.0);
        assert_eq!(Segment::new(a, b).length(), length(a, b));
        assert_eq!(Segment::new(a, b).reversed().length(), length(a, b));
    }

    #[test]
    fn angle_between_decay_lines() {
        let l1 = Segment::new(Pt2::new(-1.0, 1.0), Pt2::new(0.0, 0.0));
        let l2 = Segment::new(Pt2::new(0.0, 0.0), Pt2::new(1.0, 0.0));
        assert!((angle(&l1, &l2).unwrap() - FRAC_PI_4).abs() < 1e-12);

        let l3 = Segment::new(Pt2::new(0.0, 0.0), Pt2::new(0.0, -1.0));
        assert!((angle(&l1, &l3).unwrap() - FRAC_PI_4).abs() < 1e-12);

        let l4 = Segment::new(Pt2::new(1.0, -1.0), Pt2::new(0.0, 0.0));
        assert!((angle(&l4, &l2).unwrap() - 3.0 * FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn angle_parallel_antiparallel_symmetric() {
        let v = Segment::new(Pt2::new(2.0, 3.0), Pt2::new(5.0, 7.0));
        assert_eq!(angle(&v, &v).unwrap(), 0.0);
        assert!((angle(&v, &v.reversed()).unwrap() - PI).abs() < 1e-15);

        let w = Segment::new(Pt2::new(0.0, 0.0), Pt2::new(-1.0, 4.0));
        assert_eq!(angle(&v, &w).unwrap(), angle(&w, &v).unwrap());
    }

    #[test]
    fn angle_rejects_zero_length() {
        let p = Pt2::new(3.0, 3.0);
        let zero = Segment::new(p, p);
        let v = Segment::new(Pt2::new(0.0, 0.0), Pt2::new(1.0, 0.0));
        assert_eq!(angle(&zero, &v).unwrap_err(), GeometryError::ZeroLengthSegment);
        assert_eq!(angle(&v, &zero).unwrap_err(), GeometryError::ZeroLengthSegment);
    }

    #[test]
    fn track_parameters_of_line() {
        let line = Segment::new(Pt2::new(1.0, 3.0), Pt2::new(3.0, 7.0));
        let t = track_parameters(&line).unwrap();
        assert!((t.slope - 2.0).abs() < 1e-12);
        assert!((t.intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn track_parameters_rejects_vertical() {
        let line = Segment::new(Pt2::new(4.0, 0.0), Pt2::new(4.0, 10.0));
        assert_eq!(track_parameters(&line).unwrap_err(), GeometryError::VerticalLine);
    }
}
