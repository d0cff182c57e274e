//! Coordinate reference systems and point projections.

use serde::{Deserialize, Serialize};

use crate::point::Point2d;

/// Identifier of a coordinate reference system, e.g. `EPSG:3857`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(String);

impl Crs {
    /// Creates a CRS identifier.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The identifier string.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transformation of points between two coordinate reference systems.
///
/// Returns `None` when the point cannot be represented in the target system.
pub trait Projection: Send + Sync {
    /// Projects a point into the target system.
    fn project(&self, point: &Point2d) -> Option<Point2d>;

    /// Projects a point of the target system back into the source system.
    fn unproject(&self, point: &Point2d) -> Option<Point2d>;
}

/// View of a projection with source and target systems swapped.
pub struct InvertedProjection<'a>(&'a dyn Projection);

impl<'a> InvertedProjection<'a> {
    /// Creates an inverted view of the given projection.
    pub fn new(projection: &'a dyn Projection) -> Self {
        Self(projection)
    }
}

impl Projection for InvertedProjection<'_> {
    fn project(&self, point: &Point2d) -> Option<Point2d> {
        self.0.unproject(point)
    }

    fn unproject(&self, point: &Point2d) -> Option<Point2d> {
        self.0.project(point)
    }
}

/// Projection that returns the input points unchanged.
#[derive(Debug, Default, Copy, Clone)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn project(&self, point: &Point2d) -> Option<Point2d> {
        Some(*point)
    }

    fn unproject(&self, point: &Point2d) -> Option<Point2d> {
        Some(*point)
    }
}

/// Affine transformation between two planar systems: `x' = a*x + b*y + tx`, `y' = c*x + d*y + ty`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineProjection {
    /// Coefficient of `x` in the `x'` equation.
    pub a: f64,
    /// Coefficient of `y` in the `x'` equation.
    pub b: f64,
    /// Coefficient of `x` in the `y'` equation.
    pub c: f64,
    /// Coefficient of `y` in the `y'` equation.
    pub d: f64,
    /// Translation along `x`.
    pub tx: f64,
    /// Translation along `y`.
    pub ty: f64,
}

impl AffineProjection {
    /// Uniform scale followed by a translation.
    pub fn scale_offset(scale: f64, tx: f64, ty: f64) -> Self {
        Self {
            a: scale,
            b: 0.0,
            c: 0.0,
            d: scale,
            tx,
            ty,
        }
    }
}

impl Projection for AffineProjection {
    fn project(&self, point: &Point2d) -> Option<Point2d> {
        let x = self.a * point.x + self.b * point.y + self.tx;
        let y = self.c * point.x + self.d * point.y + self.ty;
        (x.is_finite() && y.is_finite()).then(|| Point2d::new(x, y))
    }

    fn unproject(&self, point: &Point2d) -> Option<Point2d> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 {
            return None;
        }
        let x = point.x - self.tx;
        let y = point.y - self.ty;
        Some(Point2d::new(
            (self.d * x - self.b * y) / det,
            (self.a * y - self.c * x) / det,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine_projection() {
        let projection = AffineProjection::scale_offset(2.0, 10.0, -10.0);
        assert_eq!(
            projection.project(&Point2d::new(1.0, 1.0)),
            Some(Point2d::new(12.0, -8.0))
        );
        assert_eq!(
            projection.unproject(&Point2d::new(12.0, -8.0)),
            Some(Point2d::new(1.0, 1.0))
        );

        let inverted = InvertedProjection::new(&projection);
        assert_eq!(
            inverted.project(&Point2d::new(12.0, -8.0)),
            Some(Point2d::new(1.0, 1.0))
        );
    }

    #[test]
    fn identity_projection() {
        let point = Point2d::new(3.0, 4.0);
        assert_eq!(IdentityProjection.project(&point), Some(point));
    }
}
