//! Adapter around the `geo` crate's predicate and overlay algorithms.

use geo::{Area, BooleanOps, Contains, Intersects};
use geo_types::MultiPolygon;

use geocheck_types::geo_convert::{from_multi_polygon, to_multi_polygon};
use geocheck_types::{Geom, Point2d};

/// Predicate/overlay engine bound to one geometry and a snapping tolerance.
///
/// Construction converts the geometry once; all predicates and overlays reuse the converted
/// value. Overlay operations are only defined for polygonal geometries and return `None`
/// otherwise, or when the result is empty.
pub struct GeomEngine {
    geometry: Geom,
    converted: geo_types::Geometry<f64>,
    polygons: MultiPolygon<f64>,
    tolerance: f64,
}

impl GeomEngine {
    /// Creates an engine for the given geometry.
    pub fn new(geometry: &Geom, tolerance: f64) -> Self {
        Self {
            geometry: geometry.clone(),
            converted: geometry.into(),
            polygons: to_multi_polygon(geometry),
            tolerance,
        }
    }

    /// The tolerance the engine was created with.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether the two geometries have at least one common point.
    pub fn intersects(&self, other: &Geom) -> bool {
        let other: geo_types::Geometry<f64> = other.into();
        self.converted.intersects(&other)
    }

    /// Whether the point lies strictly inside the geometry.
    pub fn contains_point(&self, point: &Point2d) -> bool {
        self.converted
            .contains(&geo_types::Point::new(point.x, point.y))
    }

    /// Area of the polygonal parts of the geometry.
    pub fn area(&self) -> f64 {
        self.polygons.unsigned_area()
    }

    /// Overlay intersection with another polygonal geometry. Result parts smaller than the
    /// squared tolerance are dropped as numeric noise.
    pub fn intersection(&self, other: &Geom) -> Option<Geom> {
        let other = to_multi_polygon(other);
        let result = self.polygons.intersection(&other);
        from_multi_polygon(&self.drop_noise(result))
    }

    /// Overlay difference: this geometry minus the other one.
    pub fn difference(&self, other: &Geom) -> Option<Geom> {
        let other = to_multi_polygon(other);
        let result = self.polygons.difference(&other);
        from_multi_polygon(&self.drop_noise(result))
    }

    /// Overlay union with another polygonal geometry.
    pub fn union_with(&self, other: &Geom) -> Option<Geom> {
        let other = to_multi_polygon(other);
        let result = self.polygons.union(&other);
        from_multi_polygon(&result)
    }

    /// The geometry the engine was created for.
    pub fn geometry(&self) -> &Geom {
        &self.geometry
    }

    fn drop_noise(&self, multi: MultiPolygon<f64>) -> MultiPolygon<f64> {
        let min_area = self.tolerance * self.tolerance;
        MultiPolygon(
            multi
                .0
                .into_iter()
                .filter(|p| p.unsigned_area() >= min_area)
                .collect(),
        )
    }
}
