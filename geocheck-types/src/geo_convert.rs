//! Conversions between the crate's geometry types and the `geo-types` crate, which is what the
//! overlay/predicate algorithms of the `geo` crate operate on.

use geo_types::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon};

use crate::contour::Contour;
use crate::error::GeocheckTypesError;
use crate::geometry::Geom;
use crate::point::Point2d;
use crate::polygon::Polygon;

fn coord(point: &Point2d) -> Coord<f64> {
    Coord {
        x: point.x,
        y: point.y,
    }
}

fn point2d(coord: &Coord<f64>) -> Point2d {
    Point2d::new(coord.x, coord.y)
}

impl From<&Contour> for LineString<f64> {
    fn from(value: &Contour) -> Self {
        let mut coords: Vec<_> = value.points().iter().map(coord).collect();
        if value.is_closed() {
            if let Some(first) = coords.first().copied() {
                coords.push(first);
            }
        }
        LineString(coords)
    }
}

impl From<&LineString<f64>> for Contour {
    fn from(value: &LineString<f64>) -> Self {
        let closed = value.is_closed() && value.0.len() > 1;
        let mut points: Vec<_> = value.0.iter().map(point2d).collect();
        if closed {
            points.pop();
        }
        Contour::new(points, closed)
    }
}

impl From<&Polygon> for geo_types::Polygon<f64> {
    fn from(value: &Polygon) -> Self {
        geo_types::Polygon::new(
            value.outer_contour().into(),
            value.inner_contours().iter().map(Into::into).collect(),
        )
    }
}

impl From<&geo_types::Polygon<f64>> for Polygon {
    fn from(value: &geo_types::Polygon<f64>) -> Self {
        let mut outer: Contour = value.exterior().into();
        outer = Contour::closed(outer.points().to_vec());
        let inner = value
            .interiors()
            .iter()
            .map(|ring| {
                let contour: Contour = ring.into();
                Contour::closed(contour.points().to_vec())
            })
            .collect();
        Polygon::new(outer, inner)
    }
}

impl From<&Geom> for geo_types::Geometry<f64> {
    fn from(value: &Geom) -> Self {
        match value {
            Geom::Point(point) => geo_types::Geometry::Point(geo_types::Point(coord(point))),
            Geom::MultiPoint(points) => geo_types::Geometry::MultiPoint(MultiPoint(
                points.iter().map(|p| geo_types::Point(coord(p))).collect(),
            )),
            Geom::Line(contour) => geo_types::Geometry::LineString(contour.into()),
            Geom::MultiLine(contours) => geo_types::Geometry::MultiLineString(MultiLineString(
                contours.iter().map(Into::into).collect(),
            )),
            Geom::Polygon(polygon) => geo_types::Geometry::Polygon(polygon.into()),
            Geom::MultiPolygon(polygons) => geo_types::Geometry::MultiPolygon(MultiPolygon(
                polygons.iter().map(Into::into).collect(),
            )),
        }
    }
}

impl TryFrom<&geo_types::Geometry<f64>> for Geom {
    type Error = GeocheckTypesError;

    fn try_from(value: &geo_types::Geometry<f64>) -> Result<Self, Self::Error> {
        match value {
            geo_types::Geometry::Point(point) => Ok(Geom::Point(point2d(&point.0))),
            geo_types::Geometry::MultiPoint(points) => Ok(Geom::MultiPoint(
                points.iter().map(|p| point2d(&p.0)).collect(),
            )),
            geo_types::Geometry::LineString(line) => Ok(Geom::Line(line.into())),
            geo_types::Geometry::MultiLineString(lines) => {
                Ok(Geom::MultiLine(lines.iter().map(Into::into).collect()))
            }
            geo_types::Geometry::Polygon(polygon) => Ok(Geom::Polygon(polygon.into())),
            geo_types::Geometry::MultiPolygon(polygons) => {
                Ok(Geom::MultiPolygon(polygons.iter().map(Into::into).collect()))
            }
            other => Err(GeocheckTypesError::Conversion(format!(
                "unsupported geometry variant: {other:?}"
            ))),
        }
    }
}

/// Collects all polygon parts of the geometry into a `geo-types` multi-polygon. Non-polygon
/// geometries produce an empty multi-polygon.
pub fn to_multi_polygon(geom: &Geom) -> MultiPolygon<f64> {
    match geom {
        Geom::Polygon(polygon) => MultiPolygon(vec![polygon.into()]),
        Geom::MultiPolygon(polygons) => MultiPolygon(polygons.iter().map(Into::into).collect()),
        _ => MultiPolygon(vec![]),
    }
}

/// Converts an overlay result back into a [`Geom`], using the single-polygon variant when the
/// multi-polygon has exactly one part. Returns `None` for an empty result.
pub fn from_multi_polygon(multi: &MultiPolygon<f64>) -> Option<Geom> {
    match multi.0.len() {
        0 => None,
        1 => Some(Geom::Polygon((&multi.0[0]).into())),
        _ => Some(Geom::MultiPolygon(multi.0.iter().map(Into::into).collect())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(
            Contour::closed(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(2.0, 0.0),
                Point2d::new(2.0, 2.0),
                Point2d::new(0.0, 2.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn closed_contour_round_trip() {
        let contour = square().outer_contour().clone();
        let line_string: LineString<f64> = (&contour).into();
        // geo-types closed rings carry the duplicated closing coordinate
        assert_eq!(line_string.0.len(), 5);
        assert_eq!(line_string.0.first(), line_string.0.last());

        let back: Contour = (&line_string).into();
        assert_eq!(back, contour);
    }

    #[test]
    fn polygon_round_trip() {
        let polygon = square();
        let converted: geo_types::Polygon<f64> = (&polygon).into();
        let back: Polygon = (&converted).into();
        assert_eq!(back, polygon);
    }

    #[test]
    fn geometry_try_from() {
        let geom = Geom::Polygon(square());
        let converted: geo_types::Geometry<f64> = (&geom).into();
        assert_eq!(Geom::try_from(&converted).expect("conversion failed"), geom);

        let rect = geo_types::Geometry::Rect(geo_types::Rect::new(
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
        ));
        assert!(Geom::try_from(&rect).is_err());
    }

    #[test]
    fn multi_polygon_helpers() {
        let geom = Geom::Polygon(square());
        let multi = to_multi_polygon(&geom);
        assert_eq!(multi.0.len(), 1);
        assert_eq!(from_multi_polygon(&multi), Some(geom));

        assert!(from_multi_polygon(&MultiPolygon(vec![])).is_none());
        assert!(to_multi_polygon(&Geom::Point(Point2d::new(0.0, 0.0)))
            .0
            .is_empty());
    }
}
