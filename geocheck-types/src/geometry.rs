//! Geometry sum type with uniform part/ring/vertex addressing.

use serde::{Deserialize, Serialize};

use crate::contour::Contour;
use crate::point::Point2d;
use crate::polygon::Polygon;
use crate::projection::Projection;
use crate::rect::Rect;

/// Classes of vector geometries a layer can hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    /// Point and multi-point geometries.
    Point,
    /// Line and multi-line geometries.
    Line,
    /// Polygon and multi-polygon geometries.
    Polygon,
}

/// Address of a single vertex inside a geometry.
///
/// For closed rings the addressing follows the classic GIS convention of the closing vertex being
/// duplicated: a triangle ring has 4 addressable vertices, the last one equal to the first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexId {
    /// Part index within a multi-geometry; 0 for single geometries.
    pub part: usize,
    /// Ring index within the part; 0 is the outer ring of a polygon or the line itself.
    pub ring: usize,
    /// Vertex index within the ring.
    pub vertex: usize,
}

impl VertexId {
    /// Creates a new vertex address.
    pub fn new(part: usize, ring: usize, vertex: usize) -> Self {
        Self { part, ring, vertex }
    }
}

/// A 2d vector geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geom {
    /// Single point.
    Point(Point2d),
    /// Multiple points.
    MultiPoint(Vec<Point2d>),
    /// Single polyline.
    Line(Contour),
    /// Multiple polylines.
    MultiLine(Vec<Contour>),
    /// Single polygon.
    Polygon(Polygon),
    /// Multiple polygons.
    MultiPolygon(Vec<Polygon>),
}

impl Geom {
    /// The geometry class of this value.
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geom::Point(_) | Geom::MultiPoint(_) => GeometryType::Point,
            Geom::Line(_) | Geom::MultiLine(_) => GeometryType::Line,
            Geom::Polygon(_) | Geom::MultiPolygon(_) => GeometryType::Polygon,
        }
    }

    /// Whether the geometry contains no points at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Geom::Point(_) => false,
            Geom::MultiPoint(points) => points.is_empty(),
            Geom::Line(contour) => contour.points().is_empty(),
            Geom::MultiLine(contours) => contours.iter().all(|c| c.points().is_empty()),
            Geom::Polygon(polygon) => polygon.outer_contour().points().is_empty(),
            Geom::MultiPolygon(polygons) => {
                polygons.iter().all(|p| p.outer_contour().points().is_empty())
            }
        }
    }

    /// Number of parts of the geometry.
    pub fn num_parts(&self) -> usize {
        match self {
            Geom::Point(_) | Geom::Line(_) | Geom::Polygon(_) => 1,
            Geom::MultiPoint(points) => points.len(),
            Geom::MultiLine(contours) => contours.len(),
            Geom::MultiPolygon(polygons) => polygons.len(),
        }
    }

    /// The sub-geometry at the given part index, or `None` if the index is out of range.
    pub fn part(&self, index: usize) -> Option<Geom> {
        match self {
            Geom::Point(_) | Geom::Line(_) | Geom::Polygon(_) => {
                (index == 0).then(|| self.clone())
            }
            Geom::MultiPoint(points) => points.get(index).map(|p| Geom::Point(*p)),
            Geom::MultiLine(contours) => contours.get(index).map(|c| Geom::Line(c.clone())),
            Geom::MultiPolygon(polygons) => {
                polygons.get(index).map(|p| Geom::Polygon(p.clone()))
            }
        }
    }

    /// Number of rings of the given part. Lines have one ring (the line itself), points have none.
    pub fn num_rings(&self, part: usize) -> usize {
        match self {
            Geom::Point(_) | Geom::MultiPoint(_) => 0,
            Geom::Line(_) => usize::from(part == 0),
            Geom::MultiLine(contours) => usize::from(part < contours.len()),
            Geom::Polygon(polygon) => {
                if part == 0 {
                    1 + polygon.inner_contours().len()
                } else {
                    0
                }
            }
            Geom::MultiPolygon(polygons) => polygons
                .get(part)
                .map(|p| 1 + p.inner_contours().len())
                .unwrap_or(0),
        }
    }

    /// The contour making up the given ring of the given part.
    pub fn ring(&self, part: usize, ring: usize) -> Option<&Contour> {
        match self {
            Geom::Point(_) | Geom::MultiPoint(_) => None,
            Geom::Line(contour) => (part == 0 && ring == 0).then_some(contour),
            Geom::MultiLine(contours) => (ring == 0).then(|| contours.get(part)).flatten(),
            Geom::Polygon(polygon) => (part == 0).then(|| polygon.rings().nth(ring)).flatten(),
            Geom::MultiPolygon(polygons) => {
                polygons.get(part).and_then(|p| p.rings().nth(ring))
            }
        }
    }

    fn ring_mut(&mut self, part: usize, ring: usize) -> Option<&mut Contour> {
        match self {
            Geom::Point(_) | Geom::MultiPoint(_) => None,
            Geom::Line(contour) => (part == 0 && ring == 0).then_some(contour),
            Geom::MultiLine(contours) => (ring == 0).then(|| contours.get_mut(part)).flatten(),
            Geom::Polygon(polygon) => (part == 0).then(|| polygon.ring_mut(ring)).flatten(),
            Geom::MultiPolygon(polygons) => {
                polygons.get_mut(part).and_then(|p| p.ring_mut(ring))
            }
        }
    }

    /// Number of addressable vertices of the given ring, the duplicated closing vertex of closed
    /// rings included. Returns 0 for out-of-range indices.
    pub fn vertex_count(&self, part: usize, ring: usize) -> usize {
        if let (Geom::Point(_), 0, 0) = (self, part, ring) {
            return 1;
        }
        if let (Geom::MultiPoint(points), 0) = (self, ring) {
            return usize::from(part < points.len());
        }
        match self.ring(part, ring) {
            Some(contour) if contour.is_closed() && !contour.points().is_empty() => {
                contour.points().len() + 1
            }
            Some(contour) => contour.points().len(),
            None => 0,
        }
    }

    /// The vertex at the given address, or `None` if the address is out of range.
    pub fn vertex_at(&self, vidx: VertexId) -> Option<Point2d> {
        match self {
            Geom::Point(point) => {
                (vidx.part == 0 && vidx.ring == 0 && vidx.vertex == 0).then_some(*point)
            }
            Geom::MultiPoint(points) => {
                (vidx.ring == 0 && vidx.vertex == 0).then(|| points.get(vidx.part).copied())?
            }
            _ => {
                let contour = self.ring(vidx.part, vidx.ring)?;
                let stored = contour.points().len();
                if contour.is_closed() && vidx.vertex == stored && stored > 0 {
                    contour.points().first().copied()
                } else {
                    contour.points().get(vidx.vertex).copied()
                }
            }
        }
    }

    /// Moves the vertex at the given address. Returns false if the address is out of range.
    /// Moving the closing vertex of a closed ring moves its first vertex.
    pub fn move_vertex(&mut self, vidx: VertexId, new_pos: Point2d) -> bool {
        match self {
            Geom::Point(point) => {
                if vidx.part == 0 && vidx.ring == 0 && vidx.vertex == 0 {
                    *point = new_pos;
                    return true;
                }
                false
            }
            Geom::MultiPoint(points) => {
                if vidx.ring == 0 && vidx.vertex == 0 {
                    if let Some(point) = points.get_mut(vidx.part) {
                        *point = new_pos;
                        return true;
                    }
                }
                false
            }
            _ => {
                let Some(contour) = self.ring_mut(vidx.part, vidx.ring) else {
                    return false;
                };
                let stored = contour.points().len();
                let index = if contour.is_closed() && stored > 0 {
                    vidx.vertex % stored
                } else {
                    vidx.vertex
                };
                if let Some(point) = contour.points_mut().get_mut(index) {
                    *point = new_pos;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Deletes the vertex at the given address. Returns false if the address is out of range.
    /// Callers are expected to verify the ring stays valid beforehand.
    pub fn delete_vertex(&mut self, vidx: VertexId) -> bool {
        let Some(contour) = self.ring_mut(vidx.part, vidx.ring) else {
            return false;
        };
        let stored = contour.points().len();
        let index = if contour.is_closed() && stored > 0 {
            vidx.vertex % stored
        } else {
            vidx.vertex
        };
        if index >= stored {
            return false;
        }
        contour.points_mut().remove(index);
        true
    }

    /// Removes a hole ring from a polygon part. The outer ring (index 0) cannot be removed.
    pub fn remove_ring(&mut self, part: usize, ring: usize) -> bool {
        match self {
            Geom::Polygon(polygon) if part == 0 => polygon.remove_ring(ring).is_some(),
            Geom::MultiPolygon(polygons) => polygons
                .get_mut(part)
                .map(|p| p.remove_ring(ring).is_some())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Removes a whole part from a multi-geometry. Returns false for single geometries and
    /// out-of-range indices.
    pub fn remove_part(&mut self, part: usize) -> bool {
        match self {
            Geom::MultiPoint(points) if part < points.len() => {
                points.remove(part);
                true
            }
            Geom::MultiLine(contours) if part < contours.len() => {
                contours.remove(part);
                true
            }
            Geom::MultiPolygon(polygons) if part < polygons.len() => {
                polygons.remove(part);
                true
            }
            _ => false,
        }
    }

    /// Appends a part to the geometry, promoting single geometries to multi-geometries. Fails when
    /// the geometry classes do not match.
    pub fn add_part(&mut self, part: Geom) -> bool {
        match (&mut *self, part) {
            (Geom::Point(point), Geom::Point(other)) => {
                let first = *point;
                *self = Geom::MultiPoint(vec![first, other]);
                true
            }
            (Geom::MultiPoint(points), Geom::Point(other)) => {
                points.push(other);
                true
            }
            (Geom::Line(contour), Geom::Line(other)) => {
                let first = std::mem::take(contour);
                *self = Geom::MultiLine(vec![first, other]);
                true
            }
            (Geom::MultiLine(contours), Geom::Line(other)) => {
                contours.push(other);
                true
            }
            (Geom::Polygon(polygon), Geom::Polygon(other)) => {
                let first = std::mem::take(polygon);
                *self = Geom::MultiPolygon(vec![first, other]);
                true
            }
            (Geom::MultiPolygon(polygons), Geom::Polygon(other)) => {
                polygons.push(other);
                true
            }
            _ => false,
        }
    }

    /// Bounding rectangle of the geometry, or `None` for empty geometries.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Geom::Point(point) => Some(Rect::from_point(point)),
            Geom::MultiPoint(points) => Rect::from_points(points.iter()),
            Geom::Line(contour) => contour.bounding_rect(),
            Geom::MultiLine(contours) => contours
                .iter()
                .filter_map(|c| c.bounding_rect())
                .reduce(|a, b| a.merge(b)),
            Geom::Polygon(polygon) => polygon.bounding_rect(),
            Geom::MultiPolygon(polygons) => polygons
                .iter()
                .filter_map(|p| p.bounding_rect())
                .reduce(|a, b| a.merge(b)),
        }
    }

    /// Projects every point of the geometry with the given projection.
    pub fn project<Proj: Projection + ?Sized>(&self, projection: &Proj) -> Option<Geom> {
        let project_polygon = |polygon: &Polygon| -> Option<Polygon> {
            let outer = polygon.outer_contour().project_points(projection)?;
            let inner = polygon
                .inner_contours()
                .iter()
                .map(|c| c.project_points(projection))
                .collect::<Option<Vec<_>>>()?;
            Some(Polygon::new(outer, inner))
        };

        match self {
            Geom::Point(point) => Some(Geom::Point(projection.project(point)?)),
            Geom::MultiPoint(points) => Some(Geom::MultiPoint(
                points
                    .iter()
                    .map(|p| projection.project(p))
                    .collect::<Option<Vec<_>>>()?,
            )),
            Geom::Line(contour) => Some(Geom::Line(contour.project_points(projection)?)),
            Geom::MultiLine(contours) => Some(Geom::MultiLine(
                contours
                    .iter()
                    .map(|c| c.project_points(projection))
                    .collect::<Option<Vec<_>>>()?,
            )),
            Geom::Polygon(polygon) => Some(Geom::Polygon(project_polygon(polygon)?)),
            Geom::MultiPolygon(polygons) => Some(Geom::MultiPolygon(
                polygons
                    .iter()
                    .map(project_polygon)
                    .collect::<Option<Vec<_>>>()?,
            )),
        }
    }
}

impl From<Point2d> for Geom {
    fn from(value: Point2d) -> Self {
        Geom::Point(value)
    }
}

impl From<Contour> for Geom {
    fn from(value: Contour) -> Self {
        Geom::Line(value)
    }
}

impl From<Polygon> for Geom {
    fn from(value: Polygon) -> Self {
        Geom::Polygon(value)
    }
}
