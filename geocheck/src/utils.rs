//! Tolerance-aware geometric primitives shared by the checks.
//!
//! All functions here are pure over their geometry inputs. Degenerate inputs (empty geometries,
//! out-of-range part/ring indices) produce empty/degenerate results instead of errors; it is the
//! caller's job to bounds-check before requesting fixes on stale indices.

use geocheck_types::point::distance_sq;
use geocheck_types::{Contour, Geom, Point2d, Polygon, Segment, VertexId};

use crate::geom_engine::GeomEngine;

/// Whether two points are equal up to the given tolerance.
///
/// The comparison is strict: points exactly `tol` apart are not equal.
pub fn points_fuzzy_equal(p1: &Point2d, p2: &Point2d, tol: f64) -> bool {
    distance_sq(p1, p2) < tol * tol
}

/// Number of distinct points of a ring/line, excluding the duplicated closing vertex of closed
/// rings, together with whether the ring is closed.
///
/// An empty geometry reports `(0, true)`.
pub fn poly_line_size(geom: &Geom, part: usize, ring: usize) -> (usize, bool) {
    let n_verts = geom.vertex_count(part, ring);
    if geom.is_empty() || n_verts == 0 {
        return (0, true);
    }
    let front = geom.vertex_at(VertexId::new(part, ring, 0));
    let back = geom.vertex_at(VertexId::new(part, ring, n_verts - 1));
    let closed = front.is_some() && front == back && n_verts > 1;
    if closed {
        (n_verts - 1, true)
    } else {
        (n_verts, false)
    }
}

/// Whether a vertex can be removed from the ring/line without degenerating it: closed rings need
/// more than 4 vertices (closing vertex included), open lines more than 2.
pub fn can_delete_vertex(geom: &Geom, part: usize, ring: usize) -> bool {
    let n_verts = geom.vertex_count(part, ring);
    if n_verts == 0 {
        return false;
    }
    let front = geom.vertex_at(VertexId::new(part, ring, 0));
    let back = geom.vertex_at(VertexId::new(part, ring, n_verts - 1));
    let closed = front.is_some() && front == back && n_verts > 1;
    if closed {
        n_verts > 4
    } else {
        n_verts > 2
    }
}

/// Whether the point lies on the line within the tolerance.
///
/// With `exclude_extremities` set, matches at the line's own start or end vertex do not count.
pub fn point_on_line(point: &Point2d, line: &Contour, tol: f64, exclude_extremities: bool) -> bool {
    let on_line = line
        .iter_segments()
        .any(|segment| segment.distance_to_point_sq(point) < tol * tol);
    if !on_line {
        return false;
    }
    if exclude_extremities && !line.is_closed() {
        let at_start = line
            .points()
            .first()
            .map(|p| points_fuzzy_equal(point, p, tol))
            .unwrap_or(false);
        let at_end = line
            .points()
            .last()
            .map(|p| points_fuzzy_equal(point, p, tol))
            .unwrap_or(false);
        if at_start || at_end {
            return false;
        }
    }
    true
}

/// All intersection points between two lines, deduplicated within the tolerance.
pub fn line_intersections(line1: &Contour, line2: &Contour, tol: f64) -> Vec<Point2d> {
    let mut intersections: Vec<Point2d> = vec![];
    for segment1 in line1.iter_segments() {
        for segment2 in line2.iter_segments() {
            if let Some(point) = segment1.intersection(&segment2, tol) {
                if !intersections
                    .iter()
                    .any(|known| points_fuzzy_equal(known, &point, tol))
                {
                    intersections.push(point);
                }
            }
        }
    }
    intersections
}

fn all_rings(geom: &Geom) -> Vec<&Contour> {
    let mut rings = vec![];
    for part in 0..geom.num_parts() {
        for ring in 0..geom.num_rings(part) {
            if let Some(contour) = geom.ring(part, ring) {
                rings.push(contour);
            }
        }
    }
    rings
}

/// Length of the overlap of `segment`'s projection onto `onto`, when the two segments are
/// parallel and within `tol` of each other.
fn shared_segment_length(onto: &Segment, segment: &Segment, tol: f64) -> f64 {
    let d1 = onto.1 - onto.0;
    let len1 = d1.norm();
    if len1 == 0.0 {
        return 0.0;
    }
    let dir = d1 / len1;

    // both endpoints must lie within the tolerance band around `onto`'s carrier line
    for endpoint in [segment.0, segment.1] {
        let dp = endpoint - onto.0;
        let off_line = (dp.x * dir.y - dp.y * dir.x).abs();
        if off_line >= tol {
            return 0.0;
        }
    }

    let t1 = ((segment.0 - onto.0).dot(&dir)).clamp(0.0, len1);
    let t2 = ((segment.1 - onto.0).dot(&dir)).clamp(0.0, len1);
    (t2 - t1).abs()
}

/// Total length of boundary segments the two geometries share within the tolerance.
pub fn shared_edge_length(geom1: &Geom, geom2: &Geom, tol: f64) -> f64 {
    let mut length = 0.0;
    for ring1 in all_rings(geom1) {
        for ring2 in all_rings(geom2) {
            for segment1 in ring1.iter_segments() {
                for segment2 in ring2.iter_segments() {
                    length += shared_segment_length(&segment1, &segment2, tol);
                }
            }
        }
    }
    length
}

/// The sub-geometry at the given part index, or `None` if the index is out of range.
pub fn get_geom_part(geom: &Geom, part: usize) -> Option<Geom> {
    geom.part(part)
}

/// Rings of a polygon: the exterior ring first, then all hole rings.
pub fn polygon_rings(polygon: &Polygon) -> Vec<&Contour> {
    polygon.rings().collect()
}

/// Constructs a geometry engine bound to the geometry and a snapping tolerance.
pub fn create_geom_engine(geom: &Geom, tolerance: f64) -> GeomEngine {
    GeomEngine::new(geom, tolerance)
}
