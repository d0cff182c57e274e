//! Polygons with holes.

use serde::{Deserialize, Serialize};

use crate::contour::Contour;
use crate::point::Point2d;
use crate::rect::Rect;

/// A polygon with an outer boundary and any number of holes.
///
/// All rings are stored as closed [`Contour`]s without the duplicated closing point. Constructors
/// normalize their inputs: open rings are closed, and a last point equal to the first one is
/// dropped.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    outer_contour: Contour,
    inner_contours: Vec<Contour>,
}

fn into_ring(contour: Contour) -> Contour {
    let mut points = contour.points().to_vec();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Contour::closed(points)
}

impl Polygon {
    /// Creates a new polygon.
    pub fn new(outer_contour: Contour, inner_contours: Vec<Contour>) -> Self {
        Self {
            outer_contour: into_ring(outer_contour),
            inner_contours: inner_contours.into_iter().map(into_ring).collect(),
        }
    }

    /// Outer boundary ring.
    pub fn outer_contour(&self) -> &Contour {
        &self.outer_contour
    }

    /// Hole rings.
    pub fn inner_contours(&self) -> &[Contour] {
        &self.inner_contours
    }

    /// All rings of the polygon, the outer one first.
    pub fn rings(&self) -> impl Iterator<Item = &Contour> {
        std::iter::once(&self.outer_contour).chain(self.inner_contours.iter())
    }

    /// Mutable access to a ring by index (0 is the outer ring).
    pub fn ring_mut(&mut self, index: usize) -> Option<&mut Contour> {
        if index == 0 {
            Some(&mut self.outer_contour)
        } else {
            self.inner_contours.get_mut(index - 1)
        }
    }

    /// Removes a hole ring. Index 0 (the outer ring) cannot be removed.
    pub fn remove_ring(&mut self, index: usize) -> Option<Contour> {
        if index == 0 || index > self.inner_contours.len() {
            return None;
        }
        Some(self.inner_contours.remove(index - 1))
    }

    /// Removes all hole rings.
    pub fn clear_inner_contours(&mut self) -> Vec<Contour> {
        std::mem::take(&mut self.inner_contours)
    }

    /// Length of the polygon boundary, holes included.
    pub fn perimeter(&self) -> f64 {
        self.rings().map(|r| r.length()).sum()
    }

    /// Signed area of a closed ring by the shoelace formula.
    fn ring_area(ring: &Contour) -> f64 {
        let points = ring.points();
        if points.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..points.len() {
            let a = &points[i];
            let b = &points[(i + 1) % points.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    /// Area of the polygon with hole areas subtracted.
    pub fn area(&self) -> f64 {
        let outer = Self::ring_area(&self.outer_contour).abs();
        let holes: f64 = self
            .inner_contours
            .iter()
            .map(|r| Self::ring_area(r).abs())
            .sum();
        (outer - holes).max(0.0)
    }

    /// Bounding rectangle of the polygon, or `None` if the polygon is empty.
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.outer_contour.bounding_rect()
    }

    /// Whether the point is inside the polygon (holes excluded), by ray casting.
    pub fn contains_point(&self, point: &Point2d) -> bool {
        fn inside_ring(ring: &Contour, point: &Point2d) -> bool {
            let points = ring.points();
            let mut inside = false;
            let mut j = points.len().wrapping_sub(1);
            for i in 0..points.len() {
                let a = &points[i];
                let b = &points[j];
                if (a.y > point.y) != (b.y > point.y)
                    && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
                {
                    inside = !inside;
                }
                j = i;
            }
            inside
        }

        if self.outer_contour.points().len() < 3 || !inside_ring(&self.outer_contour, point) {
            return false;
        }
        !self
            .inner_contours
            .iter()
            .any(|hole| inside_ring(hole, point))
    }
}

impl From<Contour> for Polygon {
    fn from(value: Contour) -> Self {
        Self::new(value, vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f64) -> Contour {
        Contour::closed(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(size, 0.0),
            Point2d::new(size, size),
            Point2d::new(0.0, size),
        ])
    }

    fn with_hole() -> Polygon {
        let hole = Contour::closed(vec![
            Point2d::new(2.0, 2.0),
            Point2d::new(4.0, 2.0),
            Point2d::new(4.0, 4.0),
            Point2d::new(2.0, 4.0),
        ]);
        Polygon::new(square(10.0), vec![hole])
    }

    #[test]
    fn ring_normalization_drops_duplicated_closing_point() {
        let ring = Contour::open(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 0.0),
            Point2d::new(1.0, 1.0),
            Point2d::new(0.0, 0.0),
        ]);
        let polygon = Polygon::new(ring, vec![]);
        assert_eq!(polygon.outer_contour().points().len(), 3);
        assert!(polygon.outer_contour().is_closed());
    }

    #[test]
    fn area_and_perimeter() {
        let polygon = with_hole();
        assert_relative_eq!(polygon.area(), 96.0);
        assert_relative_eq!(polygon.perimeter(), 48.0);
    }

    #[test]
    fn contains_point() {
        let polygon = with_hole();
        assert!(polygon.contains_point(&Point2d::new(1.0, 1.0)));
        assert!(!polygon.contains_point(&Point2d::new(3.0, 3.0)));
        assert!(!polygon.contains_point(&Point2d::new(11.0, 1.0)));
    }

    #[test]
    fn remove_rings() {
        let mut polygon = with_hole();
        assert!(polygon.remove_ring(0).is_none());
        assert!(polygon.remove_ring(1).is_some());
        assert!(polygon.inner_contours().is_empty());
    }
}
