//! Open and closed polylines.

use serde::{Deserialize, Serialize};

use crate::point::Point2d;
use crate::projection::Projection;
use crate::rect::Rect;
use crate::segment::Segment;

/// A polyline, open or closed. A closed contour does not store the duplicated closing point; the
/// segment from the last point back to the first one is implied.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point2d>,
    is_closed: bool,
}

impl Contour {
    /// Creates a new contour.
    pub fn new(points: Vec<Point2d>, is_closed: bool) -> Self {
        Self { points, is_closed }
    }

    /// Creates a new open contour.
    pub fn open(points: Vec<Point2d>) -> Self {
        Self {
            points,
            is_closed: false,
        }
    }

    /// Creates a new closed contour.
    pub fn closed(points: Vec<Point2d>) -> Self {
        Self {
            points,
            is_closed: true,
        }
    }

    /// Whether the contour is closed.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Points of the contour, without the implied closing point.
    pub fn points(&self) -> &[Point2d] {
        &self.points
    }

    /// Mutable access to the points of the contour.
    pub fn points_mut(&mut self) -> &mut Vec<Point2d> {
        &mut self.points
    }

    /// Iterates over the points of the contour, repeating the first point at the end for closed
    /// contours.
    pub fn iter_points_closing(&self) -> impl Iterator<Item = &Point2d> {
        self.points
            .iter()
            .chain(self.points.first().filter(|_| self.is_closed))
    }

    /// Iterates over the segments of the contour, including the closing segment for closed
    /// contours.
    pub fn iter_segments(&self) -> impl Iterator<Item = Segment<'_>> {
        let closing = if self.is_closed && self.points.len() > 1 {
            self.points.last().zip(self.points.first())
        } else {
            None
        };
        self.points
            .windows(2)
            .map(|w| Segment(&w[0], &w[1]))
            .chain(closing.map(|(a, b)| Segment(a, b)))
    }

    /// Total length of the contour.
    pub fn length(&self) -> f64 {
        self.iter_segments().map(|s| s.length()).sum()
    }

    /// Shortest squared distance from the point to the contour, or `None` for a contour with less
    /// than two points.
    pub fn distance_to_point_sq(&self, point: &Point2d) -> Option<f64> {
        self.iter_segments()
            .map(|s| s.distance_to_point_sq(point))
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Bounding rectangle of the contour, or `None` if the contour is empty.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.points.iter())
    }

    /// Projects all the points of the contour with the given projection.
    pub fn project_points<Proj: Projection + ?Sized>(&self, projection: &Proj) -> Option<Contour> {
        let points = self
            .points
            .iter()
            .map(|p| projection.project(p))
            .collect::<Option<Vec<_>>>()?;
        Some(Contour {
            points,
            is_closed: self.is_closed,
        })
    }
}
