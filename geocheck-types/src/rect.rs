//! Axis-aligned bounding rectangles.

use serde::{Deserialize, Serialize};

use crate::point::Point2d;

/// Axis-aligned rectangle in map units.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left bound.
    pub x_min: f64,
    /// Bottom bound.
    pub y_min: f64,
    /// Right bound.
    pub x_max: f64,
    /// Top bound.
    pub y_max: f64,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Zero-sized rectangle containing a single point.
    pub fn from_point(point: &Point2d) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    /// Smallest rectangle containing all the given points, or `None` for an empty input.
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point2d>) -> Option<Self> {
        let mut result: Option<Self> = None;
        for point in points {
            result = Some(match result {
                Some(rect) => rect.extend(point),
                None => Self::from_point(point),
            });
        }
        result
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point2d {
        Point2d::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Smallest rectangle containing both `self` and the given point.
    pub fn extend(&self, point: &Point2d) -> Self {
        Self {
            x_min: self.x_min.min(point.x),
            y_min: self.y_min.min(point.y),
            x_max: self.x_max.max(point.x),
            y_max: self.y_max.max(point.y),
        }
    }

    /// Smallest rectangle containing both rectangles.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Rectangle grown by `amount` in every direction.
    pub fn buffered(&self, amount: f64) -> Self {
        Self {
            x_min: self.x_min - amount,
            y_min: self.y_min - amount,
            x_max: self.x_max + amount,
            y_max: self.y_max + amount,
        }
    }

    /// Whether the two rectangles have at least one common point.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// Whether the point lies inside the rectangle or on its boundary.
    pub fn contains(&self, point: &Point2d) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points() {
        assert!(Rect::from_points([].iter()).is_none());

        let points = vec![Point2d::new(1.0, 5.0), Point2d::new(-2.0, 3.0)];
        let rect = Rect::from_points(points.iter()).expect("empty rect");
        assert_eq!(rect, Rect::new(-2.0, 3.0, 1.0, 5.0));
    }

    #[test]
    fn intersects() {
        let rect = Rect::new(0.0, 0.0, 2.0, 2.0);
        assert!(rect.intersects(&Rect::new(1.0, 1.0, 3.0, 3.0)));
        assert!(rect.intersects(&Rect::new(2.0, 2.0, 3.0, 3.0)));
        assert!(!rect.intersects(&Rect::new(2.1, 2.1, 3.0, 3.0)));
    }

    #[test]
    fn buffered() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0).buffered(0.5);
        assert_eq!(rect, Rect::new(-0.5, -0.5, 1.5, 1.5));
    }
}
