//! Strait line segments and segment/segment predicates.

use crate::orient::Orientation;
use crate::point::{distance_sq, Point2d};

/// A strait line segment between two points.
#[derive(Debug, PartialEq)]
pub struct Segment<'a>(pub &'a Point2d, pub &'a Point2d);

impl Segment<'_> {
    /// Length of the segment.
    pub fn length(&self) -> f64 {
        distance_sq(self.0, self.1).sqrt()
    }

    /// Shortest euclidian distance (squared) between a point and the segment:
    ///
    /// * if the normal from the point to the segment ends inside the segment, the returned value is the squared length
    ///   of the normal
    /// * if the normal from the point to the segment ends outside of the segment, the returned value is the smaller one
    ///   of the distances between the point and the segment's endpoints
    pub fn distance_to_point_sq(&self, point: &Point2d) -> f64 {
        if self.0 == self.1 {
            return distance_sq(self.0, point);
        }

        let ds = self.1 - self.0;
        let dp = point - self.0;
        let ds_len = ds.x * ds.x + ds.y * ds.y;

        let r = (dp.x * ds.x + dp.y * ds.y) / ds_len;
        if r <= 0.0 {
            distance_sq(self.0, point)
        } else if r >= 1.0 {
            distance_sq(self.1, point)
        } else {
            let s = (dp.y * ds.x - dp.x * ds.y) / ds_len;
            (s * s) * ds_len
        }
    }

    /// Returns true, if the segment has at least one common point with the `other` segment.
    pub fn intersects(&self, other: &Segment) -> bool {
        fn on_segment(p: &Point2d, q: &Point2d, r: &Point2d) -> bool {
            let x_max = if p.x >= r.x { p.x } else { r.x };
            let x_min = if p.x <= r.x { p.x } else { r.x };
            let y_max = if p.y >= r.y { p.y } else { r.y };
            let y_min = if p.y <= r.y { p.y } else { r.y };

            q.x <= x_max && q.x >= x_min && q.y <= y_max && q.y >= y_min
        }

        let o1 = Orientation::triplet(self.0, other.0, self.1);
        let o2 = Orientation::triplet(self.0, other.1, self.1);
        let o3 = Orientation::triplet(other.0, self.0, other.1);
        let o4 = Orientation::triplet(other.0, self.1, other.1);

        if o1 != o2 && o3 != o4 {
            return true;
        }

        if o1 == Orientation::Collinear && on_segment(self.0, other.0, self.1) {
            return true;
        }
        if o2 == Orientation::Collinear && on_segment(self.0, other.1, self.1) {
            return true;
        }
        if o3 == Orientation::Collinear && on_segment(other.0, self.0, other.1) {
            return true;
        }
        if o4 == Orientation::Collinear && on_segment(other.0, self.1, other.1) {
            return true;
        }

        false
    }

    /// Intersection point of two segments, if there is exactly one.
    ///
    /// Segment endpoints are extended by `tolerance` along the segment direction, so segments that
    /// miss each other by less than the tolerance still report an intersection. Parallel and
    /// collinear pairs return `None` even when they overlap, as there is no single intersection
    /// point to report.
    pub fn intersection(&self, other: &Segment, tolerance: f64) -> Option<Point2d> {
        let d1 = self.1 - self.0;
        let d2 = other.1 - other.0;

        let denom = d1.x * d2.y - d1.y * d2.x;
        if denom == 0.0 {
            return None;
        }

        let dp = other.0 - self.0;
        let t = (dp.x * d2.y - dp.y * d2.x) / denom;
        let u = (dp.x * d1.y - dp.y * d1.x) / denom;

        let len1 = d1.norm();
        let len2 = d2.norm();
        if len1 == 0.0 || len2 == 0.0 {
            return None;
        }

        let eps1 = tolerance / len1;
        let eps2 = tolerance / len2;
        if t < -eps1 || t > 1.0 + eps1 || u < -eps2 || u > 1.0 + eps2 {
            return None;
        }

        Some(Point2d::new(self.0.x + t * d1.x, self.0.y + t * d1.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_to_point() {
        let a = Point2d::new(0.0, 0.0);
        let b = Point2d::new(10.0, 0.0);
        let segment = Segment(&a, &b);

        assert_relative_eq!(segment.distance_to_point_sq(&Point2d::new(5.0, 3.0)), 9.0);
        assert_relative_eq!(segment.distance_to_point_sq(&Point2d::new(-3.0, 4.0)), 25.0);
        assert_relative_eq!(segment.distance_to_point_sq(&Point2d::new(13.0, -4.0)), 25.0);
    }

    #[test]
    fn crossing_segments_intersect() {
        let a = Point2d::new(0.0, -1.0);
        let b = Point2d::new(0.0, 1.0);
        let c = Point2d::new(-1.0, 0.0);
        let d = Point2d::new(1.0, 0.0);

        assert!(Segment(&a, &b).intersects(&Segment(&c, &d)));
        let point = Segment(&a, &b)
            .intersection(&Segment(&c, &d), 0.0)
            .expect("no intersection found");
        assert_relative_eq!(point.x, 0.0);
        assert_relative_eq!(point.y, 0.0);
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        let a = Point2d::new(0.0, 1.0);
        let b = Point2d::new(1.0, 1.0);
        let c = Point2d::new(0.0, 0.0);
        let d = Point2d::new(1.0, 0.0);

        assert!(!Segment(&a, &b).intersects(&Segment(&c, &d)));
        assert_eq!(Segment(&a, &b).intersection(&Segment(&c, &d), 0.0), None);
    }

    #[test]
    fn near_miss_within_tolerance() {
        let a = Point2d::new(0.0, 0.0);
        let b = Point2d::new(10.0, 0.0);
        let c = Point2d::new(5.0, 0.001);
        let d = Point2d::new(5.0, 5.0);

        assert_eq!(Segment(&a, &b).intersection(&Segment(&c, &d), 0.0), None);
        assert!(Segment(&a, &b)
            .intersection(&Segment(&c, &d), 0.01)
            .is_some());
    }
}
