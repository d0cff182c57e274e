//! Point type used across the crate.

pub use nalgebra::Point2;

/// A 2d cartesian point in map units.
pub type Point2d = Point2<f64>;

/// Squared euclidian distance between two points.
pub fn distance_sq(a: &Point2d, b: &Point2d) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Euclidian distance between two points.
pub fn distance(a: &Point2d, b: &Point2d) -> f64 {
    distance_sq(a, b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        let a = Point2d::new(0.0, 0.0);
        let b = Point2d::new(3.0, 4.0);
        assert_eq!(distance_sq(&a, &b), 25.0);
        assert_eq!(distance(&a, &b), 5.0);
    }
}
