//! Orientation predicate for point triplets.

use serde::{Deserialize, Serialize};

use crate::point::Point2d;

/// Orientation of a triplet of points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Clockwise
    Clockwise,
    /// Counterclockwise
    Counterclockwise,
    /// Collinear
    Collinear,
}

impl Orientation {
    /// Determines orientation of a triplet of points.
    pub fn triplet(p: &Point2d, q: &Point2d, r: &Point2d) -> Self {
        let v = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
        if v == 0.0 {
            Self::Collinear
        } else if v > 0.0 {
            Self::Clockwise
        } else {
            Self::Counterclockwise
        }
    }
}
