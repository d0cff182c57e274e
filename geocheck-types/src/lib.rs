//! Geometric value types used by the `geocheck` topology checker.
//!
//! The types in this crate are plain cartesian geometries in map units:
//! points, segments, contours (open or closed polylines), polygons and
//! axis-aligned rectangles, together with the [`Geom`](geometry::Geom) sum
//! type that addresses parts, rings and vertices uniformly. No rendering or
//! storage concerns live here.

pub mod contour;
pub mod error;
pub mod geo_convert;
pub mod geometry;
pub mod orient;
pub mod point;
pub mod polygon;
pub mod projection;
pub mod rect;
pub mod segment;

pub use contour::Contour;
pub use error::GeocheckTypesError;
pub use geometry::{Geom, GeometryType, VertexId};
pub use orient::Orientation;
pub use point::Point2d;
pub use polygon::Polygon;
pub use projection::{AffineProjection, Crs, IdentityProjection, InvertedProjection, Projection};
pub use rect::Rect;
pub use segment::Segment;
