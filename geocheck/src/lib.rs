//! Topology validation and repair engine for vector layers.
//!
//! The crate scans collections of vector features across one or more layers, detects topological
//! defects (dangles, holes, self-intersections, gaps, overlaps, sliver polygons) and applies
//! user-chosen automated fixes while keeping the layers' edit state consistent.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//! use geocheck::check::GeometryCheck;
//! use geocheck::check::hole::HoleCheck;
//! use geocheck::context::CheckContext;
//! use geocheck::feedback::Feedback;
//! use geocheck::pool::{FeaturePools, MemoryFeaturePool};
//! use geocheck::registry::CheckRegistry;
//! use geocheck_types::{Contour, Crs, Geom, GeometryType, Point2d, Polygon};
//!
//! // A layer with a single polygon that has a hole in it.
//! let polygon = Polygon::new(
//!     Contour::closed(vec![
//!         Point2d::new(0.0, 0.0),
//!         Point2d::new(10.0, 0.0),
//!         Point2d::new(10.0, 10.0),
//!         Point2d::new(0.0, 10.0),
//!     ]),
//!     vec![Contour::closed(vec![
//!         Point2d::new(4.0, 4.0),
//!         Point2d::new(6.0, 4.0),
//!         Point2d::new(6.0, 6.0),
//!         Point2d::new(4.0, 6.0),
//!     ])],
//! );
//! let pool = MemoryFeaturePool::builder("parcels", GeometryType::Polygon, Crs::new("EPSG:3857"))
//!     .feature(Geom::Polygon(polygon), vec![])
//!     .build();
//! let mut pools = FeaturePools::new();
//! pools.insert("parcels".to_string(), Arc::new(pool));
//!
//! let context = CheckContext::new(0.001, Crs::new("EPSG:3857"));
//! let registry = CheckRegistry::with_builtin_checks();
//! let check = registry
//!     .create_check(HoleCheck::ID, &context, &Default::default())
//!     .expect("hole check not registered");
//!
//! let mut errors = vec![];
//! let mut messages = vec![];
//! check.collect_errors(&pools, &mut errors, &mut messages, &Feedback::new(), None);
//! assert_eq!(errors.len(), 1);
//! ```

pub mod changes;
pub mod check;
pub mod context;
pub mod error;
pub mod feature;
pub mod feedback;
pub mod geom_engine;
pub mod layer_features;
pub mod pool;
pub mod registry;
pub mod utils;

pub use error::GeocheckError;
