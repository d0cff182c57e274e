//! Shared state of a checking run.

use geocheck_types::Crs;

/// Immutable state shared by all checks of one checking run.
///
/// Created by the orchestrator before the run and passed to checks by reference; checks never
/// mutate it.
#[derive(Debug, Clone)]
pub struct CheckContext {
    tolerance: f64,
    map_crs: Crs,
}

impl CheckContext {
    /// Creates a new context with the given tolerance (in map units) and the reference system all
    /// cross-layer comparisons happen in.
    pub fn new(tolerance: f64, map_crs: Crs) -> Self {
        Self { tolerance, map_crs }
    }

    /// Minimum distance below which two coordinates are considered coincident.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// A tighter tolerance used by checks that compare near-degenerate geometries.
    pub fn reduced_tolerance(&self) -> f64 {
        self.tolerance / 10.0
    }

    /// The reference system features are reprojected into for cross-layer comparison.
    pub fn map_crs(&self) -> &Crs {
        &self.map_crs
    }
}
