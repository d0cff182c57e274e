//! The geometry check framework and the concrete checks.

use ahash::{HashMap, HashMapExt};

use geocheck_types::{Geom, GeometryType, InvertedProjection, Point2d, Rect, VertexId};

use crate::changes::{Change, ChangeType, ChangeWhat, Changes};
use crate::error::GeocheckError;
use crate::feature::{AttributeValue, Feature};
use crate::feedback::Feedback;
use crate::layer_features::LayerFeatureIds;
use crate::pool::FeaturePools;

pub mod check_error;
pub mod dangle;
pub mod gap;
pub mod hole;
pub mod overlap;
pub mod self_intersection;
pub mod sliver;

pub use check_error::{CheckError, CheckErrorStatus};

/// Granularity of a check, used by orchestrators to group checks in review tools.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CheckType {
    /// The check acts on single vertices of a feature.
    FeatureNode,
    /// The check acts on whole features.
    Feature,
    /// The check acts on a layer as a whole, comparing features against each other.
    Layer,
}

/// Open key/value configuration passed to every check at construction.
///
/// Keys are check-specific; values are validated and defaulted by the concrete check, not by the
/// framework.
#[derive(Debug, Default, Clone)]
pub struct CheckConfiguration(HashMap<String, AttributeValue>);

impl CheckConfiguration {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Sets a value, consuming and returning the configuration.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// The raw value under the key.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Numeric value under the key, or `default` when the key is missing or not numeric.
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.0
            .get(key)
            .and_then(AttributeValue::as_f64)
            .unwrap_or(default)
    }
}

/// Map from source to destination attribute index used when a fix merges two features.
pub type MergeAttributeIndices = HashMap<usize, usize>;

/// A polymorphic geometry check.
///
/// Detection ([`collect_errors`](GeometryCheck::collect_errors)) is re-entrant: a check instance
/// holds no mutable state, so an orchestrator may run detection for different layer partitions in
/// parallel. Fix application is not concurrent; see the crate documentation.
pub trait GeometryCheck: Send + Sync {
    /// Stable identifier of the check.
    fn id(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Granularity of the check.
    fn check_type(&self) -> CheckType;

    /// Geometry types the check can run against.
    fn compatible_geometry_types(&self) -> &'static [GeometryType];

    /// Ordered, human-readable fix strategies. The last entry is conventionally "No change".
    fn resolution_methods(&self) -> &'static [&'static str];

    /// Detection pass: appends found defects to `errors` and informational notes to `messages`.
    ///
    /// With `ids` given, the scan is restricted to those (layer, feature) pairs; this is used for
    /// incremental re-validation after a fix. The feedback handle is polled between features.
    fn collect_errors(
        &self,
        pools: &FeaturePools,
        errors: &mut Vec<CheckError>,
        messages: &mut Vec<String>,
        feedback: &Feedback,
        ids: Option<&LayerFeatureIds>,
    );

    /// Applies the resolution method with index `method` to the error, recording all edits in
    /// `changes` and updating the error status.
    ///
    /// If the error has become obsolete (the feature was altered or deleted by a prior fix), the
    /// fix is a no-op and the error is marked obsolete. An out-of-range `method` is an error.
    fn fix_error(
        &self,
        pools: &FeaturePools,
        error: &mut CheckError,
        method: usize,
        merge_attribute_indices: &MergeAttributeIndices,
        changes: &mut Changes,
    ) -> Result<(), GeocheckError>;
}

/// Projects a point of the pool's layer into the map reference system.
pub(crate) fn to_map_point(pool: &dyn crate::pool::FeaturePool, point: &Point2d) -> Point2d {
    match pool.map_projection() {
        Some(projection) => projection.project(point).unwrap_or(*point),
        None => *point,
    }
}

/// Projects a geometry of the pool's layer into the map reference system.
pub(crate) fn to_map_geom(pool: &dyn crate::pool::FeaturePool, geom: &Geom) -> Geom {
    match pool.map_projection() {
        Some(projection) => geom.project(projection).unwrap_or_else(|| geom.clone()),
        None => geom.clone(),
    }
}

/// Projects a map-system geometry back into the pool's layer system.
pub(crate) fn to_layer_geom(pool: &dyn crate::pool::FeaturePool, geom: &Geom) -> Geom {
    match pool.map_projection() {
        Some(projection) => {
            let inverted = InvertedProjection::new(projection);
            geom.project(&inverted).unwrap_or_else(|| geom.clone())
        }
        None => geom.clone(),
    }
}

/// Converts a map-system extent into the pool's layer system for spatial queries.
pub(crate) fn map_rect_to_layer(pool: &dyn crate::pool::FeaturePool, rect: &Rect) -> Rect {
    let Some(projection) = pool.map_projection() else {
        return *rect;
    };
    let corners = [
        Point2d::new(rect.x_min, rect.y_min),
        Point2d::new(rect.x_max, rect.y_min),
        Point2d::new(rect.x_max, rect.y_max),
        Point2d::new(rect.x_min, rect.y_max),
    ];
    let unprojected: Vec<_> = corners
        .iter()
        .filter_map(|corner| projection.unproject(corner))
        .collect();
    Rect::from_points(unprojected.iter()).unwrap_or(*rect)
}

/// The id scope of a detection pass: the explicit restriction when one was given, otherwise all
/// features of all layers compatible with the check.
pub(crate) fn scope_ids(
    pools: &FeaturePools,
    ids: Option<&LayerFeatureIds>,
    types: &[GeometryType],
) -> LayerFeatureIds {
    match ids {
        Some(ids) => ids.clone(),
        None => {
            let mut result = LayerFeatureIds::new();
            for layer_id in pools.layer_ids_with_types(types) {
                if let Some(pool) = pools.get(&layer_id) {
                    result.insert(layer_id, pool.all_feature_ids().into_iter().collect());
                }
            }
            result
        }
    }
}

pub(crate) fn validate_method(
    check: &dyn GeometryCheck,
    method: usize,
) -> Result<(), GeocheckError> {
    if method >= check.resolution_methods().len() {
        return Err(GeocheckError::InvalidResolutionMethod {
            check_id: check.id().to_string(),
            method,
        });
    }
    Ok(())
}

/// Replaces one part of a feature's geometry and records the change. Single geometries are
/// replaced whole; the part index must be 0 then.
pub(crate) fn replace_feature_geometry_part(
    pools: &FeaturePools,
    layer_id: &str,
    feature: &mut Feature,
    part: usize,
    new_part: Geom,
    changes: &mut Changes,
) -> bool {
    let Some(pool) = pools.get(layer_id) else {
        return false;
    };
    let mut geometry = feature.geometry().clone();
    match &mut geometry {
        Geom::MultiPoint(_) | Geom::MultiLine(_) | Geom::MultiPolygon(_) => {
            if !geometry.remove_part(part) {
                return false;
            }
            if !geometry.add_part(new_part) {
                return false;
            }
        }
        _ => {
            if part != 0 {
                return false;
            }
            geometry = new_part;
        }
    }
    feature.set_geometry(geometry);
    if !pool.update_feature(feature.clone()) {
        return false;
    }
    changes.add(
        layer_id,
        feature.id(),
        Change::new(
            ChangeWhat::Part,
            ChangeType::Changed,
            VertexId::new(part, 0, 0),
        ),
    );
    true
}

/// Removes one part of a feature's geometry, deleting the feature when it was the last part.
pub(crate) fn delete_feature_geometry_part(
    pools: &FeaturePools,
    layer_id: &str,
    feature: &mut Feature,
    part: usize,
    changes: &mut Changes,
) -> bool {
    let Some(pool) = pools.get(layer_id) else {
        return false;
    };
    let mut geometry = feature.geometry().clone();
    if geometry.num_parts() <= 1 {
        if !pool.delete_feature(feature.id()) {
            return false;
        }
        changes.add(
            layer_id,
            feature.id(),
            Change::new(
                ChangeWhat::Feature,
                ChangeType::Removed,
                VertexId::new(0, 0, 0),
            ),
        );
        return true;
    }
    if !geometry.remove_part(part) {
        return false;
    }
    feature.set_geometry(geometry);
    if !pool.update_feature(feature.clone()) {
        return false;
    }
    changes.add(
        layer_id,
        feature.id(),
        Change::new(
            ChangeWhat::Part,
            ChangeType::Removed,
            VertexId::new(part, 0, 0),
        ),
    );
    true
}

/// Deletes a whole feature and records the change.
pub(crate) fn delete_feature(
    pools: &FeaturePools,
    layer_id: &str,
    feature: &Feature,
    changes: &mut Changes,
) -> bool {
    let Some(pool) = pools.get(layer_id) else {
        return false;
    };
    if !pool.delete_feature(feature.id()) {
        return false;
    }
    changes.add(
        layer_id,
        feature.id(),
        Change::new(
            ChangeWhat::Feature,
            ChangeType::Removed,
            VertexId::new(0, 0, 0),
        ),
    );
    true
}

/// Replaces a feature's whole geometry and records a feature-level change.
pub(crate) fn replace_feature_geometry(
    pools: &FeaturePools,
    layer_id: &str,
    feature: &mut Feature,
    new_geometry: Geom,
    changes: &mut Changes,
) -> bool {
    let Some(pool) = pools.get(layer_id) else {
        return false;
    };
    feature.set_geometry(new_geometry);
    if !pool.update_feature(feature.clone()) {
        return false;
    }
    changes.add(
        layer_id,
        feature.id(),
        Change::new(
            ChangeWhat::Feature,
            ChangeType::Changed,
            VertexId::new(0, 0, 0),
        ),
    );
    true
}
