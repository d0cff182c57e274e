//! Check reporting pairwise overlaps between polygon features.

use geo::Centroid;
use geocheck_types::{Geom, GeometryType, Point2d};

use crate::changes::Changes;
use crate::check::{
    map_rect_to_layer, replace_feature_geometry, scope_ids, to_layer_geom, validate_method,
    CheckConfiguration, CheckError, CheckType, GeometryCheck, MergeAttributeIndices,
};
use crate::check::delete_feature;
use crate::context::CheckContext;
use crate::error::GeocheckError;
use crate::feedback::Feedback;
use crate::geom_engine::GeomEngine;
use crate::layer_features::{LayerFeature, LayerFeatureIds, LayerFeatures};
use crate::pool::FeaturePools;

fn centroid(geom: &Geom) -> Option<Point2d> {
    let converted: geo_types::Geometry<f64> = geom.into();
    converted
        .centroid()
        .map(|point| Point2d::new(point.x(), point.y()))
}

/// Reports regions where two polygon features overlap, comparing features across all polygon
/// layers in the map reference system.
///
/// With a positive `maxOverlapArea` only overlaps smaller than that area (in map units) are
/// reported; those are the unintentional slivers, while larger overlaps are assumed deliberate.
/// With the default of 0 every overlap is an error.
pub struct OverlapCheck {
    context: CheckContext,
    max_overlap_area: f64,
}

impl OverlapCheck {
    /// Registry id of the check.
    pub const ID: &'static str = "OverlapCheck";

    /// Configuration key for the area above which overlaps are ignored.
    pub const CONFIG_MAX_OVERLAP_AREA: &'static str = "maxOverlapArea";

    /// Resolution method removing the overlap region from the reported feature.
    pub const RESOLUTION_SUBTRACT: usize = 0;
    /// Resolution method keeping both features as they are.
    pub const RESOLUTION_NO_CHANGE: usize = 1;

    const COMPATIBLE: &'static [GeometryType] = &[GeometryType::Polygon];
    const METHODS: &'static [&'static str] = &["Subtract overlap from feature", "No change"];

    /// Creates the check with the configured area limit.
    pub fn new(context: &CheckContext, configuration: &CheckConfiguration) -> Self {
        Self {
            context: context.clone(),
            max_overlap_area: configuration.get_f64(Self::CONFIG_MAX_OVERLAP_AREA, 0.0),
        }
    }

    fn is_reported(&self, area: f64) -> bool {
        area > 0.0 && (self.max_overlap_area <= 0.0 || area < self.max_overlap_area)
    }

    /// The other feature of the pair, with its geometry in the map system.
    fn other_feature(
        &self,
        pools: &FeaturePools,
        layer_id: &str,
        id: crate::feature::FeatureId,
    ) -> Option<LayerFeature> {
        let pool = pools.get(layer_id)?;
        let feature = pool.get_feature(id)?;
        Some(LayerFeature::new(pool.as_ref(), feature, &self.context, true))
    }
}

impl GeometryCheck for OverlapCheck {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Overlap"
    }

    fn check_type(&self) -> CheckType {
        CheckType::Layer
    }

    fn compatible_geometry_types(&self) -> &'static [GeometryType] {
        Self::COMPATIBLE
    }

    fn resolution_methods(&self) -> &'static [&'static str] {
        Self::METHODS
    }

    fn collect_errors(
        &self,
        pools: &FeaturePools,
        errors: &mut Vec<CheckError>,
        messages: &mut Vec<String>,
        feedback: &Feedback,
        ids: Option<&LayerFeatureIds>,
    ) {
        let tol = self.context.tolerance();
        let scope = scope_ids(pools, ids, Self::COMPATIBLE);
        let mut features = LayerFeatures::from_ids(
            pools,
            scope,
            Self::COMPATIBLE.to_vec(),
            &self.context,
            feedback,
            true,
        );
        while let Some(layer_feature) = features.next() {
            let Some(extent) = layer_feature.geometry().bounding_rect() else {
                continue;
            };
            let extent = extent.buffered(tol);
            let engine = GeomEngine::new(layer_feature.geometry(), tol);

            for other_layer_id in pools.layer_ids_with_types(Self::COMPATIBLE) {
                let Some(other_pool) = pools.get(&other_layer_id) else {
                    continue;
                };
                let search = map_rect_to_layer(other_pool.as_ref(), &extent);
                for other_id in other_pool.ids_in_extent(&search) {
                    // each pair is looked at once, from its smaller member
                    if (other_layer_id.as_str(), other_id)
                        <= (layer_feature.layer_id(), layer_feature.feature().id())
                    {
                        continue;
                    }
                    let Some(other) = self.other_feature(pools, &other_layer_id, other_id) else {
                        continue;
                    };
                    if !engine.intersects(other.geometry()) {
                        continue;
                    }
                    let Some(overlap) = engine.intersection(other.geometry()) else {
                        continue;
                    };
                    for part in 0..overlap.num_parts() {
                        let Some(region) = overlap.part(part) else {
                            continue;
                        };
                        let area = GeomEngine::new(&region, tol).area();
                        if !self.is_reported(area) {
                            continue;
                        }
                        let Some(location) = centroid(&region) else {
                            continue;
                        };
                        errors.push(
                            CheckError::new(Self::ID, &layer_feature, location)
                                .with_geometry(region)
                                .with_value(area)
                                .with_other_feature(other_layer_id.clone(), other_id),
                        );
                    }
                }
            }
        }
        if features.skipped() > 0 {
            messages.push(format!(
                "Overlap check: skipped {} features with incompatible geometry types",
                features.skipped()
            ));
        }
    }

    fn fix_error(
        &self,
        pools: &FeaturePools,
        error: &mut CheckError,
        method: usize,
        _merge_attribute_indices: &MergeAttributeIndices,
        changes: &mut Changes,
    ) -> Result<(), GeocheckError> {
        validate_method(self, method)?;
        if !error.is_pending() {
            return Ok(());
        }
        if method == Self::RESOLUTION_NO_CHANGE {
            error.set_fixed(Self::METHODS[method]);
            return Ok(());
        }

        let Some(pool) = pools.get(error.layer_id()) else {
            error.set_obsolete("the layer is no longer available");
            return Ok(());
        };
        let Some(feature) = pool.get_feature(error.feature_id()) else {
            error.set_obsolete("the feature no longer exists");
            return Ok(());
        };
        let Some((other_layer_id, other_id)) = error.other_feature() else {
            error.set_obsolete("the neighboring feature is not known");
            return Ok(());
        };
        let other_layer_id = other_layer_id.to_string();
        let Some(other) = self.other_feature(pools, &other_layer_id, other_id) else {
            error.set_obsolete("the neighboring feature no longer exists");
            return Ok(());
        };

        let layer_feature = LayerFeature::new(pool.as_ref(), feature, &self.context, true);
        let engine = GeomEngine::new(layer_feature.geometry(), self.context.tolerance());
        let overlap_area = error.value().unwrap_or(0.0);

        // the overlap must still be there, with the area recorded at detection time
        let still_matches = engine
            .intersection(other.geometry())
            .map(|overlap| {
                (0..overlap.num_parts()).any(|part| {
                    overlap
                        .part(part)
                        .map(|region| {
                            let area = GeomEngine::new(&region, self.context.tolerance()).area();
                            (area - overlap_area).abs() < self.context.reduced_tolerance()
                        })
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);
        if !still_matches {
            error.set_obsolete("the features no longer overlap this way");
            return Ok(());
        }

        let layer_id = error.layer_id().to_string();
        let mut feature = layer_feature.feature().clone();
        match engine.difference(other.geometry()) {
            Some(remainder) => {
                let remainder = to_layer_geom(pool.as_ref(), &remainder);
                if !replace_feature_geometry(pools, &layer_id, &mut feature, remainder, changes) {
                    error.set_obsolete("the feature no longer exists");
                    return Ok(());
                }
            }
            None => {
                // the feature is entirely inside the other one
                if !delete_feature(pools, &layer_id, &feature, changes) {
                    error.set_obsolete("the feature no longer exists");
                    return Ok(());
                }
            }
        }
        error.set_fixed(Self::METHODS[method]);
        Ok(())
    }
}
