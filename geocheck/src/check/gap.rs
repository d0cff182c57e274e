//! Check reporting gaps enclosed between polygon features.

use geo::Centroid;
use geocheck_types::{Geom, GeometryType, Point2d, Polygon, Rect};

use crate::changes::Changes;
use crate::check::{
    map_rect_to_layer, replace_feature_geometry, scope_ids, to_layer_geom, validate_method,
    CheckConfiguration, CheckError, CheckType, GeometryCheck, MergeAttributeIndices,
};
use crate::context::CheckContext;
use crate::error::GeocheckError;
use crate::feedback::Feedback;
use crate::geom_engine::GeomEngine;
use crate::layer_features::{LayerFeature, LayerFeatureIds, LayerFeatures};
use crate::pool::FeaturePools;
use crate::utils::shared_edge_length;

fn centroid(geom: &Geom) -> Option<Point2d> {
    let converted: geo_types::Geometry<f64> = geom.into();
    converted
        .centroid()
        .map(|point| Point2d::new(point.x(), point.y()))
}

/// Reports areas fully enclosed between the polygons of the checked layers without belonging to
/// any of them.
///
/// The gaps are the holes of the union of all checked polygons; each one is attributed to the
/// neighboring feature sharing the longest stretch of its boundary. With a positive
/// `gapThreshold` only gaps smaller than that area are reported.
pub struct GapCheck {
    context: CheckContext,
    gap_threshold: f64,
}

impl GapCheck {
    /// Registry id of the check.
    pub const ID: &'static str = "GapCheck";

    /// Configuration key for the area at and above which gaps are ignored.
    pub const CONFIG_GAP_THRESHOLD: &'static str = "gapThreshold";

    /// Resolution method merging the gap into the neighbor with the longest shared edge.
    pub const RESOLUTION_MERGE_LONGEST_EDGE: usize = 0;
    /// Resolution method keeping all features as they are.
    pub const RESOLUTION_NO_CHANGE: usize = 1;

    const COMPATIBLE: &'static [GeometryType] = &[GeometryType::Polygon];
    const METHODS: &'static [&'static str] = &[
        "Add gap to neighboring polygon with longest shared edge",
        "No change",
    ];

    /// Creates the check with the configured area threshold.
    pub fn new(context: &CheckContext, configuration: &CheckConfiguration) -> Self {
        Self {
            context: context.clone(),
            gap_threshold: configuration.get_f64(Self::CONFIG_GAP_THRESHOLD, 0.0),
        }
    }

    fn is_reported(&self, area: f64) -> bool {
        area > 0.0 && (self.gap_threshold <= 0.0 || area < self.gap_threshold)
    }

    /// Neighbors of the gap region across all polygon layers, with their shared boundary length.
    fn neighbors(
        &self,
        pools: &FeaturePools,
        gap: &Geom,
        extent: &Rect,
    ) -> Vec<(LayerFeature, f64)> {
        let tol = self.context.tolerance();
        let mut result = vec![];
        for layer_id in pools.layer_ids_with_types(Self::COMPATIBLE) {
            let Some(pool) = pools.get(&layer_id) else {
                continue;
            };
            let search = map_rect_to_layer(pool.as_ref(), extent);
            for id in pool.ids_in_extent(&search) {
                let Some(feature) = pool.get_feature(id) else {
                    continue;
                };
                let neighbor = LayerFeature::new(pool.as_ref(), feature, &self.context, true);
                let shared = shared_edge_length(gap, neighbor.geometry(), tol);
                if shared > 0.0 {
                    result.push((neighbor, shared));
                }
            }
        }
        result
    }

    /// Whether some polygon now covers part of the gap region.
    fn gap_is_filled(&self, pools: &FeaturePools, gap: &Geom, extent: &Rect) -> bool {
        let engine = GeomEngine::new(gap, self.context.tolerance());
        let noise = self.context.reduced_tolerance();
        for layer_id in pools.layer_ids_with_types(Self::COMPATIBLE) {
            let Some(pool) = pools.get(&layer_id) else {
                continue;
            };
            let search = map_rect_to_layer(pool.as_ref(), extent);
            for id in pool.ids_in_extent(&search) {
                let Some(feature) = pool.get_feature(id) else {
                    continue;
                };
                let neighbor = LayerFeature::new(pool.as_ref(), feature, &self.context, true);
                let covered = engine
                    .intersection(neighbor.geometry())
                    .map(|overlap| GeomEngine::new(&overlap, self.context.tolerance()).area())
                    .unwrap_or(0.0);
                if covered > noise {
                    return true;
                }
            }
        }
        false
    }
}

impl GeometryCheck for GapCheck {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Gap"
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

        // union of everything in scope; the gaps are its holes
        let mut union: Option<Geom> = None;
        while let Some(layer_feature) = features.next() {
            union = Some(match union {
                Some(current) => {
                    match GeomEngine::new(&current, tol).union_with(layer_feature.geometry()) {
                        Some(combined) => combined,
                        None => current,
                    }
                }
                None => layer_feature.geometry().clone(),
            });
        }
        if feedback.is_canceled() {
            return;
        }
        let Some(union) = union else {
            return;
        };

        for part in 0..union.num_parts() {
            for ring in 1..union.num_rings(part) {
                let Some(contour) = union.ring(part, ring) else {
                    continue;
                };
                let gap = Geom::Polygon(Polygon::new(contour.clone(), vec![]));
                let area = GeomEngine::new(&gap, tol).area();
                if !self.is_reported(area) {
                    continue;
                }
                let Some(extent) = gap.bounding_rect() else {
                    continue;
                };
                let extent = extent.buffered(tol);
                let neighbors = self.neighbors(pools, &gap, &extent);
                let Some((neighbor, _)) = neighbors.into_iter().max_by(|(_, a), (_, b)| {
                    a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                }) else {
                    continue;
                };
                let Some(location) = centroid(&gap) else {
                    continue;
                };
                errors.push(
                    CheckError::new(Self::ID, &neighbor, location)
                        .with_geometry(gap)
                        .with_value(area),
                );
            }
        }
        if features.skipped() > 0 {
            messages.push(format!(
                "Gap check: skipped {} features with incompatible geometry types",
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

        let gap = error.error_geometry().clone();
        let Some(extent) = gap.bounding_rect() else {
            error.set_obsolete("the gap region is degenerate");
            return Ok(());
        };
        let extent = extent.buffered(self.context.tolerance());
        if self.gap_is_filled(pools, &gap, &extent) {
            error.set_obsolete("the gap has been filled");
            return Ok(());
        }

        let Some(pool) = pools.get(error.layer_id()) else {
            error.set_obsolete("the layer is no longer available");
            return Ok(());
        };
        let Some(feature) = pool.get_feature(error.feature_id()) else {
            error.set_obsolete("the neighboring feature no longer exists");
            return Ok(());
        };
        let neighbor = LayerFeature::new(pool.as_ref(), feature, &self.context, true);
        if shared_edge_length(&gap, neighbor.geometry(), self.context.tolerance()) <= 0.0 {
            error.set_obsolete("the feature no longer borders the gap");
            return Ok(());
        }

        let engine = GeomEngine::new(neighbor.geometry(), self.context.tolerance());
        let Some(merged) = engine.union_with(&gap) else {
            error.set_obsolete("the gap could not be merged");
            return Ok(());
        };
        let merged = to_layer_geom(pool.as_ref(), &merged);
        let layer_id = error.layer_id().to_string();
        let mut feature = neighbor.feature().clone();
        if !replace_feature_geometry(pools, &layer_id, &mut feature, merged, changes) {
            error.set_obsolete("the neighboring feature no longer exists");
            return Ok(());
        }
        error.set_fixed(Self::METHODS[method]);
        Ok(())
    }
}
