//! Check reporting degenerate, sliver-shaped polygons.

use geocheck_types::{Geom, GeometryType, Polygon, VertexId};

use crate::changes::Changes;
use crate::check::{
    delete_feature_geometry_part, replace_feature_geometry, scope_ids, to_map_geom, to_map_point,
    validate_method, CheckConfiguration, CheckError, CheckType, GeometryCheck,
    MergeAttributeIndices,
};
use crate::context::CheckContext;
use crate::error::GeocheckError;
use crate::feature::Feature;
use crate::feedback::Feedback;
use crate::layer_features::{LayerFeatureIds, LayerFeatures};
use crate::pool::FeaturePools;
use crate::utils::shared_edge_length;

fn compactness(polygon: &Polygon) -> Option<f64> {
    let area = polygon.area();
    if area <= 0.0 {
        return None;
    }
    let perimeter = polygon.perimeter();
    Some(perimeter * perimeter / (4.0 * std::f64::consts::PI * area))
}

/// Reports polygon parts whose compactness ratio `perimeter^2 / (4 pi area)` exceeds a threshold:
/// long, thin shapes that are usually digitizing artifacts. The perimeter counts interior rings,
/// so a part riddled with thin holes is a sliver too.
///
/// With a positive `maxArea` only parts up to that area are considered; large thin polygons (a
/// river bed, a road) are legitimate.
pub struct SliverCheck {
    context: CheckContext,
    threshold: f64,
    max_area: f64,
}

impl SliverCheck {
    /// Registry id of the check.
    pub const ID: &'static str = "SliverCheck";

    /// Configuration key for the compactness ratio above which a part is a sliver.
    pub const CONFIG_THRESHOLD: &'static str = "threshold";
    /// Configuration key for the area above which parts are never reported.
    pub const CONFIG_MAX_AREA: &'static str = "maxArea";

    /// Resolution method merging the sliver into the neighbor with the longest shared edge.
    pub const RESOLUTION_MERGE_LONGEST_EDGE: usize = 0;
    /// Resolution method deleting the sliver part.
    pub const RESOLUTION_DELETE: usize = 1;
    /// Resolution method keeping the feature as is.
    pub const RESOLUTION_NO_CHANGE: usize = 2;

    const COMPATIBLE: &'static [GeometryType] = &[GeometryType::Polygon];
    const METHODS: &'static [&'static str] = &[
        "Merge with neighboring polygon with longest shared edge",
        "Delete feature",
        "No change",
    ];
    const DEFAULT_THRESHOLD: f64 = 20.0;

    /// Creates the check with the configured threshold and area limit.
    pub fn new(context: &CheckContext, configuration: &CheckConfiguration) -> Self {
        Self {
            context: context.clone(),
            threshold: configuration.get_f64(Self::CONFIG_THRESHOLD, Self::DEFAULT_THRESHOLD),
            max_area: configuration.get_f64(Self::CONFIG_MAX_AREA, 0.0),
        }
    }

    /// The compactness of the part when it qualifies as a sliver.
    fn sliver_value(&self, polygon: &Polygon) -> Option<f64> {
        if self.max_area > 0.0 && polygon.area() > self.max_area {
            return None;
        }
        compactness(polygon).filter(|value| *value > self.threshold)
    }
}

impl GeometryCheck for SliverCheck {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Sliver polygon"
    }

    fn check_type(&self) -> CheckType {
        CheckType::Feature
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
        let scope = scope_ids(pools, ids, Self::COMPATIBLE);
        let mut features = LayerFeatures::from_ids(
            pools,
            scope,
            Self::COMPATIBLE.to_vec(),
            &self.context,
            feedback,
            false,
        );
        while let Some(layer_feature) = features.next() {
            let Some(pool) = pools.get(layer_feature.layer_id()) else {
                continue;
            };
            let geometry = layer_feature.feature().geometry();
            for part in 0..geometry.num_parts() {
                let Some(Geom::Polygon(polygon)) = geometry.part(part) else {
                    continue;
                };
                let Some(value) = self.sliver_value(&polygon) else {
                    continue;
                };
                let Some(first) = polygon.outer_contour().points().first() else {
                    continue;
                };
                errors.push(
                    CheckError::new(Self::ID, &layer_feature, to_map_point(pool.as_ref(), first))
                        .with_geometry(to_map_geom(pool.as_ref(), &Geom::Polygon(polygon)))
                        .with_vidx(VertexId::new(part, 0, 0))
                        .with_value(value),
                );
            }
        }
        if features.skipped() > 0 {
            messages.push(format!(
                "Sliver polygon check: skipped {} features with incompatible geometry types",
                features.skipped()
            ));
        }
    }

    /// Applies a fix. When the merge method finds no neighbor sharing an edge with the sliver,
    /// the error is left pending so another method can be tried.
    fn fix_error(
        &self,
        pools: &FeaturePools,
        error: &mut CheckError,
        method: usize,
        merge_attribute_indices: &MergeAttributeIndices,
        changes: &mut Changes,
    ) -> Result<(), GeocheckError> {
        validate_method(self, method)?;
        if !error.is_pending() {
            return Ok(());
        }
        let Some(pool) = pools.get(error.layer_id()) else {
            error.set_obsolete("the layer is no longer available");
            return Ok(());
        };
        let Some(mut feature) = pool.get_feature(error.feature_id()) else {
            error.set_obsolete("the feature no longer exists");
            return Ok(());
        };
        let vidx = error.vidx();
        let Some(Geom::Polygon(polygon)) = feature.geometry().part(vidx.part) else {
            error.set_obsolete("the polygon part is no longer there");
            return Ok(());
        };
        if self.sliver_value(&polygon).is_none() {
            error.set_obsolete("the part is no longer a sliver");
            return Ok(());
        }
        let layer_id = error.layer_id().to_string();

        match method {
            Self::RESOLUTION_MERGE_LONGEST_EDGE => {
                let sliver = Geom::Polygon(polygon);
                let Some(extent) = sliver.bounding_rect() else {
                    error.set_obsolete("the polygon part is degenerate");
                    return Ok(());
                };
                let search = extent.buffered(self.context.tolerance());
                let mut best: Option<(Feature, f64)> = None;
                for id in pool.ids_in_extent(&search) {
                    if id == feature.id() {
                        continue;
                    }
                    let Some(neighbor) = pool.get_feature(id) else {
                        continue;
                    };
                    let shared = shared_edge_length(
                        &sliver,
                        neighbor.geometry(),
                        self.context.tolerance(),
                    );
                    if shared > 0.0 && best.as_ref().map(|(_, len)| shared > *len).unwrap_or(true) {
                        best = Some((neighbor, shared));
                    }
                }
                let Some((mut neighbor, _)) = best else {
                    return Ok(());
                };

                let engine = crate::geom_engine::GeomEngine::new(
                    neighbor.geometry(),
                    self.context.tolerance(),
                );
                let Some(merged) = engine.union_with(&sliver) else {
                    return Ok(());
                };
                for (src, dst) in merge_attribute_indices {
                    if let Some(value) = feature.attributes().get(*src) {
                        neighbor.set_attribute(*dst, value.clone());
                    }
                }
                if !replace_feature_geometry(pools, &layer_id, &mut neighbor, merged, changes)
                    || !delete_feature_geometry_part(
                        pools,
                        &layer_id,
                        &mut feature,
                        vidx.part,
                        changes,
                    )
                {
                    error.set_obsolete("the feature no longer exists");
                    return Ok(());
                }
            }
            Self::RESOLUTION_DELETE => {
                if !delete_feature_geometry_part(pools, &layer_id, &mut feature, vidx.part, changes)
                {
                    error.set_obsolete("the feature no longer exists");
                    return Ok(());
                }
            }
            _ => {}
        }
        error.set_fixed(Self::METHODS[method]);
        Ok(())
    }
}
