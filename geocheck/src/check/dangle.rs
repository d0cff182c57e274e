//! Check reporting line endpoints not connected to any other line.

use geocheck_types::{GeometryType, Rect, VertexId};

use crate::changes::Changes;
use crate::check::{
    scope_ids, to_map_point, validate_method, CheckConfiguration, CheckError, CheckType,
    GeometryCheck, MergeAttributeIndices,
};
use crate::context::CheckContext;
use crate::error::GeocheckError;
use crate::feedback::Feedback;
use crate::layer_features::{LayerFeatureIds, LayerFeatures};
use crate::pool::FeaturePools;
use crate::utils::{point_on_line, points_fuzzy_equal};

/// Reports endpoints of line features that are not coincident, within the tolerance, with any
/// endpoint or interior point of another line of the same layer.
pub struct DangleCheck {
    context: CheckContext,
}

impl DangleCheck {
    /// Registry id of the check.
    pub const ID: &'static str = "DangleCheck";

    /// Resolution method keeping the feature as is.
    pub const RESOLUTION_NO_CHANGE: usize = 0;

    const COMPATIBLE: &'static [GeometryType] = &[GeometryType::Line];
    const METHODS: &'static [&'static str] = &["No change"];

    /// Creates the check. The check has no configuration keys.
    pub fn new(context: &CheckContext, _configuration: &CheckConfiguration) -> Self {
        Self {
            context: context.clone(),
        }
    }
}

impl GeometryCheck for DangleCheck {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Dangle"
    }

    fn check_type(&self) -> CheckType {
        CheckType::FeatureNode
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
            false,
        );
        while let Some(layer_feature) = features.next() {
            let Some(pool) = pools.get(layer_feature.layer_id()) else {
                continue;
            };
            let feature_id = layer_feature.feature().id();
            let geometry = layer_feature.feature().geometry();
            for part in 0..geometry.num_parts() {
                let Some(line) = geometry.ring(part, 0) else {
                    continue;
                };
                let points = line.points();
                if line.is_closed() || points.len() < 2 {
                    continue;
                }
                let endpoints = [(0, points[0]), (points.len() - 1, points[points.len() - 1])];
                for (vertex, point) in endpoints {
                    let search = Rect::from_point(&point).buffered(tol);
                    let connected = pool.ids_in_extent(&search).into_iter().any(|candidate_id| {
                        let Some(candidate) = pool.get_feature(candidate_id) else {
                            return false;
                        };
                        let candidate_geom = candidate.geometry();
                        (0..candidate_geom.num_parts()).any(|candidate_part| {
                            let Some(candidate_line) = candidate_geom.ring(candidate_part, 0)
                            else {
                                return false;
                            };
                            let own_line = candidate_id == feature_id && candidate_part == part;
                            point_on_line(&point, candidate_line, tol, own_line)
                        })
                    });
                    if !connected {
                        errors.push(
                            CheckError::new(
                                Self::ID,
                                &layer_feature,
                                to_map_point(pool.as_ref(), &point),
                            )
                            .with_vidx(VertexId::new(part, 0, vertex)),
                        );
                    }
                }
            }
        }
        if features.skipped() > 0 {
            messages.push(format!(
                "Dangle check: skipped {} features with incompatible geometry types",
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
        _changes: &mut Changes,
    ) -> Result<(), GeocheckError> {
        validate_method(self, method)?;
        if !error.is_pending() {
            return Ok(());
        }
        let feature = pools
            .get(error.layer_id())
            .and_then(|pool| pool.get_feature(error.feature_id()));
        let Some(feature) = feature else {
            error.set_obsolete("the feature no longer exists");
            return Ok(());
        };
        let Some(pool) = pools.get(error.layer_id()) else {
            error.set_obsolete("the layer is no longer available");
            return Ok(());
        };
        let still_there = feature
            .geometry()
            .vertex_at(error.vidx())
            .map(|vertex| {
                let vertex = to_map_point(pool.as_ref(), &vertex);
                points_fuzzy_equal(&vertex, &error.location(), self.context.tolerance())
            })
            .unwrap_or(false);
        if !still_there {
            error.set_obsolete("the dangling endpoint is no longer there");
            return Ok(());
        }
        error.set_fixed(Self::METHODS[method]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use geocheck_types::{Contour, Crs, Geom, Point2d};
    use crate::check::CheckErrorStatus;
    use crate::feature::FeatureId;
    use crate::pool::MemoryFeaturePool;

    fn line(points: Vec<Point2d>) -> Geom {
        Geom::Line(Contour::open(points))
    }

    fn setup(features: Vec<Geom>) -> (FeaturePools, CheckContext) {
        let mut builder =
            MemoryFeaturePool::builder("roads", GeometryType::Line, Crs::new("EPSG:3857"));
        for geometry in features {
            builder = builder.feature(geometry, vec![]);
        }
        let mut pools = FeaturePools::new();
        pools.insert("roads".to_string(), Arc::new(builder.build()));
        (pools, CheckContext::new(0.001, Crs::new("EPSG:3857")))
    }

    fn collect(pools: &FeaturePools, context: &CheckContext) -> Vec<CheckError> {
        let check = DangleCheck::new(context, &CheckConfiguration::new());
        let mut errors = vec![];
        let mut messages = vec![];
        check.collect_errors(pools, &mut errors, &mut messages, &Feedback::new(), None);
        errors
    }

    #[test]
    fn connected_endpoints_are_not_dangles() {
        let (pools, context) = setup(vec![
            line(vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0)]),
            line(vec![Point2d::new(10.0, 0.0), Point2d::new(10.0, 10.0)]),
        ]);
        let errors = collect(&pools, &context);
        // only the two free ends dangle
        assert_eq!(errors.len(), 2);
        let locations: Vec<_> = errors.iter().map(|e| e.location()).collect();
        assert!(locations.contains(&Point2d::new(0.0, 0.0)));
        assert!(locations.contains(&Point2d::new(10.0, 10.0)));
    }

    #[test]
    fn endpoint_on_interior_counts_as_connected() {
        let (pools, context) = setup(vec![
            line(vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0)]),
            // T-junction: ends on the interior of the first line
            line(vec![Point2d::new(5.0, 5.0), Point2d::new(5.0, 0.0)]),
        ]);
        let errors = collect(&pools, &context);
        let dangling: Vec<_> = errors
            .iter()
            .map(|e| (e.feature_id(), e.vidx().vertex))
            .collect();
        assert!(!dangling.contains(&(FeatureId(2), 1)));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn tolerance_bridges_small_gaps() {
        let (pools, context) = setup(vec![
            line(vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0)]),
            line(vec![Point2d::new(10.0005, 0.0), Point2d::new(20.0, 0.0)]),
        ]);
        let errors = collect(&pools, &context);
        // the 0.0005 gap is below the 0.001 tolerance
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn no_change_fix_validates_the_endpoint() {
        let (pools, context) = setup(vec![line(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
        ])]);
        let mut errors = collect(&pools, &context);
        assert_eq!(errors.len(), 2);

        let check = DangleCheck::new(&context, &CheckConfiguration::new());
        let mut changes = Changes::new();
        check
            .fix_error(
                &pools,
                &mut errors[0],
                DangleCheck::RESOLUTION_NO_CHANGE,
                &Default::default(),
                &mut changes,
            )
            .expect("fix failed");
        assert_eq!(errors[0].status(), CheckErrorStatus::Fixed);

        // move the feature before fixing the second error
        let pool = pools.get("roads").expect("missing pool");
        let mut feature = pool.get_feature(errors[1].feature_id()).expect("missing feature");
        feature.set_geometry(line(vec![
            Point2d::new(100.0, 100.0),
            Point2d::new(110.0, 100.0),
        ]));
        assert!(pool.update_feature(feature));

        check
            .fix_error(
                &pools,
                &mut errors[1],
                DangleCheck::RESOLUTION_NO_CHANGE,
                &Default::default(),
                &mut changes,
            )
            .expect("fix failed");
        assert_eq!(errors[1].status(), CheckErrorStatus::Obsolete);
    }
}
