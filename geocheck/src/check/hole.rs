//! Check reporting polygons with holes.

use geocheck_types::{Geom, GeometryType, Polygon, VertexId};

use crate::changes::{Change, ChangeType, ChangeWhat, Changes};
use crate::check::{
    scope_ids, to_map_geom, to_map_point, validate_method, CheckConfiguration, CheckError,
    CheckType, GeometryCheck, MergeAttributeIndices,
};
use crate::context::CheckContext;
use crate::error::GeocheckError;
use crate::feedback::Feedback;
use crate::layer_features::{LayerFeatureIds, LayerFeatures};
use crate::pool::FeaturePools;

/// Reports every interior ring of a polygon as an error, regardless of its area.
pub struct HoleCheck {
    context: CheckContext,
}

impl HoleCheck {
    /// Registry id of the check.
    pub const ID: &'static str = "HoleCheck";

    /// Resolution method removing the part's interior rings.
    pub const RESOLUTION_REMOVE_HOLES: usize = 0;
    /// Resolution method keeping the feature as is.
    pub const RESOLUTION_NO_CHANGE: usize = 1;

    const COMPATIBLE: &'static [GeometryType] = &[GeometryType::Polygon];
    const METHODS: &'static [&'static str] = &["Remove holes", "No change"];

    /// Creates the check. The check has no configuration keys.
    pub fn new(context: &CheckContext, _configuration: &CheckConfiguration) -> Self {
        Self {
            context: context.clone(),
        }
    }
}

impl GeometryCheck for HoleCheck {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Polygon with hole"
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
                for ring in 1..geometry.num_rings(part) {
                    let Some(contour) = geometry.ring(part, ring) else {
                        continue;
                    };
                    let Some(first) = contour.points().first() else {
                        continue;
                    };
                    let hole = Geom::Polygon(Polygon::new(contour.clone(), vec![]));
                    errors.push(
                        CheckError::new(
                            Self::ID,
                            &layer_feature,
                            to_map_point(pool.as_ref(), first),
                        )
                        .with_geometry(to_map_geom(pool.as_ref(), &hole))
                        .with_vidx(VertexId::new(part, ring, 0)),
                    );
                }
            }
        }
        if features.skipped() > 0 {
            messages.push(format!(
                "Polygon with hole check: skipped {} features with incompatible geometry types",
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
        let Some(pool) = pools.get(error.layer_id()) else {
            error.set_obsolete("the layer is no longer available");
            return Ok(());
        };
        let Some(mut feature) = pool.get_feature(error.feature_id()) else {
            error.set_obsolete("the feature no longer exists");
            return Ok(());
        };
        let vidx = error.vidx();
        if feature.geometry().num_rings(vidx.part) <= vidx.ring {
            error.set_obsolete("the hole is no longer there");
            return Ok(());
        }

        if method == Self::RESOLUTION_REMOVE_HOLES {
            let mut geometry = feature.geometry().clone();
            let ring_count = geometry.num_rings(vidx.part);
            for ring in (1..ring_count).rev() {
                if geometry.remove_ring(vidx.part, ring) {
                    changes.add(
                        error.layer_id(),
                        feature.id(),
                        Change::new(
                            ChangeWhat::Ring,
                            ChangeType::Removed,
                            VertexId::new(vidx.part, ring, 0),
                        ),
                    );
                }
            }
            feature.set_geometry(geometry);
            if !pool.update_feature(feature) {
                error.set_obsolete("the feature no longer exists");
                return Ok(());
            }
        }
        error.set_fixed(Self::METHODS[method]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::check::CheckErrorStatus;
    use crate::pool::MemoryFeaturePool;
    use geocheck_types::{Contour, Crs, Point2d};

    fn hole(x0: f64) -> Contour {
        Contour::closed(vec![
            Point2d::new(x0, 1.0),
            Point2d::new(x0 + 1.0, 1.0),
            Point2d::new(x0 + 1.0, 2.0),
            Point2d::new(x0, 2.0),
        ])
    }

    fn polygon_with_holes() -> Polygon {
        Polygon::new(
            Contour::closed(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(10.0, 0.0),
                Point2d::new(10.0, 10.0),
                Point2d::new(0.0, 10.0),
            ]),
            vec![hole(1.0), hole(5.0)],
        )
    }

    fn setup() -> (FeaturePools, CheckContext) {
        let pool =
            MemoryFeaturePool::builder("parcels", GeometryType::Polygon, Crs::new("EPSG:3857"))
                .feature(Geom::Polygon(polygon_with_holes()), vec![])
                .build();
        let mut pools = FeaturePools::new();
        pools.insert("parcels".to_string(), Arc::new(pool));
        (pools, CheckContext::new(0.001, Crs::new("EPSG:3857")))
    }

    fn collect(check: &HoleCheck, pools: &FeaturePools) -> Vec<CheckError> {
        let mut errors = vec![];
        let mut messages = vec![];
        check.collect_errors(pools, &mut errors, &mut messages, &Feedback::new(), None);
        errors
    }

    #[test]
    fn detects_every_hole() {
        let (pools, context) = setup();
        let check = HoleCheck::new(&context, &CheckConfiguration::new());
        let errors = collect(&check, &pools);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].vidx().ring, 1);
        assert_eq!(errors[1].vidx().ring, 2);
    }

    #[test]
    fn remove_holes_drops_all_interior_rings() {
        let (pools, context) = setup();
        let check = HoleCheck::new(&context, &CheckConfiguration::new());
        let mut errors = collect(&check, &pools);

        let mut changes = Changes::new();
        check
            .fix_error(&pools, &mut errors[0], HoleCheck::RESOLUTION_REMOVE_HOLES, &Default::default(), &mut changes)
            .expect("fix failed");
        assert_eq!(errors[0].status(), CheckErrorStatus::Fixed);
        assert!(!changes.is_empty());

        let pool = pools.get("parcels").expect("missing pool");
        let feature = pool
            .get_feature(errors[0].feature_id())
            .expect("missing feature");
        let Geom::Polygon(polygon) = feature.geometry() else {
            panic!("unexpected geometry type");
        };
        assert!(polygon.inner_contours().is_empty());
        assert_eq!(
            polygon.outer_contour(),
            polygon_with_holes().outer_contour()
        );

        // the sibling hole error is invalidated by the recorded ring removals
        errors[1].handle_changes(&changes);
        assert_eq!(errors[1].status(), CheckErrorStatus::Obsolete);
    }

    #[test]
    fn id_restriction_limits_detection() {
        use crate::feature::FeatureId;
        use crate::layer_features::LayerFeatureIds;

        let pool =
            MemoryFeaturePool::builder("parcels", GeometryType::Polygon, Crs::new("EPSG:3857"))
                .feature(Geom::Polygon(polygon_with_holes()), vec![])
                .feature(Geom::Polygon(polygon_with_holes()), vec![])
                .build();
        let mut pools = FeaturePools::new();
        pools.insert("parcels".to_string(), Arc::new(pool));
        let context = CheckContext::new(0.001, Crs::new("EPSG:3857"));

        let mut ids = LayerFeatureIds::new();
        ids.insert("parcels", [FeatureId(2)].into_iter().collect());

        let check = HoleCheck::new(&context, &CheckConfiguration::new());
        let mut errors = vec![];
        let mut messages = vec![];
        check.collect_errors(&pools, &mut errors, &mut messages, &Feedback::new(), Some(&ids));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.feature_id() == FeatureId(2)));
    }

    #[test]
    fn no_change_fix_keeps_geometry() {
        let (pools, context) = setup();
        let check = HoleCheck::new(&context, &CheckConfiguration::new());
        let mut errors = collect(&check, &pools);

        let before = pools
            .get("parcels")
            .and_then(|pool| pool.get_feature(errors[0].feature_id()))
            .expect("missing feature");

        let mut changes = Changes::new();
        check
            .fix_error(&pools, &mut errors[0], HoleCheck::RESOLUTION_NO_CHANGE, &Default::default(), &mut changes)
            .expect("fix failed");
        assert_eq!(errors[0].status(), CheckErrorStatus::Fixed);
        assert!(changes.is_empty());

        let after = pools
            .get("parcels")
            .and_then(|pool| pool.get_feature(errors[0].feature_id()))
            .expect("missing feature");
        assert_eq!(before, after);
    }

    #[test]
    fn fix_on_deleted_feature_is_a_noop() {
        let (pools, context) = setup();
        let check = HoleCheck::new(&context, &CheckConfiguration::new());
        let mut errors = collect(&check, &pools);

        let pool = pools.get("parcels").expect("missing pool");
        assert!(pool.delete_feature(errors[0].feature_id()));

        let mut changes = Changes::new();
        check
            .fix_error(&pools, &mut errors[0], HoleCheck::RESOLUTION_REMOVE_HOLES, &Default::default(), &mut changes)
            .expect("fix failed");
        assert_eq!(errors[0].status(), CheckErrorStatus::Obsolete);
        assert!(changes.is_empty());
    }

    #[test]
    fn invalid_method_is_rejected() {
        let (pools, context) = setup();
        let check = HoleCheck::new(&context, &CheckConfiguration::new());
        let mut errors = collect(&check, &pools);

        let mut changes = Changes::new();
        let result = check.fix_error(&pools, &mut errors[0], 7, &Default::default(), &mut changes);
        assert!(matches!(
            result,
            Err(GeocheckError::InvalidResolutionMethod { method: 7, .. })
        ));
    }
}
