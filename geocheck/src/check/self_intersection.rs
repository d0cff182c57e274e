//! Check reporting rings and lines that cross themselves.

use geocheck_types::{Contour, Geom, GeometryType, Point2d, Polygon, Segment, VertexId};

use crate::changes::{Change, ChangeType, ChangeWhat, Changes};
use crate::check::{
    replace_feature_geometry, replace_feature_geometry_part, scope_ids, to_map_point,
    validate_method, CheckConfiguration, CheckError, CheckType, GeometryCheck,
    MergeAttributeIndices,
};
use crate::context::CheckContext;
use crate::error::GeocheckError;
use crate::feedback::Feedback;
use crate::layer_features::{LayerFeatureIds, LayerFeatures};
use crate::pool::FeaturePools;
use crate::utils::points_fuzzy_equal;

/// A crossing of two non-adjacent segments of the same ring.
#[derive(Debug, Clone, Copy)]
struct SelfIntersection {
    segment1: usize,
    segment2: usize,
    point: Point2d,
}

fn ring_segments(contour: &Contour) -> Vec<(Point2d, Point2d)> {
    let points = contour.points();
    let mut segments: Vec<_> = points.windows(2).map(|w| (w[0], w[1])).collect();
    if contour.is_closed() && points.len() > 1 {
        segments.push((points[points.len() - 1], points[0]));
    }
    segments
}

fn self_intersections(contour: &Contour, tol: f64) -> Vec<SelfIntersection> {
    let segments = ring_segments(contour);
    let count = segments.len();
    let mut found = vec![];
    for i in 0..count {
        for j in i + 2..count {
            // the closing segment of a ring is adjacent to the first one
            if contour.is_closed() && i == 0 && j == count - 1 {
                continue;
            }
            let (a1, a2) = &segments[i];
            let (b1, b2) = &segments[j];
            if let Some(point) = Segment(a1, a2).intersection(&Segment(b1, b2), tol) {
                found.push(SelfIntersection {
                    segment1: i,
                    segment2: j,
                    point,
                });
            }
        }
    }
    found
}

/// The two halves of a ring cut apart at a self-intersection: the piece keeping the ring's start,
/// and the loop between the two crossing segments.
fn split_ring(contour: &Contour, inter: &SelfIntersection) -> (Contour, Contour) {
    let points = contour.points();
    let mut piece1: Vec<Point2d> = points[..=inter.segment1].to_vec();
    piece1.push(inter.point);
    piece1.extend_from_slice(&points[(inter.segment2 + 1).min(points.len())..]);

    let mut piece2 = vec![inter.point];
    piece2.extend_from_slice(&points[inter.segment1 + 1..=inter.segment2]);

    if contour.is_closed() {
        (Contour::closed(piece1), Contour::closed(piece2))
    } else {
        // an open loop keeps the crossing point at both ends
        piece2.push(inter.point);
        (Contour::open(piece1), Contour::open(piece2))
    }
}

/// Reports self-intersections of line strings and polygon rings: crossings of two non-adjacent
/// segments of the same ring.
pub struct SelfIntersectionCheck {
    context: CheckContext,
}

impl SelfIntersectionCheck {
    /// Registry id of the check.
    pub const ID: &'static str = "SelfIntersectionCheck";

    /// Resolution method splitting the ring and keeping both pieces in the feature.
    pub const RESOLUTION_TO_MULTI_OBJECT: usize = 0;
    /// Resolution method splitting the ring into separate features.
    pub const RESOLUTION_TO_SINGLE_OBJECTS: usize = 1;
    /// Resolution method keeping the feature as is.
    pub const RESOLUTION_NO_CHANGE: usize = 2;

    const COMPATIBLE: &'static [GeometryType] = &[GeometryType::Line, GeometryType::Polygon];
    const METHODS: &'static [&'static str] = &[
        "Split feature into a multi-object feature",
        "Split feature into multiple single-object features",
        "No change",
    ];

    /// Creates the check. The check has no configuration keys.
    pub fn new(context: &CheckContext, _configuration: &CheckConfiguration) -> Self {
        Self {
            context: context.clone(),
        }
    }

    fn find_intersection(
        &self,
        contour: &Contour,
        pool: &dyn crate::pool::FeaturePool,
        location: &Point2d,
    ) -> Option<SelfIntersection> {
        self_intersections(contour, self.context.tolerance())
            .into_iter()
            .find(|inter| {
                let point = to_map_point(pool, &inter.point);
                points_fuzzy_equal(&point, location, self.context.tolerance())
            })
    }
}

impl GeometryCheck for SelfIntersectionCheck {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Self intersection"
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
                for ring in 0..geometry.num_rings(part) {
                    let Some(contour) = geometry.ring(part, ring) else {
                        continue;
                    };
                    for inter in self_intersections(contour, self.context.tolerance()) {
                        errors.push(
                            CheckError::new(
                                Self::ID,
                                &layer_feature,
                                to_map_point(pool.as_ref(), &inter.point),
                            )
                            .with_vidx(VertexId::new(part, ring, inter.segment1)),
                        );
                    }
                }
            }
        }
        if features.skipped() > 0 {
            messages.push(format!(
                "Self intersection check: skipped {} features with incompatible geometry types",
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
        let Some(contour) = feature.geometry().ring(vidx.part, vidx.ring) else {
            error.set_obsolete("the ring is no longer there");
            return Ok(());
        };
        // the geometry may have been edited since detection; the recomputed crossing must still
        // match the reported location
        let Some(inter) = self.find_intersection(contour, pool.as_ref(), &error.location()) else {
            error.set_obsolete("the self intersection is no longer there");
            return Ok(());
        };

        if method == Self::RESOLUTION_NO_CHANGE {
            error.set_fixed(Self::METHODS[method]);
            return Ok(());
        }

        let (piece1, piece2) = split_ring(contour, &inter);
        let layer_id = error.layer_id().to_string();

        if vidx.ring > 0 {
            // a crossing hole ring is replaced by two hole rings, whatever the split method
            let Some(Geom::Polygon(polygon)) = feature.geometry().part(vidx.part) else {
                error.set_obsolete("the ring is no longer there");
                return Ok(());
            };
            let mut inner: Vec<Contour> = polygon.inner_contours().to_vec();
            inner.remove(vidx.ring - 1);
            inner.push(piece1);
            inner.push(piece2);
            let new_part = Geom::Polygon(Polygon::new(polygon.outer_contour().clone(), inner));
            if !replace_feature_geometry_part(
                pools,
                &layer_id,
                &mut feature,
                vidx.part,
                new_part,
                changes,
            ) {
                error.set_obsolete("the feature no longer exists");
                return Ok(());
            }
            error.set_fixed(Self::METHODS[method]);
            return Ok(());
        }

        let (geom1, geom2) = if feature.geometry().geometry_type() == GeometryType::Polygon {
            let Some(Geom::Polygon(polygon)) = feature.geometry().part(vidx.part) else {
                error.set_obsolete("the ring is no longer there");
                return Ok(());
            };
            let poly2 = Polygon::new(piece2, vec![]);
            // holes stay with the piece that contains them
            let mut holes1 = vec![];
            let mut holes2 = vec![];
            for hole in polygon.inner_contours() {
                match hole.points().first() {
                    Some(first) if poly2.contains_point(first) => holes2.push(hole.clone()),
                    _ => holes1.push(hole.clone()),
                }
            }
            (
                Geom::Polygon(Polygon::new(piece1, holes1)),
                Geom::Polygon(Polygon::new(poly2.outer_contour().clone(), holes2)),
            )
        } else {
            (Geom::Line(piece1), Geom::Line(piece2))
        };

        match method {
            Self::RESOLUTION_TO_MULTI_OBJECT => {
                let mut geometry = feature.geometry().clone();
                let replaced = match &mut geometry {
                    Geom::MultiLine(_) | Geom::MultiPolygon(_) => {
                        geometry.remove_part(vidx.part)
                            && geometry.add_part(geom1)
                            && geometry.add_part(geom2)
                    }
                    _ => {
                        geometry = geom1;
                        geometry.add_part(geom2)
                    }
                };
                if !replaced
                    || !replace_feature_geometry(pools, &layer_id, &mut feature, geometry, changes)
                {
                    error.set_obsolete("the feature no longer exists");
                    return Ok(());
                }
            }
            Self::RESOLUTION_TO_SINGLE_OBJECTS => {
                let attributes = feature.attributes().to_vec();
                if !replace_feature_geometry_part(
                    pools,
                    &layer_id,
                    &mut feature,
                    vidx.part,
                    geom1,
                    changes,
                ) {
                    error.set_obsolete("the feature no longer exists");
                    return Ok(());
                }
                let new_id = pool.add_feature(geom2, attributes);
                changes.add(
                    &layer_id,
                    new_id,
                    Change::new(
                        ChangeWhat::Feature,
                        ChangeType::Added,
                        VertexId::new(0, 0, 0),
                    ),
                );
            }
            _ => unreachable!("validated above"),
        }
        error.set_fixed(Self::METHODS[method]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use approx::assert_relative_eq;
    use geocheck_types::Crs;
    use crate::check::CheckErrorStatus;
    use crate::feature::AttributeValue;
    use crate::pool::MemoryFeaturePool;

    // a bowtie: the ring (0,0) (4,0) (0,4) (4,4) crosses itself at (2,2)
    fn bowtie() -> Geom {
        Geom::Polygon(Polygon::new(
            Contour::closed(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(4.0, 0.0),
                Point2d::new(0.0, 4.0),
                Point2d::new(4.0, 4.0),
            ]),
            vec![],
        ))
    }

    fn setup(geometry_type: GeometryType, features: Vec<Geom>) -> (FeaturePools, CheckContext) {
        let mut builder =
            MemoryFeaturePool::builder("layer", geometry_type, Crs::new("EPSG:3857"));
        for geometry in features {
            builder = builder.feature(geometry, vec![AttributeValue::from("kept")]);
        }
        let mut pools = FeaturePools::new();
        pools.insert("layer".to_string(), Arc::new(builder.build()));
        (pools, CheckContext::new(0.001, Crs::new("EPSG:3857")))
    }

    fn collect(pools: &FeaturePools, context: &CheckContext) -> Vec<CheckError> {
        let check = SelfIntersectionCheck::new(context, &CheckConfiguration::new());
        let mut errors = vec![];
        let mut messages = vec![];
        check.collect_errors(pools, &mut errors, &mut messages, &Feedback::new(), None);
        errors
    }

    #[test]
    fn detects_ring_crossing() {
        let (pools, context) = setup(GeometryType::Polygon, vec![bowtie()]);
        let errors = collect(&pools, &context);
        assert_eq!(errors.len(), 1);
        assert_relative_eq!(errors[0].location().x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(errors[0].location().y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn clean_ring_has_no_errors() {
        let square = Geom::Polygon(Polygon::new(
            Contour::closed(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(4.0, 0.0),
                Point2d::new(4.0, 4.0),
                Point2d::new(0.0, 4.0),
            ]),
            vec![],
        ));
        let (pools, context) = setup(GeometryType::Polygon, vec![square]);
        assert!(collect(&pools, &context).is_empty());
    }

    #[test]
    fn detects_line_crossing_itself() {
        let line = Geom::Line(Contour::open(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(4.0, 0.0),
            Point2d::new(4.0, 2.0),
            Point2d::new(2.0, -2.0),
        ]));
        let (pools, context) = setup(GeometryType::Line, vec![line]);
        let errors = collect(&pools, &context);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].vidx(), VertexId::new(0, 0, 0));
    }

    #[test]
    fn split_to_multi_object_keeps_one_feature() {
        let (pools, context) = setup(GeometryType::Polygon, vec![bowtie()]);
        let check = SelfIntersectionCheck::new(&context, &CheckConfiguration::new());
        let mut errors = collect(&pools, &context);

        let mut changes = Changes::new();
        check
            .fix_error(
                &pools,
                &mut errors[0],
                SelfIntersectionCheck::RESOLUTION_TO_MULTI_OBJECT,
                &Default::default(),
                &mut changes,
            )
            .expect("fix failed");
        assert_eq!(errors[0].status(), CheckErrorStatus::Fixed);

        let pool = pools.get("layer").expect("missing pool");
        assert_eq!(pool.all_feature_ids().len(), 1);
        let feature = pool.get_feature(errors[0].feature_id()).expect("missing feature");
        assert_eq!(feature.geometry().num_parts(), 2);
        // the two triangles together cover the bowtie's area
        let engine = crate::utils::create_geom_engine(feature.geometry(), 0.001);
        assert_relative_eq!(engine.area(), 8.0, epsilon = 1e-6);
        // the fixed feature no longer intersects itself
        assert!(collect(&pools, &context).is_empty());
    }

    #[test]
    fn split_to_single_objects_adds_a_feature() {
        let (pools, context) = setup(GeometryType::Polygon, vec![bowtie()]);
        let check = SelfIntersectionCheck::new(&context, &CheckConfiguration::new());
        let mut errors = collect(&pools, &context);

        let mut changes = Changes::new();
        check
            .fix_error(
                &pools,
                &mut errors[0],
                SelfIntersectionCheck::RESOLUTION_TO_SINGLE_OBJECTS,
                &Default::default(),
                &mut changes,
            )
            .expect("fix failed");
        assert_eq!(errors[0].status(), CheckErrorStatus::Fixed);

        let pool = pools.get("layer").expect("missing pool");
        let ids = pool.all_feature_ids();
        assert_eq!(ids.len(), 2);
        let new_feature = pool.get_feature(ids[1]).expect("missing feature");
        // attributes are copied to the split-off feature
        assert_eq!(new_feature.attributes(), &[AttributeValue::from("kept")]);
        assert!(collect(&pools, &context).is_empty());
    }

    #[test]
    fn fix_after_edit_is_obsolete() {
        let (pools, context) = setup(GeometryType::Polygon, vec![bowtie()]);
        let check = SelfIntersectionCheck::new(&context, &CheckConfiguration::new());
        let mut errors = collect(&pools, &context);

        // untangle the ring behind the error's back
        let pool = pools.get("layer").expect("missing pool");
        let mut feature = pool.get_feature(errors[0].feature_id()).expect("missing feature");
        feature.set_geometry(Geom::Polygon(Polygon::new(
            Contour::closed(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(4.0, 0.0),
                Point2d::new(4.0, 4.0),
                Point2d::new(0.0, 4.0),
            ]),
            vec![],
        )));
        assert!(pool.update_feature(feature));

        let mut changes = Changes::new();
        check
            .fix_error(
                &pools,
                &mut errors[0],
                SelfIntersectionCheck::RESOLUTION_TO_MULTI_OBJECT,
                &Default::default(),
                &mut changes,
            )
            .expect("fix failed");
        assert_eq!(errors[0].status(), CheckErrorStatus::Obsolete);
        assert!(changes.is_empty());
    }
}
