//! Iteration over (layer, feature, geometry) triples.

use std::collections::BTreeSet;

use ahash::{HashMap, HashMapExt};
use log::warn;

use geocheck_types::{Geom, GeometryType, Rect};

use crate::context::CheckContext;
use crate::feature::{Feature, FeatureId};
use crate::feedback::Feedback;
use crate::pool::{FeaturePool, FeaturePools};

/// Ordered set of feature ids of one layer.
pub type FeatureIds = BTreeSet<FeatureId>;

/// Explicit (layer -> feature ids) scope restriction.
#[derive(Debug, Default, Clone)]
pub struct LayerFeatureIds(HashMap<String, FeatureIds>);

impl LayerFeatureIds {
    /// Creates an empty restriction.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Adds the ids of one layer.
    pub fn insert(&mut self, layer_id: impl Into<String>, ids: FeatureIds) {
        self.0.insert(layer_id.into(), ids);
    }

    /// Scope covering every feature of every layer in the pool map.
    pub fn all(pools: &FeaturePools) -> Self {
        let mut result = Self::new();
        for layer_id in pools.layer_ids() {
            if let Some(pool) = pools.get(&layer_id) {
                result.insert(layer_id, pool.all_feature_ids().into_iter().collect());
            }
        }
        result
    }

    /// Ids of one layer, if the layer is in scope.
    pub fn get(&self, layer_id: &str) -> Option<&FeatureIds> {
        self.0.get(layer_id)
    }

    /// Layer ids of the scope, in ascending order.
    pub fn layer_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.0.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// A feature together with its layer and its geometry, optionally reprojected to the map
/// reference system.
///
/// Reprojection happens once, at construction, and the result is cached in the value. Two layer
/// features are equal when they reference the same feature of the same layer.
#[derive(Debug, Clone)]
pub struct LayerFeature {
    layer_id: String,
    feature: Feature,
    geometry: Geom,
}

impl LayerFeature {
    /// Combines a feature of the given pool's layer with its (possibly reprojected) geometry.
    /// If `use_map_crs` is true the geometry is reprojected into the map system of `context`.
    pub fn new(
        pool: &dyn FeaturePool,
        feature: Feature,
        context: &CheckContext,
        use_map_crs: bool,
    ) -> Self {
        let geometry = match pool.map_projection() {
            Some(projection) if use_map_crs => match feature.geometry().project(projection) {
                Some(geometry) => geometry,
                None => {
                    warn!(
                        "layer {}: feature {} could not be reprojected to {}",
                        pool.layer_id(),
                        feature.id(),
                        context.map_crs()
                    );
                    feature.geometry().clone()
                }
            },
            _ => feature.geometry().clone(),
        };
        Self {
            layer_id: pool.layer_id().to_string(),
            feature,
            geometry,
        }
    }

    /// Id of the layer the feature belongs to.
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// The feature, with its geometry in the layer's own reference system.
    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    /// Geometry of the feature, reprojected to the map system if that was requested at
    /// construction.
    pub fn geometry(&self) -> &Geom {
        &self.geometry
    }
}

impl PartialEq for LayerFeature {
    fn eq(&self, other: &Self) -> bool {
        self.layer_id == other.layer_id && self.feature.id() == other.feature.id()
    }
}

impl Eq for LayerFeature {}

enum Scope {
    Ids(LayerFeatureIds),
    Extent(Option<Rect>),
}

/// Forward-only, single-pass iterator over a subset of features of one or more layers.
///
/// Yields the features of one layer before moving to the next one; features whose geometry type
/// is not in the accepted list are skipped silently (the count is available from
/// [`LayerFeatures::skipped`]). The feedback handle is polled between features; once cancellation
/// is observed the iterator ends. It cannot be restarted.
pub struct LayerFeatures<'a> {
    pools: &'a FeaturePools,
    context: &'a CheckContext,
    feedback: &'a Feedback,
    geometry_types: Vec<GeometryType>,
    use_map_crs: bool,
    scope: Scope,
    layer_ids: Vec<String>,
    layer_cursor: usize,
    pending_ids: Vec<FeatureId>,
    pending_cursor: usize,
    started: bool,
    skipped: usize,
}

impl<'a> LayerFeatures<'a> {
    /// Scope over explicit per-layer feature id sets.
    pub fn from_ids(
        pools: &'a FeaturePools,
        ids: LayerFeatureIds,
        geometry_types: Vec<GeometryType>,
        context: &'a CheckContext,
        feedback: &'a Feedback,
        use_map_crs: bool,
    ) -> Self {
        let layer_ids = ids.layer_ids();
        Self {
            pools,
            context,
            feedback,
            geometry_types,
            use_map_crs,
            scope: Scope::Ids(ids),
            layer_ids,
            layer_cursor: 0,
            pending_ids: vec![],
            pending_cursor: 0,
            started: false,
            skipped: 0,
        }
    }

    /// Scope over a list of layers restricted by a bounding extent (`None` meaning the layers'
    /// full extent). Geometries are always reprojected to the map system in this mode.
    pub fn from_extent(
        pools: &'a FeaturePools,
        layer_ids: Vec<String>,
        extent: Option<Rect>,
        geometry_types: Vec<GeometryType>,
        context: &'a CheckContext,
        feedback: &'a Feedback,
    ) -> Self {
        Self {
            pools,
            context,
            feedback,
            geometry_types,
            use_map_crs: true,
            scope: Scope::Extent(extent),
            layer_ids,
            layer_cursor: 0,
            pending_ids: vec![],
            pending_cursor: 0,
            started: false,
            skipped: 0,
        }
    }

    /// Number of features skipped so far because of their geometry type.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn load_layer(&mut self) -> bool {
        let Some(layer_id) = self.layer_ids.get(self.layer_cursor) else {
            return false;
        };
        let Some(pool) = self.pools.get(layer_id) else {
            warn!("no feature pool for layer {layer_id}, skipping");
            self.pending_ids = vec![];
            self.pending_cursor = 0;
            return true;
        };
        self.pending_ids = match &self.scope {
            Scope::Ids(ids) => ids
                .get(layer_id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default(),
            Scope::Extent(Some(extent)) => pool.ids_in_extent(extent),
            Scope::Extent(None) => pool.all_feature_ids(),
        };
        self.pending_cursor = 0;
        true
    }
}

impl Iterator for LayerFeatures<'_> {
    type Item = LayerFeature;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if !self.load_layer() {
                return None;
            }
        }

        loop {
            if self.feedback.is_canceled() {
                return None;
            }

            let Some(layer_id) = self.layer_ids.get(self.layer_cursor) else {
                return None;
            };

            let Some(&feature_id) = self.pending_ids.get(self.pending_cursor) else {
                self.layer_cursor += 1;
                if !self.load_layer() {
                    return None;
                }
                continue;
            };
            self.pending_cursor += 1;

            let Some(pool) = self.pools.get(layer_id) else {
                continue;
            };
            let Some(feature) = pool.get_feature(feature_id) else {
                continue;
            };

            if !self
                .geometry_types
                .contains(&feature.geometry().geometry_type())
            {
                self.skipped += 1;
                continue;
            }

            return Some(LayerFeature::new(
                pool.as_ref(),
                feature,
                self.context,
                self.use_map_crs,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use geocheck_types::{Contour, Crs, Point2d};
    use crate::pool::MemoryFeaturePool;

    fn line(x0: f64) -> Geom {
        Geom::Line(Contour::open(vec![
            Point2d::new(x0, 0.0),
            Point2d::new(x0 + 1.0, 0.0),
        ]))
    }

    fn pools() -> FeaturePools {
        let a = MemoryFeaturePool::builder("a", GeometryType::Line, Crs::new("EPSG:3857"))
            .feature(line(0.0), vec![])
            .feature(line(10.0), vec![])
            .build();
        let b = MemoryFeaturePool::builder("b", GeometryType::Line, Crs::new("EPSG:3857"))
            .feature(line(100.0), vec![])
            .build();
        let mut pools = FeaturePools::new();
        pools.insert("a".to_string(), Arc::new(a));
        pools.insert("b".to_string(), Arc::new(b));
        pools
    }

    fn context() -> CheckContext {
        CheckContext::new(0.001, Crs::new("EPSG:3857"))
    }

    #[test]
    fn iterates_layer_by_layer() {
        let pools = pools();
        let context = context();
        let feedback = Feedback::new();
        let features = LayerFeatures::from_extent(
            &pools,
            vec!["a".to_string(), "b".to_string()],
            None,
            vec![GeometryType::Line],
            &context,
            &feedback,
        );
        let visited: Vec<_> = features
            .map(|lf| (lf.layer_id().to_string(), lf.feature().id()))
            .collect();
        assert_eq!(
            visited,
            vec![
                ("a".to_string(), FeatureId(1)),
                ("a".to_string(), FeatureId(2)),
                ("b".to_string(), FeatureId(1)),
            ]
        );
    }

    #[test]
    fn respects_id_restriction() {
        let pools = pools();
        let context = context();
        let feedback = Feedback::new();
        let mut ids = LayerFeatureIds::new();
        ids.insert("a", [FeatureId(2)].into_iter().collect());

        let features = LayerFeatures::from_ids(
            &pools,
            ids,
            vec![GeometryType::Line],
            &context,
            &feedback,
            false,
        );
        let visited: Vec<_> = features
            .map(|lf| (lf.layer_id().to_string(), lf.feature().id()))
            .collect();
        assert_eq!(visited, vec![("a".to_string(), FeatureId(2))]);
    }

    #[test]
    fn skips_foreign_geometry_types() {
        let pools = pools();
        let context = context();
        let feedback = Feedback::new();
        let mut features = LayerFeatures::from_extent(
            &pools,
            pools.layer_ids(),
            None,
            vec![GeometryType::Polygon],
            &context,
            &feedback,
        );
        assert!(features.next().is_none());
        assert_eq!(features.skipped(), 3);
    }

    #[test]
    fn stops_on_cancellation() {
        let pools = pools();
        let context = context();
        let feedback = Feedback::new();
        let mut features = LayerFeatures::from_extent(
            &pools,
            pools.layer_ids(),
            None,
            vec![GeometryType::Line],
            &context,
            &feedback,
        );
        assert!(features.next().is_some());
        feedback.cancel();
        assert!(features.next().is_none());
    }

    #[test]
    fn reprojects_to_map_crs() {
        use geocheck_types::AffineProjection;

        let pool = MemoryFeaturePool::builder("c", GeometryType::Line, Crs::new("EPSG:25832"))
            .map_projection(Box::new(AffineProjection::scale_offset(2.0, 0.0, 0.0)))
            .feature(line(1.0), vec![])
            .build();
        let mut pools = FeaturePools::new();
        pools.insert("c".to_string(), Arc::new(pool));

        let context = context();
        let feedback = Feedback::new();
        let mut features = LayerFeatures::from_extent(
            &pools,
            vec!["c".to_string()],
            None,
            vec![GeometryType::Line],
            &context,
            &feedback,
        );
        let lf = features.next().expect("no feature");
        let Geom::Line(contour) = lf.geometry() else {
            panic!("unexpected geometry type");
        };
        assert_eq!(contour.points()[0], Point2d::new(2.0, 0.0));
        // the feature itself keeps the layer's own coordinates
        let Geom::Line(original) = lf.feature().geometry() else {
            panic!("unexpected geometry type");
        };
        assert_eq!(original.points()[0], Point2d::new(1.0, 0.0));
    }
}
