//! Feature pools: read and edit access to one layer's feature storage.

use std::sync::Arc;

use ahash::{HashMap, HashMapExt};
use log::debug;
use parking_lot::RwLock;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use geocheck_types::{Crs, Geom, GeometryType, Projection, Rect};

use crate::feature::{AttributeValue, Feature, FeatureId};

/// Abstraction over a single layer's feature storage.
///
/// Detection passes use the read methods; the mutation surface is used exclusively by fix passes
/// and goes into the layer's edit buffer, committed by the orchestrator, not by the checker.
pub trait FeaturePool: Send + Sync {
    /// Id of the layer this pool represents.
    fn layer_id(&self) -> &str;

    /// Human-readable layer name.
    fn layer_name(&self) -> &str;

    /// Geometry type of the layer.
    fn geometry_type(&self) -> GeometryType;

    /// Reference system of the layer's geometries.
    fn crs(&self) -> &Crs;

    /// Projection of this layer's coordinates into the map reference system, or `None` when the
    /// layer already is in the map system.
    fn map_projection(&self) -> Option<&dyn Projection>;

    /// Names of the layer's attribute fields.
    fn field_names(&self) -> Vec<String>;

    /// Looks a feature up by id.
    fn get_feature(&self, id: FeatureId) -> Option<Feature>;

    /// Ids of all features of the layer, in ascending order.
    fn all_feature_ids(&self) -> Vec<FeatureId>;

    /// Ids of all features whose bounding rectangle intersects the extent, in ascending order.
    /// Backed by the pool's spatial index.
    fn ids_in_extent(&self, extent: &Rect) -> Vec<FeatureId>;

    /// Replaces a stored feature (geometry and attributes). Returns false if the feature does not
    /// exist.
    fn update_feature(&self, feature: Feature) -> bool;

    /// Adds a new feature to the layer's edit buffer and returns its id.
    fn add_feature(&self, geometry: Geom, attributes: Vec<AttributeValue>) -> FeatureId;

    /// Deletes a feature from the layer's edit buffer. Returns false if the feature does not
    /// exist.
    fn delete_feature(&self, id: FeatureId) -> bool;
}

/// Map from layer ids to their feature pools, as handed to checks.
#[derive(Default, Clone)]
pub struct FeaturePools {
    pools: HashMap<String, Arc<dyn FeaturePool>>,
}

impl FeaturePools {
    /// Creates an empty pool map.
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
        }
    }

    /// Adds a pool under the given layer id.
    pub fn insert(&mut self, layer_id: String, pool: Arc<dyn FeaturePool>) {
        self.pools.insert(layer_id, pool);
    }

    /// The pool of the given layer, if any.
    pub fn get(&self, layer_id: &str) -> Option<&Arc<dyn FeaturePool>> {
        self.pools.get(layer_id)
    }

    /// Ids of all layers in the map, in ascending order.
    pub fn layer_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.pools.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Ids of the layers whose geometry type is in the given list, in ascending order.
    pub fn layer_ids_with_types(&self, types: &[GeometryType]) -> Vec<String> {
        let mut ids: Vec<_> = self
            .pools
            .iter()
            .filter(|(_, pool)| types.contains(&pool.geometry_type()))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}

type IndexEntry = GeomWithData<Rectangle<[f64; 2]>, FeatureId>;

fn index_entry(id: FeatureId, rect: &Rect) -> IndexEntry {
    GeomWithData::new(
        Rectangle::from_corners([rect.x_min, rect.y_min], [rect.x_max, rect.y_max]),
        id,
    )
}

#[derive(Default)]
struct PoolStorage {
    features: HashMap<FeatureId, Feature>,
    index: RTree<IndexEntry>,
    next_id: u64,
}

impl PoolStorage {
    fn insert(&mut self, feature: Feature) {
        if let Some(rect) = feature.geometry().bounding_rect() {
            self.index.insert(index_entry(feature.id(), &rect));
        }
        self.features.insert(feature.id(), feature);
    }

    fn remove(&mut self, id: FeatureId) -> Option<Feature> {
        let feature = self.features.remove(&id)?;
        if let Some(rect) = feature.geometry().bounding_rect() {
            self.index.remove(&index_entry(id, &rect));
        }
        Some(feature)
    }
}

/// In-memory [`FeaturePool`] holding one layer's features behind a read/write lock.
///
/// Reads may happen concurrently from any number of detection passes; fix passes are serialized
/// by the write lock, which is what makes per-layer fix application safe.
pub struct MemoryFeaturePool {
    layer_id: String,
    layer_name: String,
    geometry_type: GeometryType,
    crs: Crs,
    map_projection: Option<Box<dyn Projection>>,
    field_names: Vec<String>,
    storage: RwLock<PoolStorage>,
}

impl MemoryFeaturePool {
    /// Starts building a pool for the given layer.
    pub fn builder(
        layer_id: impl Into<String>,
        geometry_type: GeometryType,
        crs: Crs,
    ) -> MemoryFeaturePoolBuilder {
        MemoryFeaturePoolBuilder {
            layer_id: layer_id.into(),
            layer_name: None,
            geometry_type,
            crs,
            map_projection: None,
            field_names: vec![],
            features: vec![],
        }
    }
}

impl FeaturePool for MemoryFeaturePool {
    fn layer_id(&self) -> &str {
        &self.layer_id
    }

    fn layer_name(&self) -> &str {
        &self.layer_name
    }

    fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    fn crs(&self) -> &Crs {
        &self.crs
    }

    fn map_projection(&self) -> Option<&dyn Projection> {
        self.map_projection.as_deref()
    }

    fn field_names(&self) -> Vec<String> {
        self.field_names.clone()
    }

    fn get_feature(&self, id: FeatureId) -> Option<Feature> {
        self.storage.read().features.get(&id).cloned()
    }

    fn all_feature_ids(&self) -> Vec<FeatureId> {
        let mut ids: Vec<_> = self.storage.read().features.keys().copied().collect();
        ids.sort();
        ids
    }

    fn ids_in_extent(&self, extent: &Rect) -> Vec<FeatureId> {
        let envelope = AABB::from_corners(
            [extent.x_min, extent.y_min],
            [extent.x_max, extent.y_max],
        );
        let mut ids: Vec<_> = self
            .storage
            .read()
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect();
        ids.sort();
        ids
    }

    fn update_feature(&self, feature: Feature) -> bool {
        let mut storage = self.storage.write();
        if storage.remove(feature.id()).is_none() {
            return false;
        }
        storage.insert(feature);
        true
    }

    fn add_feature(&self, geometry: Geom, attributes: Vec<AttributeValue>) -> FeatureId {
        let mut storage = self.storage.write();
        let id = FeatureId(storage.next_id);
        storage.next_id += 1;
        storage.insert(Feature::new(id, geometry, attributes));
        debug!("layer {}: added feature {id}", self.layer_id);
        id
    }

    fn delete_feature(&self, id: FeatureId) -> bool {
        let removed = self.storage.write().remove(id).is_some();
        if removed {
            debug!("layer {}: deleted feature {id}", self.layer_id);
        }
        removed
    }
}

/// Builder for [`MemoryFeaturePool`].
pub struct MemoryFeaturePoolBuilder {
    layer_id: String,
    layer_name: Option<String>,
    geometry_type: GeometryType,
    crs: Crs,
    map_projection: Option<Box<dyn Projection>>,
    field_names: Vec<String>,
    features: Vec<(Geom, Vec<AttributeValue>)>,
}

impl MemoryFeaturePoolBuilder {
    /// Sets a human-readable layer name. Defaults to the layer id.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.layer_name = Some(name.into());
        self
    }

    /// Sets the layer's attribute field names.
    pub fn field_names(mut self, names: Vec<String>) -> Self {
        self.field_names = names;
        self
    }

    /// Sets the projection from the layer's system into the map system.
    pub fn map_projection(mut self, projection: Box<dyn Projection>) -> Self {
        self.map_projection = Some(projection);
        self
    }

    /// Adds a feature; ids are assigned sequentially starting from 1.
    pub fn feature(mut self, geometry: Geom, attributes: Vec<AttributeValue>) -> Self {
        self.features.push((geometry, attributes));
        self
    }

    /// Builds the pool.
    pub fn build(self) -> MemoryFeaturePool {
        let mut storage = PoolStorage {
            next_id: 1,
            ..Default::default()
        };
        for (geometry, attributes) in self.features {
            let id = FeatureId(storage.next_id);
            storage.next_id += 1;
            storage.insert(Feature::new(id, geometry, attributes));
        }
        MemoryFeaturePool {
            layer_id: self.layer_id.clone(),
            layer_name: self.layer_name.unwrap_or(self.layer_id),
            geometry_type: self.geometry_type,
            crs: self.crs,
            map_projection: self.map_projection,
            field_names: self.field_names,
            storage: RwLock::new(storage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocheck_types::{Contour, Point2d};

    fn line(points: Vec<Point2d>) -> Geom {
        Geom::Line(Contour::open(points))
    }

    fn test_pool() -> MemoryFeaturePool {
        let _ = env_logger::builder().is_test(true).try_init();
        MemoryFeaturePool::builder("roads", GeometryType::Line, Crs::new("EPSG:3857"))
            .feature(
                line(vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0)]),
                vec![],
            )
            .feature(
                line(vec![Point2d::new(100.0, 100.0), Point2d::new(110.0, 100.0)]),
                vec![],
            )
            .build()
    }

    #[test]
    fn lookup_and_extent_query() {
        let pool = test_pool();
        assert_eq!(
            pool.all_feature_ids(),
            vec![FeatureId(1), FeatureId(2)]
        );
        assert!(pool.get_feature(FeatureId(1)).is_some());
        assert!(pool.get_feature(FeatureId(3)).is_none());

        let ids = pool.ids_in_extent(&Rect::new(-1.0, -1.0, 20.0, 20.0));
        assert_eq!(ids, vec![FeatureId(1)]);
    }

    #[test]
    fn index_follows_edits() {
        let pool = test_pool();
        let mut feature = pool.get_feature(FeatureId(1)).expect("missing feature");
        feature.set_geometry(line(vec![
            Point2d::new(200.0, 200.0),
            Point2d::new(210.0, 200.0),
        ]));
        assert!(pool.update_feature(feature));

        assert!(pool.ids_in_extent(&Rect::new(-1.0, -1.0, 20.0, 20.0)).is_empty());
        assert_eq!(
            pool.ids_in_extent(&Rect::new(199.0, 199.0, 211.0, 201.0)),
            vec![FeatureId(1)]
        );

        assert!(pool.delete_feature(FeatureId(2)));
        assert!(!pool.delete_feature(FeatureId(2)));
        assert_eq!(pool.all_feature_ids(), vec![FeatureId(1)]);
    }

    #[test]
    fn added_features_get_fresh_ids() {
        let pool = test_pool();
        let id = pool.add_feature(
            line(vec![Point2d::new(0.0, 5.0), Point2d::new(5.0, 5.0)]),
            vec![],
        );
        assert_eq!(id, FeatureId(3));
        assert!(pool.get_feature(id).is_some());
    }
}
