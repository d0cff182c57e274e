//! Record of the edits a fix pass produces.

use ahash::{HashMap, HashMapExt};
use geocheck_types::VertexId;

use crate::feature::FeatureId;

/// Which level of a feature's structure an edit touched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChangeWhat {
    /// The whole feature.
    Feature,
    /// One part of a multi-geometry.
    Part,
    /// One ring of a polygon part.
    Ring,
    /// One vertex.
    Node,
}

/// What kind of edit happened.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// Something was added.
    Added,
    /// Something was removed.
    Removed,
    /// Something was altered in place.
    Changed,
}

/// A single recorded edit at the locus given by `vidx`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Change {
    /// Structure level of the edit.
    pub what: ChangeWhat,
    /// Kind of the edit.
    pub change_type: ChangeType,
    /// Locus of the edit. For feature-level changes only the part/ring components are meaningful.
    pub vidx: VertexId,
}

impl Change {
    /// Creates a new change record.
    pub fn new(what: ChangeWhat, change_type: ChangeType, vidx: VertexId) -> Self {
        Self {
            what,
            change_type,
            vidx,
        }
    }
}

/// All edits produced by one fix application, grouped by layer and feature.
///
/// Applied against each layer's edit buffer as a single logical unit; the checker records them
/// here so that other pending errors can detect they became obsolete.
#[derive(Debug, Default)]
pub struct Changes {
    by_layer: HashMap<String, HashMap<FeatureId, Vec<Change>>>,
}

impl Changes {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self {
            by_layer: HashMap::new(),
        }
    }

    /// True if no edits were recorded.
    pub fn is_empty(&self) -> bool {
        self.by_layer.is_empty()
    }

    /// Records an edit for the given layer and feature.
    pub fn add(&mut self, layer_id: &str, feature_id: FeatureId, change: Change) {
        self.by_layer
            .entry(layer_id.to_string())
            .or_insert_with(HashMap::new)
            .entry(feature_id)
            .or_insert_with(Vec::new)
            .push(change);
    }

    /// Edits recorded for one feature, in application order.
    pub fn for_feature(&self, layer_id: &str, feature_id: FeatureId) -> &[Change] {
        self.by_layer
            .get(layer_id)
            .and_then(|features| features.get(&feature_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates over all recorded edits as (layer id, feature id, change) triples.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureId, &Change)> {
        self.by_layer.iter().flat_map(|(layer_id, features)| {
            features.iter().flat_map(move |(feature_id, changes)| {
                changes
                    .iter()
                    .map(move |change| (layer_id.as_str(), *feature_id, change))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut changes = Changes::new();
        assert!(changes.is_empty());

        let vidx = VertexId::new(0, 1, 0);
        changes.add(
            "layer",
            FeatureId(7),
            Change::new(ChangeWhat::Ring, ChangeType::Removed, vidx),
        );
        changes.add(
            "layer",
            FeatureId(7),
            Change::new(ChangeWhat::Feature, ChangeType::Changed, VertexId::new(0, 0, 0)),
        );

        let recorded = changes.for_feature("layer", FeatureId(7));
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].what, ChangeWhat::Ring);
        assert_eq!(changes.for_feature("other", FeatureId(7)), &[]);
        assert_eq!(changes.iter().count(), 2);
    }
}
