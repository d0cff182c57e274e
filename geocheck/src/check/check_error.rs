//! Representation of a single detected defect.

use geocheck_types::{Geom, Point2d, VertexId};

use crate::changes::{ChangeType, ChangeWhat, Changes};
use crate::feature::FeatureId;
use crate::layer_features::LayerFeature;

/// Lifecycle state of a detected error.
///
/// The only transitions are `Pending -> Fixed` and `Pending -> Obsolete`; nothing leaves the two
/// terminal states.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CheckErrorStatus {
    /// Detected, not yet handled.
    Pending,
    /// A resolution method was applied.
    Fixed,
    /// A later fix elsewhere invalidated this error.
    Obsolete,
}

/// One topological defect found by a check's detection pass.
#[derive(Debug, Clone)]
pub struct CheckError {
    check_id: &'static str,
    layer_id: String,
    feature_id: FeatureId,
    location: Point2d,
    error_geometry: Geom,
    vidx: VertexId,
    value: Option<f64>,
    other_feature: Option<(String, FeatureId)>,
    status: CheckErrorStatus,
    resolution_message: String,
}

impl CheckError {
    /// Creates a new pending error for the given feature at the given location.
    pub fn new(check_id: &'static str, layer_feature: &LayerFeature, location: Point2d) -> Self {
        Self {
            check_id,
            layer_id: layer_feature.layer_id().to_string(),
            feature_id: layer_feature.feature().id(),
            location,
            error_geometry: Geom::Point(location),
            vidx: VertexId::new(0, 0, 0),
            value: None,
            other_feature: None,
            status: CheckErrorStatus::Pending,
            resolution_message: String::new(),
        }
    }

    /// Sets the geometry highlighting the defect (shown by review tools).
    pub fn with_geometry(mut self, geometry: Geom) -> Self {
        self.error_geometry = geometry;
        self
    }

    /// Sets the part/ring/vertex locus of the defect.
    pub fn with_vidx(mut self, vidx: VertexId) -> Self {
        self.vidx = vidx;
        self
    }

    /// Attaches a numeric measure of the defect (an area, a length).
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// References a second feature involved in the defect (e.g. the overlapped neighbor).
    pub fn with_other_feature(mut self, layer_id: impl Into<String>, id: FeatureId) -> Self {
        self.other_feature = Some((layer_id.into(), id));
        self
    }

    /// Id of the check that produced the error.
    pub fn check_id(&self) -> &'static str {
        self.check_id
    }

    /// Id of the offending layer.
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// Id of the offending feature.
    pub fn feature_id(&self) -> FeatureId {
        self.feature_id
    }

    /// Representative location of the defect, in the map reference system.
    pub fn location(&self) -> Point2d {
        self.location
    }

    /// Geometry highlighting the defect.
    pub fn error_geometry(&self) -> &Geom {
        &self.error_geometry
    }

    /// Part/ring/vertex locus of the defect.
    pub fn vidx(&self) -> VertexId {
        self.vidx
    }

    /// Numeric measure of the defect, if the check recorded one.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Second feature involved in the defect, if the check recorded one.
    pub fn other_feature(&self) -> Option<(&str, FeatureId)> {
        self.other_feature
            .as_ref()
            .map(|(layer_id, id)| (layer_id.as_str(), *id))
    }

    /// Current lifecycle state.
    pub fn status(&self) -> CheckErrorStatus {
        self.status
    }

    /// Whether the error still awaits a fix.
    pub fn is_pending(&self) -> bool {
        self.status == CheckErrorStatus::Pending
    }

    /// Message describing how the error was resolved or why it became obsolete.
    pub fn resolution_message(&self) -> &str {
        &self.resolution_message
    }

    /// Marks the error fixed with the given resolution description. Terminal states are kept.
    pub fn set_fixed(&mut self, method_name: &str) {
        if self.status == CheckErrorStatus::Pending {
            self.status = CheckErrorStatus::Fixed;
            self.resolution_message = method_name.to_string();
        }
    }

    /// Marks the error obsolete. Terminal states are kept.
    pub fn set_obsolete(&mut self, reason: &str) {
        if self.status == CheckErrorStatus::Pending {
            self.status = CheckErrorStatus::Obsolete;
            self.resolution_message = reason.to_string();
        }
    }

    /// Inspects the edits of an applied fix and marks this error obsolete when one of them
    /// invalidated its locus: the feature was removed or wholly changed, or the change happened
    /// in the same part at or before the error's ring/vertex.
    pub fn handle_changes(&mut self, changes: &Changes) {
        if self.status != CheckErrorStatus::Pending {
            return;
        }
        for change in changes.for_feature(&self.layer_id, self.feature_id) {
            let invalidates = match change.what {
                ChangeWhat::Feature => true,
                ChangeWhat::Part => {
                    change.vidx.part == self.vidx.part
                        || (change.change_type == ChangeType::Removed
                            && change.vidx.part < self.vidx.part)
                }
                ChangeWhat::Ring => {
                    change.vidx.part == self.vidx.part
                        && (change.vidx.ring == self.vidx.ring
                            || (change.change_type == ChangeType::Removed
                                && change.vidx.ring < self.vidx.ring))
                }
                ChangeWhat::Node => {
                    change.vidx.part == self.vidx.part
                        && change.vidx.ring == self.vidx.ring
                        && change.vidx.vertex <= self.vidx.vertex
                }
            };
            if invalidates {
                self.set_obsolete("a fix of another error altered the feature");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::Change;

    fn error_at(vidx: VertexId) -> CheckError {
        CheckError {
            check_id: "TestCheck",
            layer_id: "layer".to_string(),
            feature_id: FeatureId(1),
            location: Point2d::new(0.0, 0.0),
            error_geometry: Geom::Point(Point2d::new(0.0, 0.0)),
            vidx,
            value: None,
            other_feature: None,
            status: CheckErrorStatus::Pending,
            resolution_message: String::new(),
        }
    }

    #[test]
    fn terminal_states_are_sticky() {
        let mut error = error_at(VertexId::new(0, 0, 0));
        error.set_fixed("No change");
        assert_eq!(error.status(), CheckErrorStatus::Fixed);
        error.set_obsolete("should not apply");
        assert_eq!(error.status(), CheckErrorStatus::Fixed);
        assert_eq!(error.resolution_message(), "No change");
    }

    #[test]
    fn feature_removal_obsoletes() {
        let mut error = error_at(VertexId::new(0, 1, 2));
        let mut changes = Changes::new();
        changes.add(
            "layer",
            FeatureId(1),
            Change::new(
                ChangeWhat::Feature,
                ChangeType::Removed,
                VertexId::new(0, 0, 0),
            ),
        );
        error.handle_changes(&changes);
        assert_eq!(error.status(), CheckErrorStatus::Obsolete);
    }

    #[test]
    fn unrelated_changes_keep_error_pending() {
        let mut error = error_at(VertexId::new(0, 1, 2));
        let mut changes = Changes::new();
        // a ring after the error's one, and a different feature entirely
        changes.add(
            "layer",
            FeatureId(1),
            Change::new(ChangeWhat::Ring, ChangeType::Removed, VertexId::new(0, 2, 0)),
        );
        changes.add(
            "layer",
            FeatureId(9),
            Change::new(
                ChangeWhat::Feature,
                ChangeType::Removed,
                VertexId::new(0, 0, 0),
            ),
        );
        error.handle_changes(&changes);
        assert!(error.is_pending());

        // removing an earlier ring shifts indices and obsoletes
        let mut changes = Changes::new();
        changes.add(
            "layer",
            FeatureId(1),
            Change::new(ChangeWhat::Ring, ChangeType::Removed, VertexId::new(0, 0, 0)),
        );
        error.handle_changes(&changes);
        assert_eq!(error.status(), CheckErrorStatus::Obsolete);
    }
}
