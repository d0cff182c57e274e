//! Vector features and their attribute values.

use serde::{Deserialize, Serialize};

use geocheck_types::Geom;

/// Identifier of a feature, unique within its layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value of a single feature attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// No value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Double(f64),
    /// String value.
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

/// A vector feature: an identified geometry with attribute values.
///
/// Attribute values are positional; the field names live on the feature's layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    id: FeatureId,
    geometry: Geom,
    attributes: Vec<AttributeValue>,
}

impl Feature {
    /// Creates a new feature.
    pub fn new(id: FeatureId, geometry: Geom, attributes: Vec<AttributeValue>) -> Self {
        Self {
            id,
            geometry,
            attributes,
        }
    }

    /// Id of the feature.
    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Geometry of the feature in its layer's reference system.
    pub fn geometry(&self) -> &Geom {
        &self.geometry
    }

    /// Replaces the geometry of the feature.
    pub fn set_geometry(&mut self, geometry: Geom) {
        self.geometry = geometry;
    }

    /// Attribute values of the feature.
    pub fn attributes(&self) -> &[AttributeValue] {
        &self.attributes
    }

    /// Sets the attribute at the given field index. Out-of-range indices are ignored.
    pub fn set_attribute(&mut self, index: usize, value: AttributeValue) {
        if let Some(slot) = self.attributes.get_mut(index) {
            *slot = value;
        }
    }
}
