//! Error types used by the crate.

use thiserror::Error;

/// Geocheck error type.
#[derive(Debug, Error)]
pub enum GeocheckError {
    /// A factory with the same check id is already registered.
    #[error("a check factory with id {0:?} is already registered")]
    DuplicateCheckId(String),
    /// No factory is registered under the requested check id.
    #[error("no check factory registered under id {0:?}")]
    UnknownCheckId(String),
    /// The check cannot run against the layer's geometry type.
    #[error("check {check_id:?} is not compatible with layer {layer_id:?}")]
    IncompatibleLayer {
        /// Id of the check.
        check_id: String,
        /// Id of the rejected layer.
        layer_id: String,
    },
    /// A layer id was not found in the feature pool map.
    #[error("unknown layer {0:?}")]
    UnknownLayer(String),
    /// A resolution method index outside the check's method list.
    #[error("check {check_id:?} has no resolution method {method}")]
    InvalidResolutionMethod {
        /// Id of the check.
        check_id: String,
        /// The out-of-range method index.
        method: usize,
    },
}
