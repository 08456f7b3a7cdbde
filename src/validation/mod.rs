//! Schema predicates for externally sourced features.
//!
//! The predicates work on untrusted `serde_json::Value`s and stop at the first
//! violation, checked in this order: object shape, id presence, id shape,
//! geometry presence, coordinates shape, geometry type, properties presence,
//! mode type.

use crate::feature::{is_uuid4, JsonValue};

/// Reasons a feature can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ValidationError {
    #[error("Feature is not object")]
    FeatureIsNotObject,
    #[error("Feature has no id")]
    FeatureHasNoId,
    #[error("Feature must have UUID4 id")]
    FeatureIdIsNotUUID4,
    #[error("Feature has no geometry")]
    FeatureHasNoGeometry,
    #[error("Feature coordinates is not an array")]
    FeatureCoordinatesNotAnArray,
    #[error("Feature is not Point, LineString or Polygon")]
    FeatureGeometryNotSupported,
    #[error("Feature has no properties")]
    FeatureHasNoProperties,
    #[error("Feature does not have a valid mode property")]
    InvalidModeProperty,
    #[error("updatedAt and createdAt are not valid timestamps")]
    InvalidTrackedProperties,
}

/// Signature of the per-feature validator accepted by [`crate::store::FeatureStore::load`].
///
/// Returning `Ok(false)` rejects the feature without a specific reason.
pub type FeatureValidator = dyn Fn(&JsonValue) -> Result<bool, ValidationError>;

const SUPPORTED_GEOMETRY_TYPES: [&str; 3] = ["Point", "LineString", "Polygon"];

/// `null` counts as missing.
fn present<'a>(value: Option<&'a JsonValue>) -> Option<&'a JsonValue> {
    value.filter(|value| !value.is_null())
}

pub fn validate_store_feature(feature: &JsonValue) -> Result<(), ValidationError> {
    let feature = feature
        .as_object()
        .ok_or(ValidationError::FeatureIsNotObject)?;

    let id = present(feature.get("id")).ok_or(ValidationError::FeatureHasNoId)?;
    match id.as_str() {
        Some(id) if is_uuid4(id) => {}
        _ => return Err(ValidationError::FeatureIdIsNotUUID4),
    }

    let geometry =
        present(feature.get("geometry")).ok_or(ValidationError::FeatureHasNoGeometry)?;
    if !matches!(geometry.get("coordinates"), Some(JsonValue::Array(_))) {
        return Err(ValidationError::FeatureCoordinatesNotAnArray);
    }
    match geometry.get("type").and_then(JsonValue::as_str) {
        Some(geometry_type) if SUPPORTED_GEOMETRY_TYPES.contains(&geometry_type) => {}
        _ => return Err(ValidationError::FeatureGeometryNotSupported),
    }

    let properties =
        present(feature.get("properties")).ok_or(ValidationError::FeatureHasNoProperties)?;
    if let Some(mode) = present(properties.get("mode")) {
        if !mode.is_string() {
            return Err(ValidationError::InvalidModeProperty);
        }
    }

    Ok(())
}

/// [`validate_store_feature`] in the shape of a [`FeatureValidator`].
pub fn is_valid_store_feature(feature: &JsonValue) -> Result<bool, ValidationError> {
    validate_store_feature(feature).map(|()| true)
}

/// A supplied `createdAt`/`updatedAt` must be a finite number.
pub fn validate_timestamp(timestamp: &JsonValue) -> Result<(), ValidationError> {
    match timestamp.as_f64() {
        Some(timestamp) if timestamp.is_finite() => Ok(()),
        _ => Err(ValidationError::InvalidTrackedProperties),
    }
}
