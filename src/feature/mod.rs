pub mod geometry;
pub mod timestamps;

use uuid::Uuid;

use crate::error::StoreError;

pub use geometry::{Envelope, StoreGeometry};

/// Identifier of a feature in the store. Always a UUID-v4 in hyphenated form once assigned.
pub type FeatureId = String;

/// JSON-like value used for properties and for untrusted input.
pub type JsonValue = serde_json::Value;

pub type Properties = serde_json::Map<String, JsonValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreFeature {
    pub id: FeatureId,
    pub geometry: StoreGeometry,
    pub properties: Properties,
}

impl StoreFeature {
    /// Exchange-format representation: `{ id, type: "Feature", geometry, properties }`.
    pub fn to_json(&self) -> JsonValue {
        let mut object = Properties::new();
        object.insert("id".to_string(), JsonValue::String(self.id.clone()));
        object.insert("type".to_string(), JsonValue::String("Feature".to_string()));
        object.insert("geometry".to_string(), self.geometry.to_json());
        object.insert(
            "properties".to_string(),
            JsonValue::Object(self.properties.clone()),
        );
        JsonValue::Object(object)
    }
}

impl From<&StoreFeature> for geojson::Feature {
    fn from(feature: &StoreFeature) -> Self {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::from(&feature.geometry)),
            id: Some(geojson::feature::Id::String(feature.id.clone())),
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        }
    }
}

impl TryFrom<JsonValue> for StoreFeature {
    type Error = StoreError;

    /// Convert an untrusted exchange-format value into the typed model.
    ///
    /// Only structural conversion happens here, schema checks belong to
    /// [`crate::validation`]. A `type` member, if present, is ignored.
    fn try_from(value: JsonValue) -> Result<Self, StoreError> {
        let id = describe_id(&value);
        let malformed = |reason: String| StoreError::MalformedFeature {
            id: id.clone(),
            reason,
        };

        let JsonValue::Object(mut object) = value else {
            return Err(malformed("feature is not an object".to_string()));
        };
        let feature_id = match object.remove("id") {
            Some(JsonValue::String(feature_id)) => feature_id,
            _ => return Err(malformed("feature id is not a string".to_string())),
        };
        let geometry = match object.remove("geometry") {
            Some(geometry) => serde_json::from_value::<StoreGeometry>(geometry)
                .map_err(|err| malformed(format!("invalid geometry, {}", err)))?,
            None => return Err(malformed("feature has no geometry".to_string())),
        };
        let properties = match object.remove("properties") {
            Some(JsonValue::Object(properties)) => properties,
            _ => return Err(malformed("feature properties are not an object".to_string())),
        };

        Ok(Self {
            id: feature_id,
            geometry,
            properties,
        })
    }
}

pub fn new_feature_id() -> FeatureId {
    Uuid::new_v4().to_string()
}

/// Whether `id` is a hyphenated UUID with version 4 and the RFC 4122 variant.
pub fn is_uuid4(id: &str) -> bool {
    // Uuid::parse_str also accepts the simple, braced and urn forms.
    if id.len() != 36 {
        return false;
    }
    match Uuid::parse_str(id) {
        Ok(uuid) => {
            uuid.get_version() == Some(uuid::Version::Random)
                && uuid.get_variant() == uuid::Variant::RFC4122
        }
        Err(_) => false,
    }
}

/// Human readable id of an untrusted feature value, used in error messages.
pub(crate) fn describe_id(value: &JsonValue) -> String {
    match value.get("id") {
        Some(JsonValue::String(id)) => id.clone(),
        Some(JsonValue::Null) | None => "<no id>".to_string(),
        Some(other) => other.to_string(),
    }
}
