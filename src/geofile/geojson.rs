use std::{fs, path::Path};

use anyhow::{anyhow, Context};

use crate::feature::{JsonValue, StoreFeature};

/// Read the features of a GeoJSON file as untrusted exchange-format values.
///
/// Accepts a FeatureCollection or a single Feature. Nothing is validated here, the
/// values are meant to go through [`crate::store::FeatureStore::load`].
pub fn read_features_from_geojson(input_filepath: &Path) -> anyhow::Result<Vec<JsonValue>> {
    let contents = fs::read_to_string(input_filepath)
        .with_context(|| format!("Reading GeoJSON file {:?}", input_filepath))?;
    let geojson_contents: geojson::GeoJson = contents
        .parse()
        .with_context(|| format!("Parsing GeoJSON file {:?}", input_filepath))?;

    let features = match geojson_contents {
        geojson::GeoJson::FeatureCollection(collection) => collection.features,
        geojson::GeoJson::Feature(feature) => vec![feature],
        geojson::GeoJson::Geometry(_) => {
            return Err(anyhow!(
                "GeoJSON file {:?} holds a bare geometry, expected features",
                input_filepath
            ))
        }
    };
    features
        .into_iter()
        .map(|feature| serde_json::to_value(feature).context("Converting GeoJSON feature"))
        .collect()
}

/// Write store features to `output_filepath` as a FeatureCollection.
pub fn write_features_to_geojson(
    features: &[StoreFeature],
    output_filepath: &Path,
) -> anyhow::Result<()> {
    let feature_collection: geojson::FeatureCollection =
        features.iter().map(geojson::Feature::from).collect();
    let geojson_contents = geojson::GeoJson::from(feature_collection);
    fs::write(output_filepath, geojson_contents.to_string())
        .with_context(|| format!("Writing GeoJSON file {:?}", output_filepath))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use testdir::testdir;

    use crate::feature::{Properties, StoreFeature, StoreGeometry};

    use super::{read_features_from_geojson, write_features_to_geojson};

    const ID: &str = "e3ccd3b9-afb1-4f0b-91d8-22a768d5f284";

    #[test]
    fn test_write_then_read_features() {
        let mut properties = Properties::new();
        properties.insert("mode".to_string(), json!("linestring"));
        let features = vec![StoreFeature {
            id: ID.to_string(),
            geometry: StoreGeometry::LineString(vec![[0.0, 0.0], [1.5, -2.0]]),
            properties,
        }];
        let test_dir = testdir!();
        let filepath = test_dir.join("features.geojson");

        write_features_to_geojson(&features, &filepath).unwrap();
        let read = read_features_from_geojson(&filepath).unwrap();

        assert_eq!(1, read.len());
        assert_eq!(json!(ID), read[0]["id"]);
        assert_eq!(json!("Feature"), read[0]["type"]);
        assert_eq!(json!("LineString"), read[0]["geometry"]["type"]);
        assert_eq!(json!([[0.0, 0.0], [1.5, -2.0]]), read[0]["geometry"]["coordinates"]);
        assert_eq!(json!("linestring"), read[0]["properties"]["mode"]);
    }

    #[test]
    fn test_read_single_feature() {
        let test_dir = testdir!();
        let filepath = test_dir.join("feature.geojson");
        fs::write(
            &filepath,
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
                "properties": { "mode": "point" },
            })
            .to_string(),
        )
        .unwrap();

        let read = read_features_from_geojson(&filepath).unwrap();

        assert_eq!(1, read.len());
        assert_eq!(json!([1.0, 2.0]), read[0]["geometry"]["coordinates"]);
    }

    #[test]
    fn test_read_bare_geometry_fails() {
        let test_dir = testdir!();
        let filepath = test_dir.join("geometry.geojson");
        fs::write(
            &filepath,
            json!({ "type": "Point", "coordinates": [1.0, 2.0] }).to_string(),
        )
        .unwrap();

        assert!(read_features_from_geojson(&filepath).is_err());
        assert!(read_features_from_geojson(&test_dir.join("missing.geojson")).is_err());
    }
}
