//! File-to-file driver behind the command-line binary.

use std::path::PathBuf;

use serde::Deserialize;

use crate::feature::StoreGeometry;
use crate::geofile::geojson::{read_features_from_geojson, write_features_to_geojson};
use crate::store::{FeatureStore, StoreConfig};
use crate::validation;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub bounding_box: BoundingBox,
    /// Keep only features whose geometry really intersects the box, not just its envelope.
    #[serde(default)]
    pub exact: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InspectConfig {
    pub input_geojson_path: PathBuf,
    pub output_geojson_path: PathBuf,
    #[serde(default)]
    pub store: StoreConfig,
    /// Without a query every loaded feature is written.
    pub query: Option<QueryConfig>,
}

/// Load the input file into a store, run the configured query and write the
/// matching features. Returns the number of features written.
pub fn run_inspection(config: &InspectConfig) -> anyhow::Result<usize> {
    let data = read_features_from_geojson(&config.input_geojson_path)?;
    log::info!(
        "Read {} features from {:?}",
        data.len(),
        config.input_geojson_path
    );

    let mut store = FeatureStore::new(config.store);
    store.load(&data, Some(&validation::is_valid_store_feature))?;
    log::info!("Loaded {} features into the store", store.size());

    let features = match &config.query {
        Some(QueryConfig {
            bounding_box,
            exact,
        }) => {
            let query = StoreGeometry::bbox_polygon(
                bounding_box.min_x,
                bounding_box.min_y,
                bounding_box.max_x,
                bounding_box.max_y,
            );
            let found = if *exact {
                store.search_filtered(&query, |feature| {
                    feature.geometry.intersects_exactly(&query)
                })
            } else {
                store.search(&query)
            };
            log::info!("Query {:?} matched {} features", bounding_box, found.len());
            found
        }
        None => store.copy_all(),
    };

    log::info!(
        "Writing {} features to {:?}",
        features.len(),
        config.output_geojson_path
    );
    write_features_to_geojson(&features, &config.output_geojson_path)?;
    Ok(features.len())
}
