//! Identifier-keyed feature store with a synchronized spatial index.
//!
//! [`FeatureStore`] owns the primary map and the [`SpatialIndex`]; every mutation goes
//! through it so the two never diverge once a call returns. Values leaving the store
//! are always independent copies.
//!
//! Batch mutations check every entry before touching anything: a failing entry aborts
//! the whole call, leaves the store untouched and emits no notification.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Deserialize;

use crate::error::{StoreError, StoreResult};
use crate::feature::timestamps::{self, now_millis, CREATED_AT, UPDATED_AT};
use crate::feature::{
    describe_id, new_feature_id, FeatureId, JsonValue, Properties, StoreFeature, StoreGeometry,
};
use crate::notifier::{ChangeKind, ChangeNotifier, SubscriptionId};
use crate::spatial_index::{RTreeIndex, SpatialIndex};
use crate::validation::{self, FeatureValidator};


fn default_tracked() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Maintain `createdAt`/`updatedAt` on every feature.
    #[serde(default = "default_tracked")]
    pub tracked: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { tracked: true }
    }
}

/// Entry of a [`FeatureStore::create`] batch.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeature {
    pub geometry: StoreGeometry,
    pub properties: Option<Properties>,
}

impl NewFeature {
    pub fn new(geometry: StoreGeometry) -> Self {
        Self {
            geometry,
            properties: None,
        }
    }

    pub fn with_properties(geometry: StoreGeometry, properties: Properties) -> Self {
        Self {
            geometry,
            properties: Some(properties),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryUpdate {
    pub id: FeatureId,
    pub geometry: StoreGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub id: FeatureId,
    pub property: String,
    pub value: JsonValue,
}

/// In-memory feature store.
///
/// Parameters:
/// - `I`: the spatial index strategy, an R-tree by default.
pub struct FeatureStore<I: SpatialIndex = RTreeIndex> {
    features: HashMap<FeatureId, StoreFeature>,
    index: I,
    tracked: bool,
    notifier: ChangeNotifier<FeatureStore<I>>,
}

impl FeatureStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_index(config, RTreeIndex::new())
    }

    /// Create a store holding `data`, validated with [`validation::is_valid_store_feature`].
    pub fn with_data(config: StoreConfig, data: &[JsonValue]) -> StoreResult<Self> {
        let mut store = Self::new(config);
        store.load(data, Some(&validation::is_valid_store_feature))?;
        Ok(store)
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl<I: SpatialIndex> fmt::Debug for FeatureStore<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureStore")
            .field("size", &self.features.len())
            .field("tracked", &self.tracked)
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl<I: SpatialIndex> FeatureStore<I> {
    /// Create an empty store using the given index strategy. The index must be empty.
    pub fn with_index(config: StoreConfig, mut index: I) -> Self {
        index.clear();
        Self {
            features: HashMap::new(),
            index,
            tracked: config.tracked,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    pub fn has(&self, id: &str) -> bool {
        self.features.contains_key(id)
    }

    pub fn size(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Add new features, each under a fresh id. Ids are returned in input order.
    ///
    /// Geometries are trusted as given; [`FeatureStore::load`] is the entry point for
    /// external data. In tracked mode numeric `createdAt`/`updatedAt` supplied by the
    /// caller are kept, anything else is stamped with the current time.
    pub fn create(&mut self, features: Vec<NewFeature>) -> Vec<FeatureId> {
        let now = now_millis();
        let mut ids = Vec::with_capacity(features.len());
        for NewFeature {
            geometry,
            properties,
        } in features
        {
            let mut properties = properties.unwrap_or_default();
            if self.tracked {
                timestamps::stamp_created(&mut properties, now);
            }

            let feature = StoreFeature {
                id: new_feature_id(),
                geometry,
                properties,
            };
            self.index.insert(&feature);
            ids.push(feature.id.clone());
            self.features.insert(feature.id.clone(), feature);
        }

        log::debug!("Created {} features", ids.len());
        self.notify(&ids, ChangeKind::Create);
        ids
    }

    /// Ingest untrusted exchange-format features, e.g. a restored document.
    ///
    /// Input values are copied, never retained. Missing ids are generated, and in
    /// tracked mode missing timestamps default to now while supplied ones must be
    /// numbers. `validator`, when given, sees each feature after those defaults.
    /// Ingestion is all-or-nothing: the first failure aborts the call before any
    /// feature is committed. On success a single `create` notification carries every
    /// loaded id; a loaded id already present replaces the stored feature.
    pub fn load(
        &mut self,
        data: &[JsonValue],
        validator: Option<&FeatureValidator>,
    ) -> StoreResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let now = now_millis();
        let mut staged = Vec::with_capacity(data.len());
        for raw in data {
            let mut raw = raw.clone();
            self.apply_load_defaults(&mut raw, now)?;
            if let Some(validator) = validator {
                match validator(&raw) {
                    Ok(true) => {}
                    Ok(false) => {
                        return Err(StoreError::RejectedFeature {
                            id: describe_id(&raw),
                            contents: raw.to_string(),
                        })
                    }
                    Err(source) => {
                        return Err(StoreError::InvalidFeature {
                            id: describe_id(&raw),
                            source,
                        })
                    }
                }
            }
            staged.push(StoreFeature::try_from(raw)?);
        }

        let mut changes: Vec<FeatureId> = Vec::with_capacity(staged.len());
        let mut seen = HashSet::new();
        for feature in staged {
            if seen.insert(feature.id.clone()) {
                if self.features.contains_key(&feature.id) {
                    log::warn!("Loaded feature {} replaces a stored one", feature.id);
                    self.index.remove(&feature.id);
                }
                changes.push(feature.id.clone());
            }
            self.features.insert(feature.id.clone(), feature);
        }
        self.index
            .load(changes.iter().filter_map(|id| self.features.get(id)));

        log::debug!("Loaded {} features", changes.len());
        self.notify(&changes, ChangeKind::Create);
        Ok(())
    }

    fn apply_load_defaults(&self, raw: &mut JsonValue, now: i64) -> StoreResult<()> {
        let Some(object) = raw.as_object_mut() else {
            return Ok(());
        };

        let has_id = match object.get("id") {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::String(id)) => !id.is_empty(),
            Some(_) => true,
        };
        if !has_id {
            object.insert("id".to_string(), JsonValue::String(new_feature_id()));
        }
        let id = describe_id(raw);

        if !self.tracked {
            return Ok(());
        }
        if let Some(JsonValue::Object(properties)) = raw.get_mut("properties") {
            for key in [CREATED_AT, UPDATED_AT] {
                match properties.get(key) {
                    None | Some(JsonValue::Null) => {
                        properties.insert(key.to_string(), JsonValue::from(now));
                    }
                    Some(timestamp) => validation::validate_timestamp(timestamp).map_err(
                        |source| StoreError::InvalidFeature {
                            id: id.clone(),
                            source,
                        },
                    )?,
                }
            }
        }
        Ok(())
    }

    /// Features whose envelope intersects the envelope of `bbox`, copied.
    pub fn search(&self, bbox: &StoreGeometry) -> Vec<StoreFeature> {
        self.search_filtered(bbox, |_| true)
    }

    /// Like [`FeatureStore::search`], keeping only candidates accepted by `filter`.
    pub fn search_filtered<F>(&self, bbox: &StoreGeometry, filter: F) -> Vec<StoreFeature>
    where
        F: Fn(&StoreFeature) -> bool,
    {
        let Some(envelope) = bbox.envelope() else {
            return Vec::new();
        };
        self.index
            .search(&envelope)
            .iter()
            .filter_map(|id| self.features.get(id))
            .filter(|feature| filter(feature))
            .cloned()
            .collect()
    }

    fn get(&self, id: &str, operation: &'static str) -> StoreResult<&StoreFeature> {
        self.features.get(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
            operation,
        })
    }

    pub fn get_geometry_copy(&self, id: &str) -> StoreResult<StoreGeometry> {
        Ok(self.get(id, "get geometry copy")?.geometry.clone())
    }

    pub fn get_properties_copy(&self, id: &str) -> StoreResult<Properties> {
        Ok(self.get(id, "get properties copy")?.properties.clone())
    }

    pub fn get_feature_copy(&self, id: &str) -> StoreResult<StoreFeature> {
        self.get(id, "get feature copy").cloned()
    }

    fn ensure_all_present<'a, T>(&self, ids: T, operation: &'static str) -> StoreResult<()>
    where
        T: IntoIterator<Item = &'a FeatureId>,
    {
        for id in ids {
            self.get(id, operation)?;
        }
        Ok(())
    }

    /// Replace geometries. One `update` notification carries every id, in input order.
    pub fn update_geometry(&mut self, updates: Vec<GeometryUpdate>) -> StoreResult<()> {
        self.ensure_all_present(updates.iter().map(|update| &update.id), "update geometry")?;

        let now = now_millis();
        let mut ids = Vec::with_capacity(updates.len());
        for GeometryUpdate { id, geometry } in updates {
            if let Some(feature) = self.features.get_mut(&id) {
                feature.geometry = geometry;
                self.index.update(feature);
                if self.tracked {
                    timestamps::touch(&mut feature.properties, now);
                }
            }
            ids.push(id);
        }

        log::debug!("Updated geometry of {} features", ids.len());
        self.notify(&ids, ChangeKind::Update);
        Ok(())
    }

    /// Set one property per entry. One `update` notification carries every id, in input order.
    pub fn update_property(&mut self, updates: Vec<PropertyUpdate>) -> StoreResult<()> {
        self.ensure_all_present(updates.iter().map(|update| &update.id), "update property")?;

        let now = now_millis();
        let mut ids = Vec::with_capacity(updates.len());
        for PropertyUpdate {
            id,
            property,
            value,
        } in updates
        {
            if let Some(feature) = self.features.get_mut(&id) {
                feature.properties.insert(property, value);
                if self.tracked {
                    timestamps::touch(&mut feature.properties, now);
                }
            }
            ids.push(id);
        }

        log::debug!("Updated properties of {} features", ids.len());
        self.notify(&ids, ChangeKind::Update);
        Ok(())
    }

    /// Remove features from the map and the index.
    ///
    /// An id repeated within `ids` counts as missing the second time.
    pub fn delete(&mut self, ids: &[FeatureId]) -> StoreResult<()> {
        let mut pending = HashSet::with_capacity(ids.len());
        for id in ids {
            if !self.features.contains_key(id) || !pending.insert(id) {
                return Err(StoreError::NotFound {
                    id: id.clone(),
                    operation: "delete",
                });
            }
        }

        for id in ids {
            self.features.remove(id);
            self.index.remove(id);
        }

        log::debug!("Deleted {} features", ids.len());
        self.notify(ids, ChangeKind::Delete);
        Ok(())
    }

    /// Copies of every feature, in no particular order.
    pub fn copy_all(&self) -> Vec<StoreFeature> {
        self.features.values().cloned().collect()
    }

    /// Empty the store and its index. No notification is emitted.
    pub fn clear(&mut self) {
        self.features.clear();
        self.index.clear();
    }

    /// Install `handler` as the only change handler, dropping any previous one.
    ///
    /// Handlers run synchronously after the batch is committed and get the store as it
    /// is then. They can read from it but have no way to mutate it.
    pub fn register_on_change<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&[FeatureId], ChangeKind, &FeatureStore<I>) + 'static,
    {
        self.notifier.replace(handler)
    }

    /// Add a change handler next to the existing ones.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&[FeatureId], ChangeKind, &FeatureStore<I>) + 'static,
    {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.notifier.unsubscribe(subscription)
    }

    /// Deliver a `styling` notification on behalf of an external producer.
    pub fn emit_styling(&mut self, ids: &[FeatureId]) {
        self.notify(ids, ChangeKind::Styling);
    }

    fn notify(&mut self, ids: &[FeatureId], kind: ChangeKind) {
        // Handlers borrow the store, so the notifier is moved out for the duration.
        let notifier = std::mem::take(&mut self.notifier);
        let mut dispatch = Dispatch {
            store: self,
            notifier,
        };
        dispatch.notifier.notify(ids, kind, &*dispatch.store);
    }

    #[cfg(test)]
    fn index(&self) -> &I {
        &self.index
    }
}

/// Puts the notifier back into the store once dispatch ends, unwinding included.
struct Dispatch<'a, I: SpatialIndex> {
    store: &'a mut FeatureStore<I>,
    notifier: ChangeNotifier<FeatureStore<I>>,
}

impl<I: SpatialIndex> Drop for Dispatch<'_, I> {
    fn drop(&mut self) {
        std::mem::swap(&mut self.store.notifier, &mut self.notifier);
    }
}
