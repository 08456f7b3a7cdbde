use std::collections::HashMap;

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use crate::feature::{Envelope, FeatureId, StoreFeature};

use super::SpatialIndex;

type IndexedEnvelope = GeomWithData<Rectangle<[f64; 2]>, FeatureId>;

fn to_indexed(id: &str, envelope: &Envelope) -> IndexedEnvelope {
    IndexedEnvelope::new(
        Rectangle::from_corners(
            [envelope.min().x, envelope.min().y],
            [envelope.max().x, envelope.max().y],
        ),
        id.to_string(),
    )
}

/// R-tree backed [`SpatialIndex`], the default strategy of the store.
///
/// Envelopes are kept per id next to the tree so removals can locate the exact tree entry.
#[derive(Default)]
pub struct RTreeIndex {
    rtree: RTree<IndexedEnvelope>,
    envelopes: HashMap<FeatureId, Option<Envelope>>,
}

impl RTreeIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for RTreeIndex {
    fn load<'a, T>(&mut self, features: T)
    where
        T: IntoIterator<Item = &'a StoreFeature>,
    {
        let mut entries: Vec<IndexedEnvelope> = Vec::new();
        for feature in features {
            let envelope = feature.geometry.envelope();
            if let Some(envelope) = &envelope {
                entries.push(to_indexed(&feature.id, envelope));
            }
            self.envelopes.insert(feature.id.clone(), envelope);
        }
        if entries.is_empty() {
            return;
        }

        // Bulk loading builds a new tree, so existing entries are folded in.
        log::trace!(
            "Bulk loading {} envelopes next to {} indexed ones",
            entries.len(),
            self.rtree.size()
        );
        entries.extend(self.rtree.iter().cloned());
        self.rtree = RTree::bulk_load(entries);
    }

    fn insert(&mut self, feature: &StoreFeature) {
        let envelope = feature.geometry.envelope();
        if let Some(envelope) = &envelope {
            self.rtree.insert(to_indexed(&feature.id, envelope));
        }
        self.envelopes.insert(feature.id.clone(), envelope);
    }

    fn update(&mut self, feature: &StoreFeature) {
        self.remove(&feature.id);
        self.insert(feature);
    }

    fn remove(&mut self, id: &str) {
        if let Some(Some(envelope)) = self.envelopes.remove(id) {
            if self.rtree.remove(&to_indexed(id, &envelope)).is_none() {
                log::warn!("Envelope of {} was tracked but missing from the R-tree", id);
            }
        }
    }

    fn search(&self, envelope: &Envelope) -> Vec<FeatureId> {
        let query = AABB::from_corners(
            [envelope.min().x, envelope.min().y],
            [envelope.max().x, envelope.max().y],
        );
        self.rtree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.data.clone())
            .collect()
    }

    fn clear(&mut self) {
        self.rtree = RTree::new();
        self.envelopes.clear();
    }

    fn contains(&self, id: &str) -> bool {
        self.envelopes.contains_key(id)
    }

    fn len(&self) -> usize {
        self.envelopes.len()
    }
}
