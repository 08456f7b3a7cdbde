use std::collections::HashMap;

use crate::feature::{Envelope, FeatureId, StoreFeature};

use super::{envelopes_intersect, SpatialIndex};

/// Brute-force [`SpatialIndex`] that scans every envelope on search.
///
/// Fine for small stores, and a reference for the R-tree in tests.
#[derive(Debug, Default)]
pub struct LinearIndex {
    envelopes: HashMap<FeatureId, Option<Envelope>>,
}

impl SpatialIndex for LinearIndex {
    fn load<'a, T>(&mut self, features: T)
    where
        T: IntoIterator<Item = &'a StoreFeature>,
    {
        for feature in features {
            self.insert(feature);
        }
    }

    fn insert(&mut self, feature: &StoreFeature) {
        self.envelopes
            .insert(feature.id.clone(), feature.geometry.envelope());
    }

    fn update(&mut self, feature: &StoreFeature) {
        self.insert(feature);
    }

    fn remove(&mut self, id: &str) {
        self.envelopes.remove(id);
    }

    fn search(&self, envelope: &Envelope) -> Vec<FeatureId> {
        self.envelopes
            .iter()
            .filter_map(|(id, candidate)| match candidate {
                Some(candidate) if envelopes_intersect(candidate, envelope) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    fn clear(&mut self) {
        self.envelopes.clear();
    }

    fn contains(&self, id: &str) -> bool {
        self.envelopes.contains_key(id)
    }

    fn len(&self) -> usize {
        self.envelopes.len()
    }
}
