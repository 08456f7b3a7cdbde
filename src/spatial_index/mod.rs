//! Secondary index over feature envelopes.
//!
//! The store keeps one [`SpatialIndex`] in lockstep with its primary map. Searches
//! are broad-phase only: an id is returned when its envelope intersects the query
//! envelope, exact geometric tests are left to the caller.

pub mod linear_index;
pub mod rtree_index;

pub use linear_index::LinearIndex;
pub use rtree_index::RTreeIndex;

use crate::feature::{Envelope, FeatureId, StoreFeature};

/// Bounding-box index strategy used by [`crate::store::FeatureStore`].
///
/// The store guarantees that `insert` is only called for ids not yet indexed and
/// `update`/`remove` only for ids that are.
pub trait SpatialIndex: Default {
    /// Bulk-index features that are not yet present. Existing entries are kept.
    fn load<'a, T>(&mut self, features: T)
    where
        T: IntoIterator<Item = &'a StoreFeature>;

    fn insert(&mut self, feature: &StoreFeature);

    /// Reposition the envelope of an already indexed feature.
    fn update(&mut self, feature: &StoreFeature);

    fn remove(&mut self, id: &str);

    /// Ids whose envelope intersects `envelope`, in index-defined order.
    fn search(&self, envelope: &Envelope) -> Vec<FeatureId>;

    fn clear(&mut self);

    /// Whether `id` is tracked, including features without coordinates.
    fn contains(&self, id: &str) -> bool;

    /// Number of tracked ids.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inclusive rectangle intersection, touching edges count.
pub fn envelopes_intersect(a: &Envelope, b: &Envelope) -> bool {
    a.min().x <= b.max().x
        && a.max().x >= b.min().x
        && a.min().y <= b.max().y
        && a.max().y >= b.min().y
}
