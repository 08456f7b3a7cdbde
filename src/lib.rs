//! In-memory feature store with a spatial index, validation of untrusted
//! GeoJSON-like input, tracked timestamps and change notifications.

pub mod error;
pub mod feature;
pub mod geofile;
pub mod inspect;
pub mod notifier;
pub mod spatial_index;
pub mod store;
pub mod validation;

pub use error::{StoreError, StoreResult};
pub use feature::{FeatureId, JsonValue, Properties, StoreFeature, StoreGeometry};
pub use notifier::{ChangeKind, SubscriptionId};
pub use store::{FeatureStore, GeometryUpdate, NewFeature, PropertyUpdate, StoreConfig};
pub use validation::ValidationError;
