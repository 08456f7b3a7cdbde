use geo::Intersects;
use serde::{Deserialize, Serialize};

use super::JsonValue;

/// Axis-aligned minimum bounding rectangle of a geometry's coordinates.
pub type Envelope = geo::Rect<f64>;

/// Coordinate pair, `[x, y]`.
pub type Position = [f64; 2];

/// Geometries supported by the store.
///
/// Serialized as `{ "type": ..., "coordinates": ... }`, like GeoJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum StoreGeometry {
    Point(Position),
    LineString(Vec<Position>),
    /// Linear rings, the first one being the exterior.
    Polygon(Vec<Vec<Position>>),
}

impl StoreGeometry {
    /// Closed rectangular polygon spanning the given corners, usable as a search query.
    pub fn bbox_polygon(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        StoreGeometry::Polygon(vec![vec![
            [min_x, min_y],
            [max_x, min_y],
            [max_x, max_y],
            [min_x, max_y],
            [min_x, min_y],
        ]])
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StoreGeometry::Point(_) => "Point",
            StoreGeometry::LineString(_) => "LineString",
            StoreGeometry::Polygon(_) => "Polygon",
        }
    }

    /// All coordinate pairs, flattened across rings.
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            StoreGeometry::Point(position) => Box::new(std::iter::once(position)),
            StoreGeometry::LineString(positions) => Box::new(positions.iter()),
            StoreGeometry::Polygon(rings) => Box::new(rings.iter().flatten()),
        }
    }

    /// Envelope over every coordinate pair.
    ///
    /// `None` if the geometry has no coordinates or any coordinate is NaN or infinite,
    /// such a geometry never matches a search.
    pub fn envelope(&self) -> Option<Envelope> {
        if self.positions().flatten().any(|value| !value.is_finite()) {
            return None;
        }
        let mut positions = self.positions();
        let first = positions.next()?;
        let (min, max) = positions.fold((*first, *first), |(min, max), [x, y]| {
            ([min[0].min(*x), min[1].min(*y)], [max[0].max(*x), max[1].max(*y)])
        });
        Some(geo::Rect::new(
            geo::Coord {
                x: min[0],
                y: min[1],
            },
            geo::Coord {
                x: max[0],
                y: max[1],
            },
        ))
    }

    /// Exact geometric intersection test, as opposed to the envelope-only broad phase.
    pub fn intersects_exactly(&self, other: &StoreGeometry) -> bool {
        geo::Geometry::from(self).intersects(&geo::Geometry::from(other))
    }

    pub fn to_json(&self) -> JsonValue {
        let coordinates = match self {
            StoreGeometry::Point(position) => position_to_json(position),
            StoreGeometry::LineString(positions) => line_to_json(positions),
            StoreGeometry::Polygon(rings) => {
                JsonValue::Array(rings.iter().map(|ring| line_to_json(ring)).collect())
            }
        };
        serde_json::json!({ "type": self.type_name(), "coordinates": coordinates })
    }
}

fn position_to_json(position: &Position) -> JsonValue {
    JsonValue::Array(position.iter().map(|value| JsonValue::from(*value)).collect())
}

fn line_to_json(positions: &[Position]) -> JsonValue {
    JsonValue::Array(positions.iter().map(position_to_json).collect())
}

fn to_line_string(positions: &[Position]) -> geo::LineString {
    positions.iter().map(|[x, y]| (*x, *y)).collect::<Vec<_>>().into()
}

impl From<&StoreGeometry> for geo::Geometry {
    fn from(geometry: &StoreGeometry) -> Self {
        match geometry {
            StoreGeometry::Point([x, y]) => geo::Geometry::Point(geo::Point::new(*x, *y)),
            StoreGeometry::LineString(positions) => {
                geo::Geometry::LineString(to_line_string(positions))
            }
            StoreGeometry::Polygon(rings) => {
                let mut rings = rings.iter().map(|ring| to_line_string(ring));
                let exterior = rings.next().unwrap_or_else(|| geo::LineString::new(vec![]));
                geo::Geometry::Polygon(geo::Polygon::new(exterior, rings.collect()))
            }
        }
    }
}

impl From<&StoreGeometry> for geojson::Geometry {
    fn from(geometry: &StoreGeometry) -> Self {
        let to_positions = |positions: &[Position]| -> Vec<Vec<f64>> {
            positions.iter().map(|position| position.to_vec()).collect()
        };
        let value = match geometry {
            StoreGeometry::Point(position) => geojson::Value::Point(position.to_vec()),
            StoreGeometry::LineString(positions) => {
                geojson::Value::LineString(to_positions(positions))
            }
            StoreGeometry::Polygon(rings) => {
                geojson::Value::Polygon(rings.iter().map(|ring| to_positions(ring)).collect())
            }
        };
        geojson::Geometry::new(value)
    }
}
