use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::normalizers::coerce_f64;

/// Geometry types a map layer can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 6] = [
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
        GeometryKind::MultiPoint,
        GeometryKind::MultiLineString,
        GeometryKind::MultiPolygon,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
        }
    }

    /// Minimum structure each geometry type needs before it can be drawn.
    pub fn requirement(self) -> &'static str {
        match self {
            GeometryKind::Point => "exactly two scalar coordinates",
            GeometryKind::LineString => "at least two coordinate pairs",
            GeometryKind::Polygon => "at least one ring",
            GeometryKind::MultiPoint => "exactly two values in every point",
            GeometryKind::MultiLineString => "at least two coordinate pairs in every line",
            GeometryKind::MultiPolygon => "at least one ring in every polygon",
        }
    }

    /// Checks `coordinates` against [`GeometryKind::requirement`].
    pub fn has_valid_structure(self, coordinates: &[Value]) -> bool {
        match self {
            GeometryKind::Point => coordinates.len() == 2 && coordinates.iter().all(is_scalar),
            GeometryKind::LineString => coordinates.len() >= 2 && coordinates.iter().all(Value::is_array),
            GeometryKind::Polygon => !coordinates.is_empty() && coordinates.iter().all(Value::is_array),
            GeometryKind::MultiPoint => coordinates.iter().all(|point| array_len(point) == Some(2)),
            GeometryKind::MultiLineString => {
                coordinates.iter().all(|line| array_len(line).is_some_and(|len| len >= 2))
            }
            GeometryKind::MultiPolygon => {
                coordinates.iter().all(|polygon| array_len(polygon).is_some_and(|len| len >= 1))
            }
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rewrites every coordinate leaf as a floating point number.
///
/// Nested arrays are walked to any depth, so line, ring and polygon nesting all
/// come out uniform. Returns `None` if any leaf is not a finite number.
pub fn coerce_coordinates(coordinates: &[Value]) -> Option<Vec<Value>> {
    coordinates.iter().map(coerce_leaf).collect()
}

fn coerce_leaf(value: &Value) -> Option<Value> {
    match value {
        Value::Array(items) => coerce_coordinates(items).map(Value::Array),
        scalar => coerce_f64(scalar).and_then(Number::from_f64).map(Value::Number),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_) | Value::Null)
}

fn array_len(value: &Value) -> Option<usize> {
    value.as_array().map(Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coords(value: Value) -> Vec<Value> {
        value.as_array().cloned().unwrap()
    }

    #[test]
    fn names_round_trip() {
        for kind in GeometryKind::ALL {
            assert_eq!(GeometryKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(GeometryKind::from_name("GeometryCollection"), None);
    }

    #[test]
    fn point_needs_two_scalars() {
        assert!(GeometryKind::Point.has_valid_structure(&coords(json!([1, 2]))));
        assert!(GeometryKind::Point.has_valid_structure(&coords(json!(["1", "2"]))));
        assert!(!GeometryKind::Point.has_valid_structure(&coords(json!([1, 2, 3]))));
        assert!(!GeometryKind::Point.has_valid_structure(&coords(json!([[1, 2], [3, 4]]))));
    }

    #[test]
    fn line_and_polygon_minimums() {
        assert!(!GeometryKind::LineString.has_valid_structure(&coords(json!([[0, 0]]))));
        assert!(GeometryKind::LineString.has_valid_structure(&coords(json!([[0, 0], [1, 1]]))));
        assert!(!GeometryKind::Polygon.has_valid_structure(&[]));
        assert!(GeometryKind::Polygon.has_valid_structure(&coords(json!([[[0, 0], [1, 0], [0, 1], [0, 0]]]))));
    }

    #[test]
    fn multi_geometries_check_every_member() {
        assert!(GeometryKind::MultiPoint.has_valid_structure(&coords(json!([[0, 0], [1, 1]]))));
        assert!(!GeometryKind::MultiPoint.has_valid_structure(&coords(json!([[0, 0], [1]]))));
        assert!(!GeometryKind::MultiLineString.has_valid_structure(&coords(json!([[[0, 0], [1, 1]], [[2, 2]]]))));
        assert!(!GeometryKind::MultiPolygon.has_valid_structure(&coords(json!([[[[0, 0]]], []]))));
    }

    #[test]
    fn coercion_walks_every_level() {
        let polygon = coords(json!([[["0", 0], [1.5, "2"], [0, 0]]]));
        assert_eq!(
            coerce_coordinates(&polygon).unwrap(),
            coords(json!([[[0.0, 0.0], [1.5, 2.0], [0.0, 0.0]]]))
        );
        assert!(coerce_coordinates(&coords(json!([["x", 1]]))).is_none());
    }
}
