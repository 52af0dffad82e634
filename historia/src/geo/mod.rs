//! GeoJSON sanitizing for map layers.
//!
//! Raw feature collections come from the same loosely typed search API as the
//! result payloads. Before they reach a renderer the collection is checked as a
//! whole (any structural fault yields an empty, correctly tagged collection), then
//! feature by feature (faulty features are dropped and logged). Nothing here fails
//! hard: the render pipeline always receives a well formed collection.

mod geometry;

pub use geometry::{GeometryKind, coerce_coordinates};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::normalizers::{is_truthy, truthy_field};

/// Source identifier assigned when the caller does not supply one.
pub const DEFAULT_SOURCE_ID: &str = "search-source";

/// Options for [`GeoFeatureSanitizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeOptions {
    /// Identifier stamped on the collection when it has none.
    #[serde(default = "default_source_id")]
    pub source_id: String,
    /// Year written into features whose `year` property is missing or empty.
    /// Without one, such features get an explicit `null` year.
    #[serde(default)]
    pub inject_year: Option<i64>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            source_id: default_source_id(),
            inject_year: None,
        }
    }
}

fn default_source_id() -> String {
    DEFAULT_SOURCE_ID.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    #[serde(rename = "geojson")]
    GeoJson,
}

/// Layer descriptor handed to the map renderer: `{"type": "geojson", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub data: Value,
}

impl MapSource {
    pub fn geojson(data: Value) -> Self {
        Self {
            kind: SourceKind::GeoJson,
            data,
        }
    }

    /// Features in the sanitized collection.
    pub fn features(&self) -> &[Value] {
        self.data
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn source_id(&self) -> Option<&str> {
        self.data.get("id").and_then(Value::as_str)
    }
}

/// Collection level faults. Any of these replaces the whole collection with an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum RejectReason {
    #[error("invalid GeoJSON type, expected FeatureCollection")]
    NotFeatureCollection,
    #[error("no features found in GeoJSON data")]
    NoFeatures,
    #[error("some features are not valid GeoJSON features")]
    NotAFeature,
    #[error("some features are missing geometry or properties")]
    MissingGeometryOrProperties,
    #[error("some features have properties that are not an object")]
    InvalidProperties,
}

/// Feature level faults. The feature is dropped and the rest of the collection continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum DropReason {
    #[error("feature is missing")]
    MissingFeature,
    #[error("feature is missing geometry or properties")]
    MissingGeometryOrProperties,
    #[error("geometry type {0:?} is invalid or missing")]
    UnsupportedGeometry(Option<String>),
    #[error("geometry coordinates are invalid or missing")]
    InvalidCoordinates,
    #[error("{kind} geometry must have {}", .kind.requirement())]
    Structure { kind: GeometryKind },
    #[error("geometry coordinates contain a non-numeric value")]
    NonNumericCoordinate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedFeature {
    pub index: usize,
    pub reason: DropReason,
}

/// What happened to a collection during one sanitize call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    pub rejected: Option<RejectReason>,
    pub kept: usize,
    pub dropped: Vec<DroppedFeature>,
    /// Features whose non-object properties were replaced with `{}`.
    pub repaired: Vec<usize>,
}

/// Validates and normalizes raw feature collections for a map layer.
#[derive(Debug, Clone, Default)]
pub struct GeoFeatureSanitizer {
    options: SanitizeOptions,
}

impl GeoFeatureSanitizer {
    pub fn new(options: SanitizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SanitizeOptions {
        &self.options
    }

    pub fn sanitize(&self, raw: Value) -> MapSource {
        self.sanitize_with_report(raw).0
    }

    pub fn sanitize_with_report(&self, raw: Value) -> (MapSource, SanitizeReport) {
        let mut report = SanitizeReport::default();

        let (mut collection, features) = match split_collection(raw) {
            Ok(parts) => parts,
            Err(reason) => {
                log::warn!("{reason}");
                report.rejected = Some(reason);
                return (MapSource::geojson(self.empty_collection()), report);
            }
        };

        if !collection.get("id").is_some_and(is_truthy) {
            collection.insert("id".to_string(), Value::String(self.options.source_id.clone()));
        }

        let year = self.options.inject_year.map_or(Value::Null, Value::from);
        let mut kept = Vec::with_capacity(features.len());
        for (index, mut feature) in features.into_iter().enumerate() {
            inject_year(&mut feature, &year);
            match sanitize_feature(feature) {
                Ok((feature, repaired)) => {
                    if repaired {
                        log::warn!("feature {index}: properties are not an object, converted to an empty object");
                        report.repaired.push(index);
                    }
                    kept.push(feature);
                }
                Err(reason) => {
                    log::warn!("skipping feature {index}: {reason}");
                    report.dropped.push(DroppedFeature { index, reason });
                }
            }
        }

        report.kept = kept.len();
        log::debug!(
            "sanitized feature collection: {} kept, {} dropped",
            report.kept,
            report.dropped.len()
        );
        collection.insert("features".to_string(), Value::Array(kept));
        (MapSource::geojson(Value::Object(collection)), report)
    }

    fn empty_collection(&self) -> Value {
        json!({
            "id": self.options.source_id,
            "type": "FeatureCollection",
            "features": [],
        })
    }
}

/// Sanitizes `raw` with the default source id and no injected year.
pub fn sanitize(raw: Value) -> MapSource {
    GeoFeatureSanitizer::default().sanitize(raw)
}

fn split_collection(raw: Value) -> Result<(Map<String, Value>, Vec<Value>), RejectReason> {
    if raw.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(RejectReason::NotFeatureCollection);
    }
    let Value::Object(mut collection) = raw else {
        return Err(RejectReason::NotFeatureCollection);
    };

    let features = match collection.remove("features") {
        Some(Value::Array(features)) if !features.is_empty() => features,
        _ => return Err(RejectReason::NoFeatures),
    };

    if !features
        .iter()
        .all(|feature| feature.get("type").and_then(Value::as_str) == Some("Feature"))
    {
        return Err(RejectReason::NotAFeature);
    }
    if !features.iter().all(|feature| {
        truthy_field(feature, "geometry").is_some() && truthy_field(feature, "properties").is_some()
    }) {
        return Err(RejectReason::MissingGeometryOrProperties);
    }
    if !features.iter().all(|feature| feature["properties"].is_object()) {
        return Err(RejectReason::InvalidProperties);
    }

    Ok((collection, features))
}

fn inject_year(feature: &mut Value, year: &Value) {
    let Some(properties) = feature.get_mut("properties").and_then(Value::as_object_mut) else {
        return;
    };
    if !properties.get("year").is_some_and(is_truthy) {
        properties.insert("year".to_string(), year.clone());
    }
}

/// Validates one feature and normalizes its coordinates.
///
/// Returns the feature and whether its properties had to be replaced.
fn sanitize_feature(mut feature: Value) -> Result<(Value, bool), DropReason> {
    if !feature.is_object() {
        return Err(DropReason::MissingFeature);
    }
    if truthy_field(&feature, "geometry").is_none() || truthy_field(&feature, "properties").is_none() {
        return Err(DropReason::MissingGeometryOrProperties);
    }

    // Non-object properties are repaired here even though the collection check rejects them.
    let repaired = !feature["properties"].is_object();
    if repaired {
        feature["properties"] = Value::Object(Map::new());
    }

    let geometry = &mut feature["geometry"];
    let type_name = geometry.get("type").and_then(Value::as_str);
    let Some(kind) = type_name.and_then(GeometryKind::from_name) else {
        return Err(DropReason::UnsupportedGeometry(type_name.map(str::to_owned)));
    };

    let coordinates = match geometry.get("coordinates") {
        Some(Value::Array(coordinates)) if !coordinates.iter().any(Value::is_null) => coordinates,
        _ => return Err(DropReason::InvalidCoordinates),
    };
    if !kind.has_valid_structure(coordinates) {
        return Err(DropReason::Structure { kind });
    }

    let coerced = coerce_coordinates(coordinates).ok_or(DropReason::NonNumericCoordinate)?;
    geometry["coordinates"] = Value::Array(coerced);
    Ok((feature, repaired))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(coordinates: Value) -> Value {
        json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": coordinates}, "properties": {}})
    }

    #[test]
    fn string_point_coordinates_become_numbers() {
        let raw = json!({"type": "FeatureCollection", "features": [point(json!(["10", "20"]))]});
        let source = sanitize(raw);
        assert_eq!(source.features().len(), 1);
        assert_eq!(source.features()[0]["geometry"]["coordinates"], json!([10.0, 20.0]));
        assert_eq!(source.source_id(), Some(DEFAULT_SOURCE_ID));
    }

    #[test]
    fn existing_collection_id_is_kept() {
        let raw = json!({"id": "parcels", "type": "FeatureCollection", "features": [point(json!([1, 2]))]});
        assert_eq!(sanitize(raw).source_id(), Some("parcels"));
    }

    #[test]
    fn year_injected_only_where_missing() {
        let mut dated = point(json!([0, 0]));
        dated["properties"]["year"] = json!(1850);
        let raw = json!({"type": "FeatureCollection", "features": [dated, point(json!([1, 1]))]});
        let sanitizer = GeoFeatureSanitizer::new(SanitizeOptions {
            inject_year: Some(1900),
            ..SanitizeOptions::default()
        });
        let source = sanitizer.sanitize(raw);
        assert_eq!(source.features()[0]["properties"]["year"], json!(1850));
        assert_eq!(source.features()[1]["properties"]["year"], json!(1900));
    }

    #[test]
    fn missing_inject_year_writes_null() {
        let raw = json!({"type": "FeatureCollection", "features": [point(json!([1, 1]))]});
        let source = sanitize(raw);
        let properties = source.features()[0]["properties"].as_object().unwrap();
        assert_eq!(properties.get("year"), Some(&Value::Null));
    }

    #[test]
    fn sanitize_feature_repairs_scalar_properties() {
        let feature = json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}, "properties": "x"});
        let (feature, repaired) = sanitize_feature(feature).unwrap();
        assert!(repaired);
        assert_eq!(feature["properties"], json!({}));
    }

    #[test]
    fn drop_reasons_are_specific() {
        let unknown = json!({"type": "Feature", "geometry": {"type": "Circle", "coordinates": [1, 2]}, "properties": {}});
        assert_eq!(
            sanitize_feature(unknown).unwrap_err(),
            DropReason::UnsupportedGeometry(Some("Circle".to_string()))
        );
        assert_eq!(sanitize_feature(point(json!([1, null]))).unwrap_err(), DropReason::InvalidCoordinates);
        assert_eq!(sanitize_feature(point(json!("1,2"))).unwrap_err(), DropReason::InvalidCoordinates);
        assert_eq!(
            sanitize_feature(point(json!(["north", 2]))).unwrap_err(),
            DropReason::NonNumericCoordinate
        );
        assert_eq!(
            sanitize_feature(point(json!([1]))).unwrap_err(),
            DropReason::Structure {
                kind: GeometryKind::Point
            }
        );
    }

    #[test]
    fn drop_reason_messages_name_the_rule() {
        let reason = DropReason::Structure {
            kind: GeometryKind::LineString,
        };
        assert_eq!(reason.to_string(), "LineString geometry must have at least two coordinate pairs");
    }
}
