//! Payload decoding: JSON address lists and GeoJSON feature collections

use canvass_common::AddressRecord;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::repair::repair_json;
use super::SourceError;

/// Decode a source body into raw address records.
///
/// A body that does not parse gets exactly one repair attempt. Accepted
/// shapes are an array of address objects, a single address object, a
/// GeoJSON `FeatureCollection`, or an array mixing address objects and
/// GeoJSON features. An empty result is reported as [`SourceError::Empty`].
pub fn parse_payload(body: &str) -> Result<Vec<AddressRecord>, SourceError> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(first_err) => {
            debug!(error = %first_err, "Payload did not parse, attempting repair");
            let repaired = repair_json(body).ok_or_else(|| {
                SourceError::Malformed(format!("unrepairable payload: {}", first_err))
            })?;
            serde_json::from_str::<Value>(&repaired)
                .map_err(|e| SourceError::Malformed(format!("repair failed: {}", e)))?
        }
    };

    let records = records_from_value(value)?;
    if records.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(records)
}

fn records_from_value(value: Value) -> Result<Vec<AddressRecord>, SourceError> {
    match value {
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            let mut skipped = 0usize;
            for item in items {
                match item {
                    Value::Object(obj) if is_feature_collection(&obj) => {
                        records.extend(records_from_features(&obj));
                    }
                    Value::Object(obj) if is_feature(&obj) => {
                        let index = records.len();
                        records.push(record_from_feature(&obj, index));
                    }
                    Value::Object(obj) => match serde_json::from_value(Value::Object(obj)) {
                        Ok(record) => records.push(record),
                        Err(_) => skipped += 1,
                    },
                    _ => skipped += 1,
                }
            }
            if skipped > 0 {
                warn!(skipped, "Skipped non-object entries in address payload");
            }
            Ok(records)
        }
        Value::Object(obj) if is_feature_collection(&obj) => Ok(records_from_features(&obj)),
        Value::Object(obj) if is_feature(&obj) => Ok(vec![record_from_feature(&obj, 0)]),
        Value::Object(obj) => serde_json::from_value(Value::Object(obj))
            .map(|record| vec![record])
            .map_err(|e| SourceError::Malformed(e.to_string())),
        other => Err(SourceError::Malformed(format!(
            "expected a list of addresses, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn is_feature_collection(obj: &Map<String, Value>) -> bool {
    obj.get("features").is_some_and(Value::is_array)
        || obj.get("type").and_then(Value::as_str) == Some("FeatureCollection")
}

fn is_feature(obj: &Map<String, Value>) -> bool {
    obj.get("type").and_then(Value::as_str) == Some("Feature")
}

fn records_from_features(collection: &Map<String, Value>) -> Vec<AddressRecord> {
    collection
        .get("features")
        .and_then(Value::as_array)
        .map(|features| {
            features
                .iter()
                .filter_map(Value::as_object)
                .enumerate()
                .map(|(i, feature)| record_from_feature(feature, i))
                .collect()
        })
        .unwrap_or_default()
}

/// Map one GeoJSON feature onto an address record.
///
/// Properties use the same keys as the plain JSON payload. Coordinates come
/// from the geometry unless the properties already carry LAT/LON.
fn record_from_feature(feature: &Map<String, Value>, index: usize) -> AddressRecord {
    let mut record: AddressRecord = feature
        .get("properties")
        .filter(|p| p.is_object())
        .and_then(|p| serde_json::from_value(p.clone()).ok())
        .unwrap_or_default();

    if record.parcel_number.is_none() {
        record.parcel_number = Some(format!("GEO-{}", index));
    }

    if record.lat.is_none() || record.lon.is_none() {
        if let Some((lon, lat)) = feature.get("geometry").and_then(geometry_center) {
            record.lon = Some(lon);
            record.lat = Some(lat);
        }
    }

    record
}

/// `(lon, lat)` of a Point, or the vertex average of a (Multi)Polygon
pub fn geometry_center(geometry: &Value) -> Option<(f64, f64)> {
    let kind = geometry.get("type")?.as_str()?;
    let coords = geometry.get("coordinates")?;

    match kind {
        "Point" => position(coords),
        "Polygon" => vertex_average(coords.as_array()?.iter().flat_map(ring_positions)),
        "MultiPolygon" => vertex_average(
            coords
                .as_array()?
                .iter()
                .filter_map(Value::as_array)
                .flatten()
                .flat_map(ring_positions),
        ),
        _ => None,
    }
}

fn ring_positions(ring: &Value) -> Vec<(f64, f64)> {
    ring.as_array()
        .map(|points| points.iter().filter_map(position).collect())
        .unwrap_or_default()
}

fn position(point: &Value) -> Option<(f64, f64)> {
    let pair = point.as_array()?;
    let x = pair.first()?.as_f64()?;
    let y = pair.get(1)?.as_f64()?;
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

fn vertex_average(points: impl Iterator<Item = (f64, f64)>) -> Option<(f64, f64)> {
    let (mut x_sum, mut y_sum, mut count) = (0.0, 0.0, 0usize);
    for (x, y) in points {
        x_sum += x;
        y_sum += y;
        count += 1;
    }
    (count > 0).then(|| (x_sum / count as f64, y_sum / count as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_array() {
        let records = parse_payload(
            r#"[{"PARCEL_NUMBER": "A1", "STR_NUM": 12}, {"PARCEL_NUMBER": "A2"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].str_num, Some(12));
    }

    #[test]
    fn test_single_object_becomes_list() {
        let records = parse_payload(r#"{"PARCEL_NUMBER": "A1"}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parcel_number.as_deref(), Some("A1"));
    }

    #[test]
    fn test_repaired_payload() {
        let records =
            parse_payload("{\"PARCEL_NUMBER\": \"A1\"},\n{\"PARCEL_NUMBER\": \"A2\"},\n").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_malformed_and_empty() {
        assert!(matches!(
            parse_payload("<html>oops</html>"),
            Err(SourceError::Malformed(_))
        ));
        assert!(matches!(parse_payload("[]"), Err(SourceError::Empty)));
        assert!(matches!(parse_payload("42"), Err(SourceError::Malformed(_))));
    }

    #[test]
    fn test_feature_collection_point_and_polygon() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"PARCEL_NUMBER": "P1", "PRECINCT": 107},
                    "geometry": {"type": "Point", "coordinates": [-82.65, 27.76]}
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]]
                    }
                }
            ]
        })
        .to_string();

        let records = parse_payload(&body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].precinct.as_deref(), Some("107"));
        assert_eq!(records[0].lat, Some(27.76));
        assert_eq!(records[0].lon, Some(-82.65));
        assert_eq!(records[1].parcel_number.as_deref(), Some("GEO-1"));
        assert_eq!(records[1].lat, Some(1.0));
        assert_eq!(records[1].lon, Some(1.0));
    }

    #[test]
    fn test_multipolygon_center() {
        let geometry = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [4.0, 0.0]]],
                [[[4.0, 4.0], [0.0, 4.0]]]
            ]
        });
        assert_eq!(geometry_center(&geometry), Some((2.0, 2.0)));
    }

    #[test]
    fn test_unknown_geometry_has_no_center() {
        let geometry = json!({"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]});
        assert_eq!(geometry_center(&geometry), None);
    }
}
