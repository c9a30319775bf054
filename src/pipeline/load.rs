use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{LoadError, ValidationError};
use crate::types::route::{
    Route, RoutePoint, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE,
};

const FIELDS: [&str; 3] = ["latitude", "longitude", "timestamp"];

/// Where the route file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSource {
    Url(String),
    File(String),
}

impl RouteSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            RouteSource::Url(source.to_string())
        } else {
            RouteSource::File(source.to_string())
        }
    }
}

pub async fn fetch_route(source: &str) -> Result<Route, LoadError> {
    let bytes = match RouteSource::parse(source) {
        RouteSource::Url(url) => fetch_remote(&url).await?,
        RouteSource::File(path) => tokio::fs::read(&path)
            .await
            .map_err(|e| LoadError::Io(format!("{}: {}", path, e)))?,
    };

    let route = parse_route(&bytes)?;
    tracing::info!("Loaded route from {} ({} points)", source, route.len());
    Ok(route)
}

async fn fetch_remote(url: &str) -> Result<Vec<u8>, LoadError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| LoadError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status(status.as_u16()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| LoadError::Fetch(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Parses and validates a route file. A single bad point rejects the whole route.
pub fn parse_route(bytes: &[u8]) -> Result<Route, LoadError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| LoadError::MalformedJson(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(LoadError::InvalidStructure(
            "expected a JSON array of points".to_string(),
        ));
    };

    if items.is_empty() {
        return Err(LoadError::EmptyRoute);
    }

    let points = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_point(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Route::from_validated(points))
}

fn parse_point(index: usize, item: &Value) -> Result<RoutePoint, LoadError> {
    let Value::Object(fields) = item else {
        return Err(LoadError::InvalidStructure(format!(
            "point {} is not an object",
            index
        )));
    };

    if let Some(unknown) = fields.keys().find(|key| !FIELDS.contains(&key.as_str())) {
        return Err(LoadError::InvalidStructure(format!(
            "point {} has unexpected field '{}'",
            index, unknown
        )));
    }

    let latitude = coordinate(index, fields, "latitude", MIN_LATITUDE, MAX_LATITUDE)?;
    let longitude = coordinate(index, fields, "longitude", MIN_LONGITUDE, MAX_LONGITUDE)?;

    let raw_timestamp = required(index, fields, "timestamp")?
        .as_str()
        .ok_or_else(|| {
            LoadError::InvalidStructure(format!("point {}: timestamp is not a string", index))
        })?;
    let timestamp = parse_timestamp(raw_timestamp).ok_or_else(|| {
        LoadError::InvalidStructure(format!(
            "point {}: unparseable timestamp '{}'",
            index, raw_timestamp
        ))
    })?;

    Ok(RoutePoint {
        latitude,
        longitude,
        timestamp,
    })
}

fn required<'a>(
    index: usize,
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, LoadError> {
    fields.get(field).ok_or_else(|| {
        LoadError::InvalidStructure(format!("point {} is missing '{}'", index, field))
    })
}

fn coordinate(
    index: usize,
    fields: &Map<String, Value>,
    field: &'static str,
    min: f64,
    max: f64,
) -> Result<f64, LoadError> {
    let value = required(index, fields, field)?
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::NonNumeric { index, field })?;

    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfBounds {
            index,
            field,
            value,
            min,
            max,
        }
        .into());
    }
    Ok(value)
}

/// RFC 3339 first; timestamps without an offset are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"[
            {"latitude": 52.5200, "longitude": 13.4050, "timestamp": "2024-05-01T08:00:00Z"},
            {"latitude": 52.5205, "longitude": 13.4060, "timestamp": "2024-05-01T08:00:10+00:00"},
            {"latitude": 52.5215, "longitude": 13.4075, "timestamp": "2024-05-01T08:00:25.500"}
        ]"#
    }

    #[test]
    fn parses_valid_route_in_order() {
        let route = parse_route(sample_json().as_bytes()).expect("route");
        assert_eq!(route.len(), 3);
        assert_eq!(route.last_index(), 2);
        assert_eq!(route[0].latitude, 52.52);
        assert!(route[1].timestamp < route[2].timestamp);
    }

    #[test]
    fn malformed_json_is_load_error() {
        let err = parse_route(b"[{\"latitude\": 1,").unwrap_err();
        assert!(matches!(err, LoadError::MalformedJson(_)));
    }

    #[test]
    fn non_array_is_structural_error() {
        let err = parse_route(br#"{"points": []}"#).unwrap_err();
        assert!(matches!(err, LoadError::InvalidStructure(_)));
    }

    #[test]
    fn empty_array_is_rejected() {
        let err = parse_route(b"[]").unwrap_err();
        assert!(matches!(err, LoadError::EmptyRoute));
    }

    #[test]
    fn missing_and_unknown_fields_are_rejected() {
        let missing = br#"[{"latitude": 1.0, "timestamp": "2024-05-01T08:00:00Z"}]"#;
        assert!(matches!(
            parse_route(missing).unwrap_err(),
            LoadError::InvalidStructure(_)
        ));

        let extra = br#"[{"latitude": 1.0, "longitude": 2.0, "timestamp": "2024-05-01T08:00:00Z", "speed": 4}]"#;
        assert!(matches!(
            parse_route(extra).unwrap_err(),
            LoadError::InvalidStructure(_)
        ));
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let bytes = br#"[{"latitude": 1.0, "longitude": 2.0, "timestamp": "yesterday"}]"#;
        assert!(matches!(
            parse_route(bytes).unwrap_err(),
            LoadError::InvalidStructure(_)
        ));
    }

    #[test]
    fn one_out_of_bounds_point_invalidates_route() {
        let bytes = br#"[
            {"latitude": 10.0, "longitude": 20.0, "timestamp": "2024-05-01T08:00:00Z"},
            {"latitude": 91.0, "longitude": 20.0, "timestamp": "2024-05-01T08:01:00Z"}
        ]"#;
        match parse_route(bytes).unwrap_err() {
            LoadError::Validation(ValidationError::OutOfBounds { index, field, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "latitude");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn longitude_bounds_are_inclusive() {
        let bytes = br#"[{"latitude": -90.0, "longitude": 180.0, "timestamp": "2024-05-01T08:00:00Z"}]"#;
        assert!(parse_route(bytes).is_ok());

        let bytes = br#"[{"latitude": 0.0, "longitude": -180.5, "timestamp": "2024-05-01T08:00:00Z"}]"#;
        assert!(matches!(
            parse_route(bytes).unwrap_err(),
            LoadError::Validation(ValidationError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn non_numeric_coordinate_is_validation_error() {
        let bytes = br#"[{"latitude": "52.5", "longitude": 13.4, "timestamp": "2024-05-01T08:00:00Z"}]"#;
        assert!(matches!(
            parse_route(bytes).unwrap_err(),
            LoadError::Validation(ValidationError::NonNumeric { index: 0, field: "latitude" })
        ));
    }

    #[test]
    fn source_kind_is_detected_from_scheme() {
        assert_eq!(
            RouteSource::parse("https://example.com/route.json"),
            RouteSource::Url("https://example.com/route.json".to_string())
        );
        assert_eq!(
            RouteSource::parse("assets/route.json"),
            RouteSource::File("assets/route.json".to_string())
        );
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = fetch_route("/definitely/not/here/route.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
