//! GeoJSON geometries and their storage form.
//!
//! Locations travel over the API as RFC 7946 geometry objects ([`geojson::Geometry`]) and are
//! stored in PostGIS `geography` columns. PostGIS converts in both directions, so geometries
//! bind and decode as `jsonb` through [`sqlx::types::Json`]:
//!
//! ```sql
//! INSERT INTO advertisements (location) VALUES (ST_GeomFromGeoJSON($1::text)::geography);
//! SELECT ST_AsGeoJSON(location::geometry)::jsonb AS location FROM advertisements;
//! ```
//!
//! What is left on the Rust side is [`validate`]: the checks PostGIS would otherwise answer with
//! a database error, or not make at all.

pub use geojson::{Geometry, Value};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Deepest `GeometryCollection` nesting accepted from clients.
pub const MAX_COLLECTION_DEPTH: usize = 16;

/// Reasons a geometry is rejected before it reaches the database
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("a position needs 2 or 3 numbers, got {0}")]
    InvalidPosition(usize),
    #[error("coordinates must be finite numbers")]
    NonFinite,
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("positions mix 2D and 3D coordinates")]
    MixedDimensions,
    #[error("a LineString needs at least 2 positions")]
    LineStringTooShort,
    #[error("a Polygon needs at least one ring")]
    EmptyPolygon,
    #[error("a linear ring needs at least 4 positions")]
    RingTooShort,
    #[error("a linear ring must start and end at the same position")]
    RingNotClosed,
    #[error("geometry collections nest deeper than {MAX_COLLECTION_DEPTH} levels")]
    TooDeep,
}

/// A 2D point geometry.
pub fn point(lon: f64, lat: f64) -> Geometry {
    Geometry::new(Value::Point(vec![lon, lat]))
}

/// Check that the geometry can be stored as a WGS 84 geography and read back.
pub fn validate(geometry: &Geometry) -> Result<(), GeometryError> {
    check_depth(&geometry.value, 0)?;
    let has_z = first_position(&geometry.value).is_some_and(|p| p.len() == 3);
    validate_value(&geometry.value, has_z)
}

fn check_depth(value: &Value, depth: usize) -> Result<(), GeometryError> {
    if let Value::GeometryCollection(geometries) = value {
        if depth >= MAX_COLLECTION_DEPTH {
            return Err(GeometryError::TooDeep);
        }
        geometries.iter().try_for_each(|g| check_depth(&g.value, depth + 1))?;
    }
    Ok(())
}

fn first_position(value: &Value) -> Option<&[f64]> {
    match value {
        Value::Point(p) => Some(p.as_slice()),
        Value::LineString(line) | Value::MultiPoint(line) => line.first().map(Vec::as_slice),
        Value::Polygon(rings) | Value::MultiLineString(rings) => rings.iter().flatten().next().map(Vec::as_slice),
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().next().map(Vec::as_slice),
        Value::GeometryCollection(geometries) => geometries.iter().find_map(|g| first_position(&g.value)),
    }
}

fn validate_value(value: &Value, has_z: bool) -> Result<(), GeometryError> {
    let check = |p: &Vec<f64>| check_position(p, has_z);

    match value {
        Value::Point(p) => check(p),
        Value::MultiPoint(points) => points.iter().try_for_each(check),
        Value::LineString(line) => validate_line(line, &check),
        Value::MultiLineString(lines) => lines.iter().try_for_each(|line| validate_line(line, &check)),
        Value::Polygon(rings) => validate_polygon(rings, &check),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .try_for_each(|polygon| validate_polygon(polygon, &check)),
        Value::GeometryCollection(geometries) => geometries.iter().try_for_each(|g| validate_value(&g.value, has_z)),
    }
}

fn check_position(p: &[f64], has_z: bool) -> Result<(), GeometryError> {
    if !matches!(p.len(), 2 | 3) {
        return Err(GeometryError::InvalidPosition(p.len()));
    }
    if (p.len() == 3) != has_z {
        return Err(GeometryError::MixedDimensions);
    }
    if p.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    if !(-180.0..=180.0).contains(&p[0]) {
        return Err(GeometryError::LongitudeOutOfRange(p[0]));
    }
    if !(-90.0..=90.0).contains(&p[1]) {
        return Err(GeometryError::LatitudeOutOfRange(p[1]));
    }
    Ok(())
}

type PositionCheck<'a> = dyn Fn(&Vec<f64>) -> Result<(), GeometryError> + 'a;

fn validate_line(line: &[Vec<f64>], check: &PositionCheck) -> Result<(), GeometryError> {
    if line.len() < 2 {
        return Err(GeometryError::LineStringTooShort);
    }
    line.iter().try_for_each(check)
}

fn validate_polygon(rings: &[Vec<Vec<f64>>], check: &PositionCheck) -> Result<(), GeometryError> {
    if rings.is_empty() {
        return Err(GeometryError::EmptyPolygon);
    }
    for ring in rings {
        if ring.len() < 4 {
            return Err(GeometryError::RingTooShort);
        }
        if ring.first() != ring.last() {
            return Err(GeometryError::RingNotClosed);
        }
        ring.iter().try_for_each(check)?;
    }
    Ok(())
}

fn from_json<E: serde::de::Error>(value: Option<serde_json::Value>) -> Result<Option<Geometry>, E> {
    match value {
        None => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(E::custom),
    }
}

/// Serde adapter for optional locations: a missing location is written as `{}`, and `{}`, `null`
/// or an absent field read back as `None`.
pub mod optional {
    use super::*;
    use serde::ser::SerializeMap;

    pub fn serialize<S>(location: &Option<Geometry>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match location {
            Some(geometry) => geometry.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Geometry>, D::Error>
    where
        D: Deserializer<'de>,
    {
        from_json(Option::<serde_json::Value>::deserialize(deserializer)?)
    }
}

/// Serde adapter for location changes in partial updates.
///
/// An absent field or `null` keeps the stored location (`None`), `{}` clears it
/// (`Some(None)`) and a geometry replaces it (`Some(Some(_))`).
pub mod change {
    use super::*;

    pub fn serialize<S>(change: &Option<Option<Geometry>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match change {
            None => serializer.serialize_none(),
            Some(location) => optional::serialize(location, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<Geometry>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            None | Some(serde_json::Value::Null) => Ok(None),
            value => from_json(value).map(Some),
        }
    }
}
