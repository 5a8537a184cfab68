use std::{fs, path::Path};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// One GeoJSON feature: its property bag and its polygons.
#[derive(Debug, Clone)]
pub struct RawFeature {
    pub properties: Map<String, Value>,
    pub geometry: MultiPolygon<f64>,
}

impl RawFeature {
    pub fn new(properties: Map<String, Value>, geometry: MultiPolygon<f64>) -> Self {
        Self { properties, geometry }
    }
}

/// Read every feature of a GeoJSON FeatureCollection file.
pub(crate) fn read_geojson_file(path: &Path) -> Result<Vec<RawFeature>> {
    let bytes = fs::read(path)?;
    read_from_geojson_bytes(&bytes)
}

/// Read features from GeoJSON bytes. Polygon and MultiPolygon geometries are
/// accepted; a feature with a null geometry yields an empty MultiPolygon.
pub(crate) fn read_from_geojson_bytes(bytes: &[u8]) -> Result<Vec<RawFeature>> {
    let value: Value = serde_json::from_slice(bytes)?;
    let features = value["features"].as_array()
        .ok_or_else(|| Error::InvalidGeometry("GeoJSON document has no \"features\" array".into()))?;

    features.iter().enumerate().map(|(i, feature)| {
        let properties = match &feature["properties"] {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let geometry = parse_geometry(&feature["geometry"])
            .map_err(|e| Error::InvalidGeometry(format!("feature {i}: {e}")))?;
        Ok(RawFeature { properties, geometry })
    }).collect()
}

fn parse_geometry(geometry: &Value) -> std::result::Result<MultiPolygon<f64>, String> {
    if geometry.is_null() { return Ok(MultiPolygon(vec![])) }

    let coords = geometry["coordinates"].as_array()
        .ok_or("geometry has no coordinates")?;

    match geometry["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon(vec![parse_polygon(coords)?])),
        Some("MultiPolygon") => coords.iter()
            .map(|polygon| polygon.as_array().ok_or("polygon must be an array".to_string())
                .and_then(|rings| parse_polygon(rings)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(MultiPolygon),
        Some(other) => Err(format!("unsupported geometry type {other:?}")),
        None => Err("geometry has no type".into()),
    }
}

/// Parse a GeoJSON polygon: `[exterior, hole, hole, ...]`.
fn parse_polygon(rings: &[Value]) -> std::result::Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|ring| {
        ring.as_array().ok_or("ring must be an array".to_string()).and_then(|r| parse_ring(r))
    });
    let exterior = rings.next().ok_or("polygon has no exterior ring")??;
    let interiors = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring of `[x, y]` positions, closing it if needed.
fn parse_ring(coords: &[Value]) -> std::result::Result<LineString<f64>, String> {
    let mut points = coords.iter().map(|position| -> std::result::Result<Coord<f64>, String> {
        let x = position[0].as_f64().ok_or("x must be a number")?;
        let y = position[1].as_f64().ok_or("y must be a number")?;
        Ok(Coord { x, y })
    }).collect::<std::result::Result<Vec<_>, _>>()?;

    if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
        if first != *last { points.push(first) }
    }

    Ok(LineString(points))
}
