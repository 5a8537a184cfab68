use std::{collections::HashSet, path::PathBuf, sync::Arc};

use polars::prelude::*;
use serde_json::Value;

use crate::{common::io::RawFeature, region::{RawTable, RegionDefinition, Source, Transformed}, Error, Result};

/// A region whose units are the features of a GeoJSON FeatureCollection.
/// Unit ids come from one feature property (the region id by default).
#[derive(Debug, Clone)]
pub struct GeoJsonDefinition {
    id: String,
    source: Source,
    id_property: String,
    name_property: Option<String>,
    metadata_properties: Vec<String>,
}

impl GeoJsonDefinition {
    /// Region `id` read from a GeoJSON file.
    pub fn from_file(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::with_source(id.into(), Source::GeoJson(path.into()))
    }

    /// Region `id` built from in-memory features.
    pub fn from_features(id: impl Into<String>, features: Vec<RawFeature>) -> Self {
        Self::with_source(id.into(), Source::Features(Arc::from(features)))
    }

    fn with_source(id: String, source: Source) -> Self {
        Self { id_property: id.clone(), id, source, name_property: None, metadata_properties: Vec::new() }
    }

    /// Read unit ids from `property` instead of the region id.
    pub fn with_id_property(mut self, property: impl Into<String>) -> Self {
        self.id_property = property.into();
        self
    }

    /// Fill the `{id}_name` metadata column from `property`.
    pub fn with_name_property(mut self, property: impl Into<String>) -> Self {
        self.name_property = Some(property.into());
        self
    }

    /// Copy these feature properties into the metadata table.
    pub fn with_metadata<S: Into<String>>(mut self, properties: impl IntoIterator<Item = S>) -> Self {
        self.metadata_properties.extend(properties.into_iter().map(Into::into));
        self
    }
}

/// Render a property as a string cell; numbers lose no digits, nulls stay null.
fn property_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl RegionDefinition for GeoJsonDefinition {
    fn identify(&self) -> &str { &self.id }

    fn raw_source(&self) -> Source { self.source.clone() }

    fn transform_raw(&self, raw: RawTable) -> Result<Transformed> {
        let mut seen = HashSet::with_capacity(raw.len());
        let mut ids = Vec::with_capacity(raw.len());
        let mut geometries = Vec::with_capacity(raw.len());

        for (i, feature) in raw.iter().enumerate() {
            let id = property_string(feature.properties.get(&self.id_property))
                .ok_or_else(|| Error::Schema(format!(
                    "Feature {i} of region {:?} has no {:?} property", self.id, self.id_property
                )))?;
            if !seen.insert(id.clone()) {
                return Err(Error::Schema(format!("Duplicate unit id {id:?} in region {:?}", self.id)));
            }
            ids.push(id);
            geometries.push(feature.geometry.clone());
        }

        let mut columns: Vec<Column> = vec![Series::new(self.id.as_str().into(), &ids).into()];
        if let Some(property) = &self.name_property {
            let names: Vec<Option<String>> = raw.iter()
                .map(|feature| property_string(feature.properties.get(property)))
                .collect();
            columns.push(Series::new(format!("{}_name", self.id).into(), names).into());
        }
        for property in &self.metadata_properties {
            let values: Vec<Option<String>> = raw.iter()
                .map(|feature| property_string(feature.properties.get(property)))
                .collect();
            columns.push(Series::new(property.as_str().into(), values).into());
        }

        Ok(Transformed { ids, geometries, metadata: DataFrame::new(columns)? })
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};
    use serde_json::{json, Map};

    use super::*;
    use crate::region::{Region, RegionSource};

    fn feature(properties: Value) -> RawFeature {
        let properties: Map<String, Value> = serde_json::from_value(properties).unwrap();
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)];
        RawFeature::new(properties, MultiPolygon(vec![square]))
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let def = GeoJsonDefinition::from_features("lga", vec![
            feature(json!({ "lga": 10050 })),
            feature(json!({ "lga": "10110" })),
        ]);
        let region = Region::new(def);
        let ids: Vec<String> = region.ids().unwrap().into_iter().collect();
        assert_eq!(ids, vec!["10050", "10110"]);
    }

    #[test]
    fn metadata_carries_names_and_extra_properties() {
        let def = GeoJsonDefinition::from_features("sa2", vec![
            feature(json!({ "code": "a", "label": "Alpha", "state": "NSW" })),
            feature(json!({ "code": "b", "state": "VIC" })),
        ])
            .with_id_property("code")
            .with_name_property("label")
            .with_metadata(["state"]);
        let region = Region::new(def);
        assert_eq!(region.name_column(), "sa2_name");

        let metadata = region.metadata().unwrap();
        assert_eq!(metadata.get_column_names_str(), vec!["sa2", "sa2_name", "state"]);
        let names: Vec<Option<&str>> = metadata.column("sa2_name").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(names, vec![Some("Alpha"), None]);
    }

    #[test]
    fn missing_id_property_is_a_schema_error() {
        let def = GeoJsonDefinition::from_features("lga", vec![feature(json!({ "other": 1 }))]);
        assert!(matches!(Region::new(def).geometry(), Err(Error::Schema(_))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let def = GeoJsonDefinition::from_features("lga", vec![
            feature(json!({ "lga": "x" })),
            feature(json!({ "lga": "x" })),
        ]);
        assert!(matches!(Region::new(def).raw_geometry(), Err(Error::Schema(_))));
    }

    #[test]
    fn reads_from_file_and_clears_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.geojson");
        let doc = |code: &str| json!({ "type": "FeatureCollection", "features": [{
            "type": "Feature",
            "properties": { "code": code },
            "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [3, 0], [3, 3], [0, 3], [0, 0]]] }
        }] });
        std::fs::write(&path, serde_json::to_vec(&doc("first")).unwrap()).unwrap();

        let region = Region::new(GeoJsonDefinition::from_file("units", &path).with_id_property("code"));
        assert!((region.raw_geometry().unwrap().total_area() - 9.0).abs() < 1e-12);
        assert!(region.ids().unwrap().contains("first"));

        std::fs::write(&path, serde_json::to_vec(&doc("second")).unwrap()).unwrap();
        assert!(region.ids().unwrap().contains("first"));
        region.clear_cache();
        assert!(region.ids().unwrap().contains("second"));
    }
}
