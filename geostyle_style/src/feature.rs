// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-feature inputs to construction and derivation.

use std::fmt;
use std::sync::Arc;

use geostyle_geo::{LengthUnit, ReferenceLevel};
use geostyle_param::Rgba8;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;

/// A raw metadata cell.
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataValue {
    /// An integer cell.
    Int(i64),
    /// A floating-point cell.
    Float(f64),
    /// A text cell; may still hold a number.
    Text(Arc<str>),
}

/// Read access to a feature's metadata columns.
pub trait MetadataAccessor: Send + Sync {
    /// Returns the cell in `column`, if present.
    fn get(&self, column: &str) -> Option<MetadataValue>;
}

impl MetadataAccessor for HashMap<String, MetadataValue> {
    fn get(&self, column: &str) -> Option<MetadataValue> {
        HashMap::get(self, column).cloned()
    }
}

/// A feature without metadata.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoMetadata;

impl MetadataAccessor for NoMetadata {
    fn get(&self, _column: &str) -> Option<MetadataValue> {
        None
    }
}

/// Reads `column` as a number.
///
/// Text cells are parsed after trimming. An absent column is `Ok(None)`.
pub fn numeric_metadata(
    metadata: &dyn MetadataAccessor,
    column: &str,
) -> Result<Option<f64>, MetadataError> {
    match metadata.get(column) {
        None => Ok(None),
        Some(MetadataValue::Float(v)) => Ok(Some(v)),
        Some(MetadataValue::Int(v)) => Ok(Some(v as f64)),
        Some(MetadataValue::Text(raw)) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(MetadataError::NotNumeric {
                column: column.to_owned(),
                raw: raw.to_string(),
            }),
        },
    }
}

/// A metadata column and the unit its values are in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Unit of the column's values.
    #[serde(default)]
    pub unit: LengthUnit,
}

impl ColumnSpec {
    /// Creates a column spec.
    #[must_use]
    pub fn new(name: &str, unit: LengthUnit) -> Self {
        Self {
            name: name.to_owned(),
            unit,
        }
    }
}

/// Describes the collection a feature belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Data type of the collection; styles are looked up by it.
    pub data_type_key: String,
    /// Column holding altitudes (or depths).
    #[serde(default)]
    pub altitude_column: Option<ColumnSpec>,
    /// Column holding the semi-major axis.
    #[serde(default)]
    pub semi_major_column: Option<ColumnSpec>,
    /// Column holding the semi-minor axis.
    #[serde(default)]
    pub semi_minor_column: Option<ColumnSpec>,
    /// Column holding the major axis bearing in degrees.
    #[serde(default)]
    pub orientation_column: Option<String>,
}

impl CollectionDescriptor {
    /// Creates a descriptor with no metadata columns.
    #[must_use]
    pub fn new(data_type_key: &str) -> Self {
        Self {
            data_type_key: data_type_key.to_owned(),
            ..Self::default()
        }
    }
}

/// Where a feature is.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FeatureLocation {
    /// Latitude in degrees.
    pub lat_deg: f64,
    /// Longitude in degrees.
    pub lon_deg: f64,
    /// The feature's own altitude in meters.
    pub altitude_m: f64,
    /// The feature's own reference level.
    pub reference: ReferenceLevel,
    /// Whether the feature follows terrain.
    pub follows_terrain: bool,
}

impl FeatureLocation {
    /// Creates a location on terrain at altitude zero.
    #[must_use]
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            altitude_m: 0.0,
            reference: ReferenceLevel::Terrain,
            follows_terrain: false,
        }
    }
}

/// Read-only view of one feature.
#[derive(Clone)]
pub struct FeatureContext {
    /// Element id.
    pub element_id: u64,
    /// Geometry id.
    pub geometry_id: u64,
    /// Location.
    pub location: FeatureLocation,
    /// Whether the feature is selected.
    pub selected: bool,
    /// Whether the feature is visible.
    pub visible: bool,
    /// A color carried by the feature itself.
    pub explicit_color: Option<Rgba8>,
    /// Metadata cells.
    pub metadata: Arc<dyn MetadataAccessor>,
    /// The owning collection.
    pub collection: Arc<CollectionDescriptor>,
}

impl FeatureContext {
    /// Creates a visible, unselected feature without metadata.
    #[must_use]
    pub fn new(
        element_id: u64,
        location: FeatureLocation,
        collection: Arc<CollectionDescriptor>,
    ) -> Self {
        Self {
            element_id,
            geometry_id: element_id,
            location,
            selected: false,
            visible: true,
            explicit_color: None,
            metadata: Arc::new(NoMetadata),
            collection,
        }
    }

    /// Replaces the metadata accessor.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataAccessor>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the selection state.
    #[must_use]
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Sets the feature's own color.
    #[must_use]
    pub fn with_color(mut self, color: Rgba8) -> Self {
        self.explicit_color = Some(color);
        self
    }

    /// Reads a numeric metadata column, treating malformed cells as absent.
    #[must_use]
    pub fn metadata_f64(&self, column: &str) -> Option<f64> {
        match numeric_metadata(self.metadata.as_ref(), column) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(element_id = self.element_id, %err, "ignoring metadata value");
                None
            }
        }
    }

    /// Reads a length column and converts it to meters.
    #[must_use]
    pub fn metadata_m(&self, column: &ColumnSpec) -> Option<f64> {
        self.metadata_f64(&column.name).map(|v| column.unit.to_meters(v))
    }
}

impl fmt::Debug for FeatureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureContext")
            .field("element_id", &self.element_id)
            .field("geometry_id", &self.geometry_id)
            .field("location", &self.location)
            .field("selected", &self.selected)
            .field("visible", &self.visible)
            .field("explicit_color", &self.explicit_color)
            .field("collection", &self.collection.data_type_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells() -> HashMap<String, MetadataValue> {
        let mut cells = HashMap::new();
        cells.insert("alt".to_owned(), MetadataValue::Text(Arc::from(" 12.5 ")));
        cells.insert("depth".to_owned(), MetadataValue::Int(40));
        cells.insert("bad".to_owned(), MetadataValue::Text(Arc::from("n/a")));
        cells
    }

    #[test]
    fn numeric_cells_parse() {
        let cells = cells();
        assert_eq!(numeric_metadata(&cells, "alt"), Ok(Some(12.5)));
        assert_eq!(numeric_metadata(&cells, "depth"), Ok(Some(40.0)));
        assert_eq!(numeric_metadata(&cells, "missing"), Ok(None));
        assert_eq!(
            numeric_metadata(&cells, "bad"),
            Err(MetadataError::NotNumeric {
                column: "bad".to_owned(),
                raw: "n/a".to_owned(),
            })
        );
    }

    #[test]
    fn malformed_cells_read_as_absent() {
        let feature = FeatureContext::new(
            7,
            FeatureLocation::new(0.0, 0.0),
            Arc::new(CollectionDescriptor::new("contacts")),
        )
        .with_metadata(Arc::new(cells()));
        assert_eq!(feature.metadata_f64("bad"), None);
        assert_eq!(
            feature.metadata_m(&ColumnSpec::new("alt", LengthUnit::Kilometers)),
            Some(12_500.0)
        );
    }

    #[test]
    fn descriptor_deserializes_with_defaults() {
        let json = r#"{
            "data_type_key": "contacts",
            "altitude_column": { "name": "depth", "unit": "feet" }
        }"#;
        let descriptor: CollectionDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(
            descriptor.altitude_column,
            Some(ColumnSpec::new("depth", LengthUnit::Feet))
        );
        assert!(descriptor.semi_major_column.is_none());
    }
}
