//! GeoJSON types for the vector overlays.
//!
//! Fire detections arrive as one FeatureCollection per day; monitoring
//! stations as a single static collection. Properties are kept as raw JSON
//! maps since upstream payloads carry arbitrary extra keys; typed accessors
//! cover the properties the viewer actually reads (`satellite` and
//! `brightness` for fire points, `name` for stations).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Array of features.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional feature identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The geometry of this feature.
    pub geometry: Geometry,

    /// Raw properties map; payloads carry arbitrary keys.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Create a point feature.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry: Geometry::point(lon, lat),
            properties: Map::new(),
        }
    }

    /// Set a property value.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Position of a point feature as (lon, lat).
    pub fn point_position(&self) -> Option<(f64, f64)> {
        match &self.geometry {
            Geometry::Point { coordinates } => Some((coordinates[0], coordinates[1])),
            _ => None,
        }
    }

    fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Detecting satellite of a fire point.
    pub fn satellite(&self) -> Option<&str> {
        self.property_str("satellite")
    }

    /// Fire radiative brightness of a fire point.
    pub fn brightness(&self) -> Option<f64> {
        self.properties.get("brightness").and_then(Value::as_f64)
    }

    /// Station name of a monitoring-station point.
    pub fn name(&self) -> Option<&str> {
        self.property_str("name")
    }
}

/// GeoJSON geometry types the viewer consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A point geometry.
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: [f64; 2],
    },

    /// A line string geometry.
    LineString {
        coordinates: Vec<[f64; 2]>,
    },

    /// A polygon geometry (first ring exterior, rest holes).
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },

    /// A multi-polygon geometry.
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Create a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }

    /// Every (lon, lat) position in the geometry, flattened.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        match self {
            Geometry::Point { coordinates } => vec![(coordinates[0], coordinates[1])],
            Geometry::LineString { coordinates } => {
                coordinates.iter().map(|c| (c[0], c[1])).collect()
            }
            Geometry::Polygon { coordinates } => coordinates
                .iter()
                .flatten()
                .map(|c| (c[0], c[1]))
                .collect(),
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .flatten()
                .map(|c| (c[0], c[1]))
                .collect(),
        }
    }
}
