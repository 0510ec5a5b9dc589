//! Geographic bounding boxes for raster overlay placement.

use serde::{Deserialize, Serialize};

use crate::error::{ViewerError, ViewerResult};
use crate::geojson::{FeatureCollection, Geometry};

/// A geographic bounding box in degrees (EPSG:4326).
///
/// Every raster frame is stretched against the same box, computed once
/// from the region's boundary polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Compute the rectangular bounds of a boundary polygon collection.
    ///
    /// Walks every position of every Polygon/MultiPolygon feature; point
    /// and line features contribute their positions too.
    pub fn from_feature_collection(collection: &FeatureCollection) -> ViewerResult<Self> {
        let mut bounds: Option<BoundingBox> = None;

        for feature in &collection.features {
            for (lon, lat) in feature.geometry.positions() {
                bounds = Some(match bounds {
                    None => BoundingBox::new(lon, lat, lon, lat),
                    Some(b) => b.extended(lon, lat),
                });
            }
        }

        bounds.ok_or_else(|| {
            ViewerError::InvalidGeoJson("boundary collection has no coordinates".to_string())
        })
    }

    /// Grow the box to include a point.
    pub fn extended(&self, lon: f64, lat: f64) -> Self {
        Self {
            min_lon: self.min_lon.min(lon),
            min_lat: self.min_lat.min(lat),
            max_lon: self.max_lon.max(lon),
            max_lat: self.max_lat.max(lat),
        }
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Center of the box as (lat, lon), the order map widgets expect.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.4},{:.4},{:.4},{:.4}]",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}
