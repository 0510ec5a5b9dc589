//! Common types shared across the air-quality time-lapse viewer crates.

pub mod bbox;
pub mod error;
pub mod geojson;
pub mod parameter;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{ViewerError, ViewerResult};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use parameter::Parameter;
pub use time::{DateRange, HighlightWindow};
