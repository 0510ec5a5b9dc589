//! Prefetch cache: eager background loads for raster frames and an
//! incremental fetch-and-parse pipeline for vector payloads.
//!
//! The cache is keyed by locator and never evicted; it lives as long as the
//! viewer session. Writers are fetch completions; readers are the transition
//! renderer and the map shell.

pub mod boundary;
pub mod fetcher;
pub mod raster;
pub mod stations;
pub mod vector;

pub use boundary::load_boundary;
pub use fetcher::{HttpFetcher, ObjectFetcher};
pub use raster::{RasterCache, RasterEntry};
pub use stations::load_stations;
pub use vector::{VectorArrival, VectorCache};
