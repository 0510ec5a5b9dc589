//! Locator sequence generation.
//!
//! Pure and deterministic: identical inputs yield identical, order-stable
//! output, which the prefetch cache relies on for key stability.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use viewer_common::time::parse_date;
use viewer_common::{DateRange, Parameter, ViewerResult};

/// Path component for the day-indexed vector product.
pub const VECTOR_PARAMETER: &str = "fire";
/// File extension of raster frames.
pub const RASTER_EXT: &str = "png";
/// File extension of vector payloads.
pub const VECTOR_EXT: &str = "geojson";

/// Address of one raster frame in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameLocator(String);

impl FrameLocator {
    pub fn url(&self) -> &str {
        &self.0
    }

    /// Recover the frame's calendar day from the locator's file stem.
    pub fn date(&self) -> Option<NaiveDate> {
        date_from_url(&self.0, RASTER_EXT)
    }
}

impl std::fmt::Display for FrameLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of one day's vector payload in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VectorLocator(String);

impl VectorLocator {
    pub fn url(&self) -> &str {
        &self.0
    }

    pub fn date(&self) -> Option<NaiveDate> {
        date_from_url(&self.0, VECTOR_EXT)
    }
}

impl std::fmt::Display for VectorLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn date_from_url(url: &str, ext: &str) -> Option<NaiveDate> {
    let stem = url
        .rsplit('/')
        .next()?
        .strip_suffix(&format!(".{}", ext))?;
    parse_date(stem).ok()
}

/// Generates locator sequences against a fixed object-store base URL.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    base_url: String,
}

impl FrameCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Enumerate raster locators for every day in the range, in order:
    /// `{base}/{parameter}/{YYYY-MM-DD}.png`.
    pub fn raster_sequence(&self, range: &DateRange, parameter: Parameter) -> FrameSequence {
        let frames = range
            .days()
            .map(|day| {
                FrameLocator(format!(
                    "{}/{}/{}.{}",
                    self.base_url,
                    parameter.as_str(),
                    day.format("%Y-%m-%d"),
                    RASTER_EXT
                ))
            })
            .collect();

        FrameSequence {
            frames,
            parameter,
            range: *range,
        }
    }

    /// Enumerate vector locators aligned 1:1 by day with the raster
    /// sequence: `{base}/fire/{YYYY-MM-DD}.geojson`. Independent of the
    /// raster parameter.
    pub fn vector_sequence(&self, range: &DateRange) -> VectorSequence {
        let locators = range
            .days()
            .map(|day| {
                VectorLocator(format!(
                    "{}/{}/{}.{}",
                    self.base_url,
                    VECTOR_PARAMETER,
                    day.format("%Y-%m-%d"),
                    VECTOR_EXT
                ))
            })
            .collect();

        VectorSequence {
            locators,
            range: *range,
        }
    }

    /// Build both sequences from raw date strings, validating the range.
    pub fn sequences(
        &self,
        start: &str,
        end: &str,
        parameter: Parameter,
    ) -> ViewerResult<(FrameSequence, VectorSequence)> {
        let range = DateRange::parse(start, end)?;
        Ok((
            self.raster_sequence(&range, parameter),
            self.vector_sequence(&range),
        ))
    }
}

/// Ordered, finite list of raster frame locators, one per day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<FrameLocator>,
    parameter: Parameter,
    range: DateRange,
}

impl FrameSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameLocator> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameLocator> {
        self.frames.iter()
    }

    pub fn locators(&self) -> &[FrameLocator] {
        &self.frames
    }

    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    /// Calendar day of the frame at `index`.
    pub fn date_of(&self, index: usize) -> Option<NaiveDate> {
        self.frames.get(index).and_then(FrameLocator::date)
    }
}

/// Ordered list of vector payload locators aligned with a FrameSequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSequence {
    locators: Vec<VectorLocator>,
    range: DateRange,
}

impl VectorSequence {
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VectorLocator> {
        self.locators.get(index)
    }

    pub fn locators(&self) -> &[VectorLocator] {
        &self.locators
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }
}
