//! Frame catalog: maps a date range and parameter to ordered sequences of
//! remote resource locators, one per calendar day.

pub mod sequence;

pub use sequence::{
    FrameCatalog, FrameLocator, FrameSequence, VectorLocator, VectorSequence, RASTER_EXT,
    VECTOR_EXT, VECTOR_PARAMETER,
};
