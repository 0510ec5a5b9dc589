//! Map presentation seam.
//!
//! The engine never draws; it hands render state to a `MapShell` and the
//! shell decides what "display" means. The production binary uses the
//! tracing shell, which narrates every pane update as structured log
//! events.

use chrono::NaiveDate;
use tracing::info;

use playback::Blend;
use viewer_common::{BoundingBox, FeatureCollection};

use crate::config::MapView;

/// Stacking order of the raster overlay pane, above the base tiles.
pub const RASTER_PANE_Z: i32 = 100;
/// Stacking order of the fire-marker pane, above the rasters.
pub const VECTOR_PANE_Z: i32 = 101;

/// Presentation surface the playback engine drives.
///
/// Calls arrive from the render forwarding task, serialized; implementations
/// only need interior mutability if they record state.
pub trait MapShell: Send + Sync {
    /// Apply the initial viewport.
    fn configure(&self, view: &MapView);

    /// Place or clear the static monitoring-station layer.
    fn show_stations(&self, stations: Option<&FeatureCollection>);

    /// Render the current raster blend: the outgoing frame always, the
    /// incoming frame only while a cross-fade is in flight. Every frame is
    /// stretched against `bounds` when a boundary polygon is configured.
    fn apply_blend(&self, blend: &Blend, bounds: Option<&BoundingBox>);

    /// Replace the fire markers for the displayed day. `None` clears the
    /// pane (the layer is hidden, or that day's payload failed).
    fn show_vectors(&self, date: NaiveDate, collection: Option<&FeatureCollection>);

    /// Update the frame date caption.
    fn set_frame_label(&self, label: &str);
}

/// Shell that renders to the log stream.
#[derive(Debug, Default)]
pub struct TracingShell;

impl TracingShell {
    pub fn new() -> Self {
        Self
    }
}

impl MapShell for TracingShell {
    fn configure(&self, view: &MapView) {
        info!(
            center_lat = view.center_lat,
            center_lon = view.center_lon,
            zoom = view.zoom,
            min_zoom = view.min_zoom,
            max_zoom = view.max_zoom,
            "Map configured"
        );
    }

    fn show_stations(&self, stations: Option<&FeatureCollection>) {
        match stations {
            Some(s) => info!(stations = s.len(), "Station layer placed"),
            None => info!("Station layer cleared"),
        }
    }

    fn apply_blend(&self, blend: &Blend, bounds: Option<&BoundingBox>) {
        let bounds = bounds.map(|b| format!("{},{},{},{}", b.min_lon, b.min_lat, b.max_lon, b.max_lat));
        match &blend.incoming {
            Some((incoming, opacity_in)) => info!(
                pane_z = RASTER_PANE_Z,
                outgoing = %blend.outgoing.0,
                outgoing_opacity = blend.outgoing.1,
                incoming = %incoming,
                incoming_opacity = opacity_in,
                bounds = bounds.as_deref(),
                "Raster cross-fade"
            ),
            None => info!(
                pane_z = RASTER_PANE_Z,
                frame = %blend.outgoing.0,
                opacity = blend.outgoing.1,
                bounds = bounds.as_deref(),
                "Raster frame"
            ),
        }
    }

    fn show_vectors(&self, date: NaiveDate, collection: Option<&FeatureCollection>) {
        match collection {
            Some(c) => info!(
                pane_z = VECTOR_PANE_Z,
                date = %date,
                detections = c.len(),
                "Fire markers"
            ),
            None => info!(pane_z = VECTOR_PANE_Z, date = %date, "Fire markers cleared"),
        }
    }

    fn set_frame_label(&self, label: &str) {
        info!(label = %label, "Frame label");
    }
}
