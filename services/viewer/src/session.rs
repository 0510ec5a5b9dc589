//! One viewer session: catalog, caches, player, and the shell glue.
//!
//! The session owns the wiring between the playback engine and the map
//! shell. Render snapshots flow out of the player over a watch channel; a
//! forwarding task turns each one into shell calls (raster blend, frame
//! label, fire markers for the displayed day).

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{info, warn};

use catalog::{FrameCatalog, FrameSequence, VectorLocator, VectorSequence};
use playback::{PlaybackStatus, Player, RenderFrame};
use prefetch::{
    load_boundary, load_stations, ObjectFetcher, RasterCache, VectorArrival, VectorCache,
};
use viewer_common::time::display_date;
use viewer_common::{BoundingBox, FeatureCollection, HighlightWindow, Parameter};

use crate::config::ViewerConfig;
use crate::shell::MapShell;

/// The loaded frame and vector sequences, shared with the forwarding tasks.
#[derive(Default)]
struct Timeline {
    frames: Option<FrameSequence>,
    vectors: Option<VectorSequence>,
}

/// Presentation state the shell calls are gated on.
struct Presentation {
    bounds: Option<BoundingBox>,
    fire_enabled: bool,
    stations_enabled: bool,
    stations: Option<FeatureCollection>,
}

pub struct ViewerSession {
    config: ViewerConfig,
    catalog: FrameCatalog,
    rasters: RasterCache,
    vectors: VectorCache,
    player: Arc<Player>,
    timeline: Arc<Mutex<Timeline>>,
    presentation: Arc<Mutex<Presentation>>,
    fetcher: Arc<dyn ObjectFetcher>,
    shell: Arc<dyn MapShell>,
}

impl ViewerSession {
    /// Wire up a session and start its render forwarding task.
    pub fn new(
        config: ViewerConfig,
        fetcher: Arc<dyn ObjectFetcher>,
        shell: Arc<dyn MapShell>,
    ) -> Result<Self> {
        let highlight = config.highlight_window()?;
        let (player, render_rx) = Player::new(config.player_config());

        let catalog = FrameCatalog::new(config.base_url.clone());
        let rasters = RasterCache::new(fetcher.clone());
        let vectors = VectorCache::new(fetcher.clone());
        let timeline = Arc::new(Mutex::new(Timeline::default()));
        let presentation = Arc::new(Mutex::new(Presentation {
            bounds: None,
            fire_enabled: config.fire_layer_enabled,
            stations_enabled: config.stations_layer_enabled,
            stations: None,
        }));

        tokio::spawn(forward_renders(
            render_rx,
            shell.clone(),
            timeline.clone(),
            presentation.clone(),
            vectors.clone(),
            highlight,
        ));

        Ok(Self {
            config,
            catalog,
            rasters,
            vectors,
            player: Arc::new(player),
            timeline,
            presentation,
            fetcher,
            shell,
        })
    }

    /// Configure the map, resolve the overlay bounds, load the station
    /// layer, and load the default frame range from config.
    pub async fn start(&self) -> Result<()> {
        self.shell.configure(&self.config.map);

        if let Some(source) = &self.config.bounds_source {
            // Without bounds the shell falls back to its own extent.
            match load_boundary(self.fetcher.as_ref(), source).await {
                Ok(bounds) => self.presentation.lock().await.bounds = Some(bounds),
                Err(err) => {
                    warn!(source = %source, error = %err, "Overlay bounds unavailable")
                }
            }
        }

        if let Some(source) = &self.config.stations_source {
            // The stations are ornamental; a missing layer never blocks
            // playback.
            match load_stations(self.fetcher.as_ref(), source).await {
                Ok(stations) => {
                    let mut presentation = self.presentation.lock().await;
                    if presentation.stations_enabled {
                        self.shell.show_stations(Some(&stations));
                    }
                    presentation.stations = Some(stations);
                }
                Err(err) => {
                    warn!(source = %source, error = %err, "Station layer unavailable")
                }
            }
        }

        self.load_range(
            &self.config.start_date,
            &self.config.end_date,
            self.config.parameter,
        )
        .await
    }

    /// Load a new date range and parameter: regenerate both sequences, warm
    /// the caches, and reset playback to the first frame.
    ///
    /// An invalid range is rejected before any state changes; the previous
    /// sequence keeps playing.
    pub async fn load_range(
        &self,
        start: &str,
        end: &str,
        parameter: Parameter,
    ) -> Result<()> {
        let (frames, vector_seq) = self.catalog.sequences(start, end, parameter)?;
        info!(
            start = %start,
            end = %end,
            parameter = %parameter,
            frames = frames.len(),
            "Loading frame range"
        );

        self.rasters.warm(frames.locators()).await;
        let arrivals = self.vectors.warm(vector_seq.locators());

        {
            let mut timeline = self.timeline.lock().await;
            timeline.frames = Some(frames.clone());
            timeline.vectors = Some(vector_seq);
        }

        tokio::spawn(refresh_vectors_on_arrival(
            arrivals,
            self.shell.clone(),
            self.timeline.clone(),
            self.presentation.clone(),
            self.player.clone(),
        ));

        self.player.load(frames).await;
        Ok(())
    }

    /// Show or hide the fire-detection layer. The displayed day's pane is
    /// refreshed immediately; playback is untouched.
    pub async fn set_fire_layer(&self, enabled: bool) {
        {
            let mut presentation = self.presentation.lock().await;
            if presentation.fire_enabled == enabled {
                return;
            }
            presentation.fire_enabled = enabled;
        }

        let index = self.player.current_index().await;
        let (date, locator) = self.vector_at(index).await;
        let Some(date) = date else {
            return;
        };

        if enabled {
            let collection = match locator {
                Some(locator) => self.vectors.get(&locator).await.flatten(),
                None => None,
            };
            self.shell.show_vectors(date, collection.as_ref());
        } else {
            self.shell.show_vectors(date, None);
        }
    }

    /// Show or hide the station layer. The collection loads once at
    /// startup; toggling replays it from memory.
    pub async fn set_stations_layer(&self, enabled: bool) {
        let mut presentation = self.presentation.lock().await;
        if presentation.stations_enabled == enabled {
            return;
        }
        presentation.stations_enabled = enabled;

        if enabled {
            if let Some(stations) = &presentation.stations {
                self.shell.show_stations(Some(stations));
            }
        } else {
            self.shell.show_stations(None);
        }
    }

    pub async fn play(&self) -> bool {
        self.player.play().await
    }

    pub async fn pause(&self) -> bool {
        self.player.pause().await
    }

    pub async fn seek(&self, index: usize) -> Result<usize> {
        Ok(self.player.seek(index).await?)
    }

    pub async fn status(&self) -> PlaybackStatus {
        self.player.status().await
    }

    pub async fn current_index(&self) -> usize {
        self.player.current_index().await
    }

    pub async fn frame_count(&self) -> usize {
        self.player.len().await
    }

    pub async fn shutdown(&self) {
        self.player.shutdown().await;
        info!("Viewer session stopped");
    }

    async fn vector_at(&self, index: usize) -> (Option<NaiveDate>, Option<VectorLocator>) {
        let timeline = self.timeline.lock().await;
        (
            timeline.frames.as_ref().and_then(|f| f.date_of(index)),
            timeline
                .vectors
                .as_ref()
                .and_then(|v| v.get(index))
                .cloned(),
        )
    }
}

/// Turn render snapshots into shell calls.
///
/// The blend is applied on every snapshot (each ramp step changes the
/// opacities); the label and fire markers only change with the displayed
/// day, so they are refreshed when the date or the load generation moves.
async fn forward_renders(
    mut render_rx: watch::Receiver<Option<RenderFrame>>,
    shell: Arc<dyn MapShell>,
    timeline: Arc<Mutex<Timeline>>,
    presentation: Arc<Mutex<Presentation>>,
    vectors: VectorCache,
    highlight: Option<HighlightWindow>,
) {
    let mut shown: Option<(playback::Epoch, NaiveDate)> = None;

    while render_rx.changed().await.is_ok() {
        let Some(frame) = render_rx.borrow_and_update().clone() else {
            continue;
        };

        let (bounds, fire_enabled) = {
            let presentation = presentation.lock().await;
            (presentation.bounds, presentation.fire_enabled)
        };
        shell.apply_blend(&frame.blend, bounds.as_ref());

        let (date, vector_locator) = {
            let timeline = timeline.lock().await;
            (
                timeline.frames.as_ref().and_then(|f| f.date_of(frame.index)),
                timeline
                    .vectors
                    .as_ref()
                    .and_then(|v| v.get(frame.index))
                    .cloned(),
            )
        };
        let Some(date) = date else {
            continue;
        };

        if shown == Some((frame.epoch, date)) {
            continue;
        }
        shown = Some((frame.epoch, date));

        let label = match &highlight {
            Some(window) => window.annotate(date),
            None => display_date(date),
        };
        shell.set_frame_label(&label);

        if fire_enabled {
            if let Some(locator) = vector_locator {
                let collection = vectors.get(&locator).await.flatten();
                shell.show_vectors(date, collection.as_ref());
            }
        }
    }
}

/// Push late vector arrivals for the day currently on screen.
///
/// Days other than the displayed one just land in the cache; the forwarding
/// task picks them up when playback reaches them.
async fn refresh_vectors_on_arrival(
    mut arrivals: mpsc::Receiver<VectorArrival>,
    shell: Arc<dyn MapShell>,
    timeline: Arc<Mutex<Timeline>>,
    presentation: Arc<Mutex<Presentation>>,
    player: Arc<Player>,
) {
    while let Some(arrival) = arrivals.recv().await {
        let Some(date) = arrival.locator.date() else {
            continue;
        };
        if !presentation.lock().await.fire_enabled {
            continue;
        }

        let index = player.current_index().await;
        let displayed = {
            let timeline = timeline.lock().await;
            timeline.vectors.as_ref().and_then(|v| v.get(index)) == Some(&arrival.locator)
        };
        if displayed {
            shell.show_vectors(date, arrival.collection.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use prefetch::fetcher::stub::StubFetcher;
    use viewer_common::time::parse_date;

    use crate::shell::recording::{RecordingShell, ShellEvent};

    const BASE: &str = "http://store";

    fn fire_geojson(detections: usize) -> String {
        let features: Vec<String> = (0..detections)
            .map(|i| {
                format!(
                    r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{}.5,27.1]}},"properties":{{"satellite":"N","brightness":330.0}}}}"#,
                    78 + i
                )
            })
            .collect();
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    const STATIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [80.9, 26.8]},
                "properties": {"name": "Lucknow Central"}
            }
        ]
    }"#;

    const BOUNDARY: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[68.0, 6.0], [98.0, 6.0], [98.0, 36.0], [68.0, 36.0], [68.0, 6.0]]]
                },
                "properties": {}
            }
        ]
    }"#;

    fn stub_for_range(days: &[&str], parameter: &str) -> Arc<StubFetcher> {
        let stub = Arc::new(StubFetcher::new());
        for day in days {
            stub.insert(
                &format!("{}/{}/{}.png", BASE, parameter, day),
                vec![0x89, 0x50, 0x4e, 0x47],
            );
            stub.insert(&format!("{}/fire/{}.geojson", BASE, day), fire_geojson(2));
        }
        stub
    }

    fn test_config(start: &str, end: &str) -> ViewerConfig {
        ViewerConfig {
            base_url: BASE.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            ..ViewerConfig::default()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_shows_first_frame_label_and_vectors() {
        let stub = stub_for_range(&["2024-10-15", "2024-10-16", "2024-10-17"], "pm25");
        let shell = Arc::new(RecordingShell::new());
        let session =
            ViewerSession::new(test_config("2024-10-15", "2024-10-17"), stub, shell.clone())
                .unwrap();

        session.start().await.unwrap();
        settle().await;

        assert_eq!(session.frame_count().await, 3);
        let (outgoing, incoming) = shell.last_blend().unwrap();
        assert_eq!(outgoing, "http://store/pm25/2024-10-15.png");
        assert!(incoming.is_none());
        assert_eq!(shell.last_label().unwrap(), "15 Oct 2024");

        let events = shell.events();
        assert!(events.contains(&ShellEvent::Configured));
        assert!(events.contains(&ShellEvent::Vectors {
            date: parse_date("2024-10-15").unwrap(),
            detections: Some(2),
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_window_annotates_label() {
        let stub = stub_for_range(&["2024-10-28", "2024-10-29"], "pm25");
        let shell = Arc::new(RecordingShell::new());
        let session =
            ViewerSession::new(test_config("2024-10-28", "2024-10-29"), stub, shell.clone())
                .unwrap();

        session.start().await.unwrap();
        settle().await;
        assert_eq!(shell.last_label().unwrap(), "28 Oct 2024");

        session.seek(1).await.unwrap();
        settle().await;
        assert_eq!(shell.last_label().unwrap(), "29 Oct 2024 - Diwali Week");
    }

    #[tokio::test(start_paused = true)]
    async fn test_vector_failure_isolated_to_its_day() {
        let stub = stub_for_range(&["2024-10-15", "2024-10-16"], "pm25");
        // Day two's payload is corrupt; it parses to a cleared pane.
        stub.insert("http://store/fire/2024-10-16.geojson", "not json");
        let shell = Arc::new(RecordingShell::new());
        let session =
            ViewerSession::new(test_config("2024-10-15", "2024-10-16"), stub, shell.clone())
                .unwrap();

        session.start().await.unwrap();
        settle().await;

        session.seek(1).await.unwrap();
        settle().await;
        let events = shell.events();
        assert!(events.contains(&ShellEvent::Vectors {
            date: parse_date("2024-10-16").unwrap(),
            detections: None,
        }));

        // The neighboring day still renders its detections.
        session.seek(0).await.unwrap();
        settle().await;
        assert!(shell.events().contains(&ShellEvent::Vectors {
            date: parse_date("2024-10-15").unwrap(),
            detections: Some(2),
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_range_leaves_session_unchanged() {
        let stub = stub_for_range(&["2024-10-15", "2024-10-16"], "pm25");
        let shell = Arc::new(RecordingShell::new());
        let session =
            ViewerSession::new(test_config("2024-10-15", "2024-10-16"), stub, shell.clone())
                .unwrap();

        session.start().await.unwrap();
        settle().await;
        assert_eq!(session.frame_count().await, 2);

        let err = session
            .load_range("2024-12-01", "2024-10-15", Parameter::Pm25)
            .await;
        assert!(err.is_err());
        assert_eq!(session.frame_count().await, 2);
        assert_eq!(session.current_index().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parameter_switch_reloads_sequence() {
        let stub = stub_for_range(&["2024-10-15", "2024-10-16"], "pm25");
        for day in ["2024-10-15", "2024-10-16"] {
            stub.insert(
                &format!("{}/pm10/{}.png", BASE, day),
                vec![0x89, 0x50, 0x4e, 0x47],
            );
        }
        let shell = Arc::new(RecordingShell::new());
        let session =
            ViewerSession::new(test_config("2024-10-15", "2024-10-16"), stub, shell.clone())
                .unwrap();

        session.start().await.unwrap();
        session.seek(1).await.unwrap();
        settle().await;

        session
            .load_range("2024-10-15", "2024-10-16", Parameter::Pm10)
            .await
            .unwrap();
        settle().await;

        // Reset to the first frame of the new parameter's sequence.
        assert_eq!(session.current_index().await, 0);
        assert_eq!(session.status().await, PlaybackStatus::Stopped);
        let (outgoing, _) = shell.last_blend().unwrap();
        assert_eq!(outgoing, "http://store/pm10/2024-10-15.png");
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_advances_label_with_frames() {
        let stub = stub_for_range(&["2024-10-15", "2024-10-16", "2024-10-17"], "pm25");
        let shell = Arc::new(RecordingShell::new());
        let session =
            ViewerSession::new(test_config("2024-10-15", "2024-10-17"), stub, shell.clone())
                .unwrap();

        session.start().await.unwrap();
        settle().await;
        assert!(session.play().await);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        settle().await;
        assert_eq!(session.current_index().await, 1);
        assert_eq!(shell.last_label().unwrap(), "16 Oct 2024");

        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_layer_toggle_gates_and_refreshes() {
        let stub = stub_for_range(&["2024-10-15", "2024-10-16"], "pm25");
        let shell = Arc::new(RecordingShell::new());
        let session =
            ViewerSession::new(test_config("2024-10-15", "2024-10-16"), stub, shell.clone())
                .unwrap();

        session.start().await.unwrap();
        settle().await;
        assert_eq!(
            shell.last_vectors().unwrap(),
            (parse_date("2024-10-15").unwrap(), Some(2))
        );

        // Hiding clears the pane immediately.
        session.set_fire_layer(false).await;
        assert_eq!(
            shell.last_vectors().unwrap(),
            (parse_date("2024-10-15").unwrap(), None)
        );

        // While hidden, day changes emit no markers.
        let before = shell.events().len();
        session.seek(1).await.unwrap();
        settle().await;
        let new_vectors = shell.events()[before..]
            .iter()
            .any(|e| matches!(e, ShellEvent::Vectors { .. }));
        assert!(!new_vectors);

        // Re-enabling replays the displayed day from the cache.
        session.set_fire_layer(true).await;
        assert_eq!(
            shell.last_vectors().unwrap(),
            (parse_date("2024-10-16").unwrap(), Some(2))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stations_layer_hidden_by_default_and_toggles() {
        let stub = stub_for_range(&["2024-10-15"], "pm25");
        stub.insert("http://store/stations.geojson", STATIONS);
        let mut config = test_config("2024-10-15", "2024-10-15");
        config.stations_source = Some("http://store/stations.geojson".to_string());
        let shell = Arc::new(RecordingShell::new());
        let session = ViewerSession::new(config, stub, shell.clone()).unwrap();

        session.start().await.unwrap();
        settle().await;
        assert!(!shell
            .events()
            .iter()
            .any(|e| matches!(e, ShellEvent::Stations(_))));

        session.set_stations_layer(true).await;
        assert!(shell.events().contains(&ShellEvent::Stations(Some(1))));

        session.set_stations_layer(false).await;
        assert_eq!(shell.events().last(), Some(&ShellEvent::Stations(None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlay_bounds_threaded_through_blends() {
        let stub = stub_for_range(&["2024-10-15"], "pm25");
        stub.insert("http://store/bounds.geojson", BOUNDARY);
        let mut config = test_config("2024-10-15", "2024-10-15");
        config.bounds_source = Some("http://store/bounds.geojson".to_string());
        let shell = Arc::new(RecordingShell::new());
        let session = ViewerSession::new(config, stub, shell.clone()).unwrap();

        session.start().await.unwrap();
        settle().await;

        assert_eq!(
            shell.last_bounds().unwrap(),
            Some(BoundingBox::new(68.0, 6.0, 98.0, 36.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_bounds_source_renders_without_bounds() {
        let stub = stub_for_range(&["2024-10-15"], "pm25");
        let shell = Arc::new(RecordingShell::new());
        let session = ViewerSession::new(
            test_config("2024-10-15", "2024-10-15"),
            stub,
            shell.clone(),
        )
        .unwrap();

        session.start().await.unwrap();
        settle().await;

        assert_eq!(shell.last_bounds().unwrap(), None);
    }
}
