//! Viewer configuration.
//!
//! Loaded from a YAML file; every field has a default so an empty file (or
//! no file at all) yields a working session against the public store.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use playback::{PlayerConfig, TransitionConfig};
use viewer_common::time::parse_date;
use viewer_common::{HighlightWindow, Parameter};

/// Root configuration for one viewer session.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// Object store holding the pre-rendered rasters and vector payloads.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// First day of the default frame range, `YYYY-MM-DD`.
    #[serde(default = "default_start_date")]
    pub start_date: String,

    /// Last day of the default frame range, inclusive.
    #[serde(default = "default_end_date")]
    pub end_date: String,

    /// Raster parameter shown on startup.
    #[serde(default = "default_parameter")]
    pub parameter: Parameter,

    /// Overlay opacity applied before cross-fade blending.
    #[serde(default = "default_opacity")]
    pub opacity: f64,

    /// Milliseconds between frame advances while playing.
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,

    /// Opacity steps per cross-fade.
    #[serde(default = "default_transition_steps")]
    pub transition_steps: u32,

    /// Total cross-fade duration in milliseconds.
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,

    /// Initial map view.
    #[serde(default)]
    pub map: MapView,

    /// Date window whose frame labels carry an annotation.
    #[serde(default = "default_highlight")]
    pub highlight: Option<HighlightConfig>,

    /// Station layer source: an HTTP(S) URL or a local file path.
    #[serde(default)]
    pub stations_source: Option<String>,

    /// Boundary polygon source the raster overlay bounds are computed
    /// from: an HTTP(S) URL or a local file path.
    #[serde(default)]
    pub bounds_source: Option<String>,

    /// Whether the fire-detection layer starts visible.
    #[serde(default = "default_true")]
    pub fire_layer_enabled: bool,

    /// Whether the station layer starts visible.
    #[serde(default)]
    pub stations_layer_enabled: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            parameter: default_parameter(),
            opacity: default_opacity(),
            cadence_ms: default_cadence_ms(),
            transition_steps: default_transition_steps(),
            transition_ms: default_transition_ms(),
            map: MapView::default(),
            highlight: default_highlight(),
            stations_source: None,
            bounds_source: None,
            fire_layer_enabled: true,
            stations_layer_enabled: false,
        }
    }
}

impl ViewerConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: ViewerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "Loaded viewer configuration");
        Ok(config)
    }

    /// Timing settings for the playback driver.
    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            cadence: Duration::from_millis(self.cadence_ms),
            transition: TransitionConfig {
                steps: self.transition_steps,
                duration: Duration::from_millis(self.transition_ms),
            },
            base_opacity: self.opacity,
        }
    }

    /// Resolve the highlight window, validating its dates.
    pub fn highlight_window(&self) -> Result<Option<HighlightWindow>> {
        self.highlight.as_ref().map(HighlightConfig::window).transpose()
    }
}

/// Initial map viewport.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MapView {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_zoom")]
    pub min_zoom: u8,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            zoom: default_zoom(),
            min_zoom: default_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

/// A labelled date window in config form.
#[derive(Debug, Clone, Deserialize)]
pub struct HighlightConfig {
    pub start: String,
    pub end: String,
    pub label: String,
}

impl HighlightConfig {
    fn window(&self) -> Result<HighlightWindow> {
        Ok(HighlightWindow {
            start: parse_date(&self.start).context("invalid highlight start date")?,
            end: parse_date(&self.end).context("invalid highlight end date")?,
            label: self.label.clone(),
        })
    }
}

fn default_base_url() -> String {
    "https://iaqn.s3.us-east-2.amazonaws.com".to_string()
}

fn default_start_date() -> String {
    "2024-10-15".to_string()
}

fn default_end_date() -> String {
    "2024-12-01".to_string()
}

fn default_parameter() -> Parameter {
    Parameter::Pm25
}

fn default_opacity() -> f64 {
    0.6
}

fn default_cadence_ms() -> u64 {
    1000
}

fn default_transition_steps() -> u32 {
    100
}

// Cadence quartered, so the fade settles well before the next advance.
fn default_transition_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

fn default_highlight() -> Option<HighlightConfig> {
    Some(HighlightConfig {
        start: "2024-10-29".to_string(),
        end: "2024-11-03".to_string(),
        label: "Diwali Week".to_string(),
    })
}

fn default_center_lat() -> f64 {
    27.0
}

fn default_center_lon() -> f64 {
    80.0
}

fn default_zoom() -> u8 {
    6
}

fn default_max_zoom() -> u8 {
    18
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config: ViewerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.base_url, "https://iaqn.s3.us-east-2.amazonaws.com");
        assert_eq!(config.start_date, "2024-10-15");
        assert_eq!(config.end_date, "2024-12-01");
        assert_eq!(config.parameter, Parameter::Pm25);
        assert_eq!(config.opacity, 0.6);
        assert_eq!(config.cadence_ms, 1000);
        assert_eq!(config.transition_steps, 100);
        assert_eq!(config.transition_ms, 250);
        assert_eq!(config.map.center_lat, 27.0);
        assert_eq!(config.map.center_lon, 80.0);
        assert_eq!(config.map.zoom, 6);
        assert_eq!(config.map.max_zoom, 18);
        assert!(config.stations_source.is_none());
        assert!(config.bounds_source.is_none());
        assert!(config.fire_layer_enabled);
        assert!(!config.stations_layer_enabled);
    }

    #[test]
    fn test_default_highlight_window() {
        let config = ViewerConfig::default();
        let window = config.highlight_window().unwrap().unwrap();
        assert_eq!(window.label, "Diwali Week");
        assert_eq!(
            window.annotate(parse_date("2024-11-01").unwrap()),
            "01 Nov 2024 - Diwali Week"
        );
    }

    #[test]
    fn test_load_partial_yaml_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url: http://localhost:9000/frames\nparameter: pm10\ncadence_ms: 500\nhighlight: null"
        )
        .unwrap();

        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000/frames");
        assert_eq!(config.parameter, Parameter::Pm10);
        assert_eq!(config.cadence_ms, 500);
        assert!(config.highlight.is_none());
        // Untouched fields keep their defaults.
        assert_eq!(config.opacity, 0.6);
    }

    #[test]
    fn test_player_config_from_millis() {
        let config = ViewerConfig::default();
        let player = config.player_config();
        assert_eq!(player.cadence, Duration::from_millis(1000));
        assert_eq!(player.transition.steps, 100);
        assert_eq!(player.transition.duration, Duration::from_millis(250));
        assert_eq!(player.base_opacity, 0.6);
        assert_eq!(
            player.transition.step_interval(),
            Duration::from_micros(2_500)
        );
    }

    #[test]
    fn test_invalid_highlight_dates_rejected() {
        let config: ViewerConfig = serde_yaml::from_str(
            "highlight:\n  start: not-a-date\n  end: 2024-11-03\n  label: Week",
        )
        .unwrap();
        assert!(config.highlight_window().is_err());
    }
}
