//! One-shot load of the static monitoring-station layer.

use tracing::info;

use viewer_common::{FeatureCollection, ViewerResult};

use crate::fetcher::ObjectFetcher;

/// Fetch and parse the station collection.
///
/// Stations are not date-indexed; this runs once at startup and the result
/// lives outside the frame clock. HTTP(S) sources go through the fetcher,
/// anything else is read from disk as a local path.
pub async fn load_stations(
    fetcher: &dyn ObjectFetcher,
    source: &str,
) -> ViewerResult<FeatureCollection> {
    let payload = if source.starts_with("http://") || source.starts_with("https://") {
        fetcher.fetch(source).await?
    } else {
        tokio::fs::read(source).await?.into()
    };

    let collection: FeatureCollection = serde_json::from_slice(&payload)?;
    info!(source = %source, stations = collection.len(), "Station layer loaded");
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fetcher::stub::StubFetcher;

    const STATIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [80.9, 26.8]},
                "properties": {"name": "Lucknow Central"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [77.2, 28.6]},
                "properties": {"name": "Delhi ITO"}
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_load_stations_from_url() {
        let fetcher = StubFetcher::new();
        fetcher.insert("https://store/stations.geojson", STATIONS);

        let stations = load_stations(&fetcher, "https://store/stations.geojson")
            .await
            .unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations.features[0].name(), Some("Lucknow Central"));
    }

    #[tokio::test]
    async fn test_load_stations_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stations.geojson");
        tokio::fs::write(&path, STATIONS).await.unwrap();

        let fetcher = StubFetcher::new();
        let stations = load_stations(&fetcher, path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(fetcher.fetches(), 0);
    }

    #[tokio::test]
    async fn test_load_stations_bad_payload() {
        let fetcher = StubFetcher::new();
        fetcher.insert("https://store/stations.geojson", "<html>nope</html>");

        let err = load_stations(&fetcher, "https://store/stations.geojson")
            .await
            .unwrap_err();
        assert!(matches!(err, viewer_common::ViewerError::InvalidGeoJson(_)));
    }
}
