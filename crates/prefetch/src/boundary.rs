//! One-shot load of the region boundary polygon.

use tracing::info;

use viewer_common::{BoundingBox, FeatureCollection, ViewerResult};

use crate::fetcher::ObjectFetcher;

/// Fetch the boundary collection and reduce it to the rectangular bounds
/// every raster frame is stretched against.
///
/// Loaded once at startup, like the station layer. HTTP(S) sources go
/// through the fetcher, anything else is read from disk as a local path.
pub async fn load_boundary(
    fetcher: &dyn ObjectFetcher,
    source: &str,
) -> ViewerResult<BoundingBox> {
    let payload = if source.starts_with("http://") || source.starts_with("https://") {
        fetcher.fetch(source).await?
    } else {
        tokio::fs::read(source).await?.into()
    };

    let collection: FeatureCollection = serde_json::from_slice(&payload)?;
    let bounds = BoundingBox::from_feature_collection(&collection)?;
    info!(
        source = %source,
        min_lon = bounds.min_lon,
        min_lat = bounds.min_lat,
        max_lon = bounds.max_lon,
        max_lat = bounds.max_lat,
        "Overlay bounds computed"
    );
    Ok(bounds)
}
