use tracing::{debug, error, info};

use crate::config::{DateFormat, MapConfig};
use crate::covid::StatsSource;
use crate::geojson::to_feature_collection;
use crate::marker::{render_markers, MarkerLayer};

/// Owns the viewport and the marker layer of one loaded map.
#[derive(Debug)]
pub(crate) struct MapHost {
    config: MapConfig,
    layer: MarkerLayer,
    effect_ran: bool,
}

impl MapHost {
    pub(crate) fn new(config: MapConfig) -> Self {
        MapHost { config, layer: MarkerLayer::default(), effect_ran: false }
    }

    pub(crate) fn config(&self) -> &MapConfig {
        &self.config
    }

    pub(crate) fn layer(&self) -> &MarkerLayer {
        &self.layer
    }

    /// Called once the viewport is ready. Only the first call runs the pipeline.
    pub(crate) async fn on_ready(&mut self, source: &dyn StatsSource, date_format: &DateFormat) -> usize {
        if self.effect_ran {
            debug!(markers = self.layer.len(), "map already initialised, skipping statistics fetch");
            return 0;
        }
        self.effect_ran = true;
        run_pipeline(source, date_format, &mut self.layer).await
    }
}

/// fetch -> transform -> render. A failed fetch is logged and leaves `layer` untouched.
pub(crate) async fn run_pipeline(source: &dyn StatsSource, date_format: &DateFormat, layer: &mut MarkerLayer) -> usize {
    let records = match source.fetch_countries().await {
        Ok(records) => records,
        Err(err) => {
            error!(source = source.name(), error = %err, "failed to fetch country statistics");
            return 0;
        }
    };

    let collection = to_feature_collection(records);
    if collection.is_empty() {
        info!(source = source.name(), "statistics source returned no countries");
        return 0;
    }

    let rendered = render_markers(&collection, date_format, layer);
    info!(source = source.name(), markers = rendered, "rendered country markers");
    rendered
}
