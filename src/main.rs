use std::sync::Arc;

use anyhow::Context;
use axum::{http::StatusCode, Json, Router, routing::get};
use axum::extract::State;
use axum::response::Html;
use serde_derive::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use covid::{HttpStatsSource, StatsSource};
use geojson::FeatureCollection;
use map::MapHost;

mod config;
mod constants;
mod covid;
mod error;
mod geojson;
mod map;
mod marker;
mod page;

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    source: Arc<dyn StatsSource>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let mut host = MapHost::new(state.config.map.clone());
    host.on_ready(state.source.as_ref(), &state.config.date_format).await;

    page::render_page(&state.config.page_title, &state.config.source_url, &host)
        .map(Html)
        .map_err(|err| {
            error!(error = %err, "failed to render map page");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "unable to render page")
        })
}

async fn geojson_endpoint(State(state): State<AppState>) -> Result<Json<FeatureCollection>, ApiError> {
    match state.source.fetch_countries().await {
        Ok(records) => {
            let collection = geojson::to_feature_collection(records);
            info!(features = collection.len(), "serving country features");
            Ok(Json(collection))
        }
        Err(err) => {
            error!(source = state.source.name(), error = %err, "failed to fetch country statistics");
            Err(api_error(StatusCode::BAD_GATEWAY, err.to_string()))
        }
    }
}

fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/countries.geojson", get(geojson_endpoint))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let source = HttpStatsSource::new(&config.stats_url).context("invalid statistics endpoint")?;
    let bind = config.bind;

    let app_state = AppState {
        config: Arc::new(config),
        source: Arc::new(source),
    };

    info!(%bind, "serving covid map");

    axum::Server::try_bind(&bind)
        .with_context(|| format!("unable to bind {bind}"))?
        .serve(app(app_state).into_make_service())
        .await
        .context("server error")
}
