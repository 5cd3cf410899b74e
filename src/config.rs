use std::net::SocketAddr;

use chrono::format::{Item, StrftimeItems};
use chrono::{FixedOffset, Local, TimeZone, Utc};
use serde_derive::Serialize;

use crate::constants::{self, TileLayer, TILE_LAYERS};
use crate::error::ConfigError;

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub(crate) struct LatLng {
    pub(crate) lat: f64,
    pub(crate) lng: f64,
}

impl LatLng {
    /// Returns `None` unless both axes are finite and inside their geographic range.
    pub(crate) fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(LatLng { lat, lng })
    }
}

/// Viewport of the map: where it is centered, how far it is zoomed and which tiles it draws.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MapConfig {
    pub(crate) center: LatLng,
    pub(crate) zoom: u8,
    pub(crate) base_layer: TileLayer,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            center: LatLng { lat: 0.0, lng: 0.0 },
            zoom: constants::DEFAULT_ZOOM,
            base_layer: TILE_LAYERS[constants::DEFAULT_BASE_LAYER],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum DisplayZone {
    Local,
    Fixed(FixedOffset),
}

/// How "last updated" timestamps are shown to the viewer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DateFormat {
    zone: DisplayZone,
    pattern: String,
}

impl DateFormat {
    pub(crate) fn new(zone: DisplayZone, pattern: &str) -> Result<Self, ConfigError> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::invalid("COVID_MAP_DATE_FORMAT", format!("`{pattern}` is not a valid strftime pattern")));
        }
        Ok(DateFormat { zone, pattern: pattern.to_string() })
    }

    pub(crate) fn format_millis(&self, millis: i64) -> Option<String> {
        let instant = Utc.timestamp_millis_opt(millis).single()?;
        let formatted = match self.zone {
            DisplayZone::Local => instant.with_timezone(&Local).format(&self.pattern).to_string(),
            DisplayZone::Fixed(offset) => instant.with_timezone(&offset).format(&self.pattern).to_string(),
        };
        Some(formatted)
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat { zone: DisplayZone::Local, pattern: constants::DEFAULT_DATE_FORMAT.to_string() }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct AppConfig {
    pub(crate) bind: SocketAddr,
    pub(crate) stats_url: String,
    pub(crate) page_title: String,
    /// Where the "see the code" link on the page points.
    pub(crate) source_url: String,
    pub(crate) map: MapConfig,
    pub(crate) date_format: DateFormat,
}

impl AppConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("COVID_MAP_BIND").unwrap_or_else(|| constants::DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse()
            .map_err(|_| ConfigError::invalid("COVID_MAP_BIND", format!("`{bind_raw}` is not a socket address")))?;

        let mut map = MapConfig::default();
        if let Some(center) = get("COVID_MAP_CENTER") {
            map.center = parse_center(&center)?;
        }
        if let Some(zoom) = get("COVID_MAP_ZOOM") {
            map.zoom = zoom
                .parse()
                .map_err(|_| ConfigError::invalid("COVID_MAP_ZOOM", format!("`{zoom}` is not a zoom level")))?;
        }
        if let Some(layer) = get("COVID_MAP_BASE_LAYER") {
            map.base_layer = *TILE_LAYERS
                .get(layer.as_str())
                .ok_or_else(|| ConfigError::invalid("COVID_MAP_BASE_LAYER", format!("unknown base layer `{layer}`")))?;
        }
        if map.zoom > map.base_layer.max_zoom {
            return Err(ConfigError::invalid(
                "COVID_MAP_ZOOM",
                format!("{} exceeds the maximum zoom {} of {}", map.zoom, map.base_layer.max_zoom, map.base_layer.name),
            ));
        }

        let zone = match get("COVID_MAP_UTC_OFFSET") {
            Some(offset) => DisplayZone::Fixed(parse_utc_offset(&offset)?),
            None => DisplayZone::Local,
        };
        let pattern = get("COVID_MAP_DATE_FORMAT").unwrap_or_else(|| constants::DEFAULT_DATE_FORMAT.to_string());
        let date_format = DateFormat::new(zone, &pattern)?;

        Ok(AppConfig {
            bind,
            stats_url: get("COVID_MAP_STATS_URL").unwrap_or_else(|| constants::DEFAULT_STATS_URL.to_string()),
            page_title: get("COVID_MAP_TITLE").unwrap_or_else(|| constants::DEFAULT_TITLE.to_string()),
            source_url: get("COVID_MAP_SOURCE_URL").unwrap_or_else(|| constants::DEFAULT_SOURCE_URL.to_string()),
            map,
            date_format,
        })
    }
}

fn parse_center(raw: &str) -> Result<LatLng, ConfigError> {
    let invalid = || ConfigError::invalid("COVID_MAP_CENTER", format!("`{raw}` is not a `lat,lng` pair"));
    let (lat, lng) = raw.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    LatLng::new(lat, lng).ok_or_else(invalid)
}

/// Parses `+HH:MM`, `-HH:MM` or `Z`.
fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::invalid("COVID_MAP_UTC_OFFSET", format!("`{raw}` is not an offset like +02:00"));
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
