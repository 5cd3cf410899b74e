use std::collections::HashMap;
use once_cell::sync::Lazy;
use serde_derive::Serialize;

pub(crate) const DEFAULT_STATS_URL: &str = "https://corona.lmao.ninja/countries";
pub(crate) const DEFAULT_BIND: &str = "0.0.0.0:4000";
pub(crate) const DEFAULT_TITLE: &str = "Home Page";
pub(crate) const DEFAULT_SOURCE_URL: &str = "https://github.com/nickfp1985/covid19-map-practice";
pub(crate) const DEFAULT_ZOOM: u8 = 2;
pub(crate) const DEFAULT_BASE_LAYER: &str = "OpenStreetMap";
// Matches the browser's en-US `toLocaleString()` output.
pub(crate) const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

// Leaflet's own riseOffset default.
pub(crate) const RISE_OFFSET: i32 = 250;

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub(crate) struct TileLayer {
    pub(crate) name: &'static str,
    pub(crate) url: &'static str,
    pub(crate) attribution: &'static str,
    #[serde(rename = "maxZoom")]
    pub(crate) max_zoom: u8,
}

pub(crate) static TILE_LAYERS: Lazy<HashMap<&'static str, TileLayer>> = Lazy::new(||
    HashMap::from([
        ("OpenStreetMap", TileLayer {
            name: "OpenStreetMap",
            url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors",
            max_zoom: 19,
        }),
        ("OpenTopoMap", TileLayer {
            name: "OpenTopoMap",
            url: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
            attribution: "Map data: &copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors, <a href=\"https://opentopomap.org\">OpenTopoMap</a> (CC-BY-SA)",
            max_zoom: 17,
        }),
    ])
);
