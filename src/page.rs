//! HTML shell around the map: page chrome, Leaflet assets and the data island
//! the client script reads markers from.

use serde_derive::Serialize;

use crate::config::LatLng;
use crate::constants::TileLayer;
use crate::map::MapHost;
use crate::marker::{Escape, MarkerVisual};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

const STYLE: &str = r#"
    body { margin: 0; font-family: system-ui, sans-serif; color: #1f2933; }
    header { display: flex; align-items: center; justify-content: space-between; padding: .75em 1.5em; background: #1f2933; color: #fff; }
    header a { color: #fff; text-decoration: none; }
    #map { height: 70vh; width: 100%; }
    .container { max-width: 60em; margin: 0 auto; padding: 1.5em; }
    .text-center { text-align: center; }
    .icon-marker { display: flex; align-items: center; justify-content: center; position: relative; width: 3.6em; height: 3.6em; margin: -1.8em 0 0 -1.8em; border-radius: 50%; font-size: .9em; font-weight: bold; color: #fff; background: rgba(190, 18, 60, .85); box-shadow: 0 0 0 2px #fff; }
    .icon-marker-tooltip { display: none; position: absolute; bottom: 100%; width: 16em; margin-bottom: .6em; padding: .8em 1em; color: #1f2933; font-weight: normal; background: #fff; border-radius: .4em; box-shadow: 0 2px 6px rgba(0, 0, 0, .3); }
    .icon-marker-tooltip h2 { margin: 0 0 .4em; font-size: 1.2em; }
    .icon-marker-tooltip ul { margin: 0; padding: 0; list-style: none; }
    .leaflet-marker-icon:hover .icon-marker-tooltip { display: block; }
    .unknown-locations .icon-marker { display: inline-flex; margin: 0 .5em 0 0; }
    .unknown-locations .icon-marker-tooltip { display: block; position: static; box-shadow: none; }
"#;

const SCRIPT: &str = r#"
    (function () {
      var data = JSON.parse(document.getElementById('map-data').textContent);
      var map = L.map('map').setView([data.center.lat, data.center.lng], data.zoom);
      L.tileLayer(data.tiles.url, { attribution: data.tiles.attribution, maxZoom: data.tiles.maxZoom }).addTo(map);
      data.markers.forEach(function (marker) {
        L.marker([marker.position.lat, marker.position.lng], {
          icon: L.divIcon({ className: 'icon', html: marker.html }),
          riseOnHover: marker.riseOnHover,
          riseOffset: marker.riseOffset
        }).addTo(map);
      });
    })();
"#;

#[derive(Serialize)]
struct MapData<'a> {
    center: LatLng,
    zoom: u8,
    tiles: &'a TileLayer,
    markers: Vec<&'a MarkerVisual>,
}

/// Serializes `value` for embedding inside a `<script>` element.
fn data_island<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    // `<` only ever occurs inside JSON strings, where `<` is an equivalent escape.
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

fn unknown_locations(host: &MapHost) -> String {
    let items: String = host
        .layer()
        .unplaced()
        .map(|marker| format!("<li>{}</li>", marker.html))
        .collect();
    if items.is_empty() {
        return String::new();
    }
    format!("<h3>Unknown location</h3><ul class=\"unknown-locations\">{items}</ul>")
}

pub(crate) fn render_page(title: &str, source_url: &str, host: &MapHost) -> Result<String, serde_json::Error> {
    let config = host.config();
    let data = data_island(&MapData {
        center: config.center,
        zoom: config.zoom,
        tiles: &config.base_layer,
        markers: host.layer().placed().collect(),
    })?;

    let summary = if host.layer().is_empty() {
        "No country statistics are available right now.".to_string()
    } else {
        match host.layer().placed().count() {
            1 => "Showing 1 country.".to_string(),
            n => format!("Showing {n} countries."),
        }
    };

    Ok(format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{title}</title>
  <link rel="stylesheet" href="{LEAFLET_CSS}" />
  <style>{STYLE}</style>
</head>
<body class="page-home">
  <header>
    <a href="/">COVID-19 Map</a>
    <nav><a href="/countries.geojson">GeoJSON</a></nav>
  </header>
  <main>
    <div id="map"></div>
    <div class="container text-center">
      <p class="note">{summary}</p>
      {unknown}
    </div>
    <div class="container text-center home-start">
      <h2>Want to see how this was made?</h2>
      <p>See the code here:</p>
      <a href="{source_url}">GitHub</a>
    </div>
  </main>
  <script type="application/json" id="map-data">{data}</script>
  <script src="{LEAFLET_JS}"></script>
  <script>{SCRIPT}</script>
</body>
</html>
"#,
        title = Escape(title),
        source_url = Escape(source_url),
        unknown = unknown_locations(host),
    ))
}
