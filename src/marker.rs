use std::fmt::{self, Write as _};

use html_escaper::HtmlEscaper;
use serde_derive::Serialize;

use crate::config::{DateFormat, LatLng};
use crate::constants::RISE_OFFSET;
use crate::geojson::{FeatureCollection, GeoFeature};

pub(crate) const ABBREVIATION_THRESHOLD: u64 = 1000;
const UNKNOWN_COUNT: &str = "n/a";
const UNKNOWN_COUNTRY: &str = "Unknown";

/// Displays the wrapped text HTML-escaped.
pub(crate) struct Escape<'a>(pub(crate) &'a str);

impl fmt::Display for Escape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        HtmlEscaper(f).write_str(self.0)
    }
}

/// Short label shown on the pin: anything above a thousand loses its last three digits.
pub(crate) fn abbreviate_cases(cases: u64) -> String {
    let cases_string = cases.to_string();
    if cases > ABBREVIATION_THRESHOLD {
        format!("{}k+", &cases_string[..cases_string.len() - 3])
    } else {
        cases_string
    }
}

fn count_or_unknown(count: Option<u64>) -> String {
    count.map_or_else(|| UNKNOWN_COUNT.to_string(), |c| c.to_string())
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct Tooltip {
    pub(crate) country: String,
    pub(crate) confirmed: String,
    pub(crate) deaths: String,
    pub(crate) recovered: String,
    #[serde(rename = "lastUpdate", skip_serializing_if = "Option::is_none")]
    pub(crate) last_update: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct MarkerVisual {
    /// `None` when the source record had no usable location.
    pub(crate) position: Option<LatLng>,
    pub(crate) label: String,
    pub(crate) tooltip: Tooltip,
    pub(crate) html: String,
    #[serde(rename = "riseOnHover")]
    pub(crate) rise_on_hover: bool,
    #[serde(rename = "riseOffset")]
    pub(crate) rise_offset: i32,
}

impl MarkerVisual {
    pub(crate) fn from_feature(feature: &GeoFeature, date_format: &DateFormat) -> Self {
        let properties = &feature.properties;

        let label = properties.cases().map_or_else(|| UNKNOWN_COUNT.to_string(), abbreviate_cases);
        let tooltip = Tooltip {
            country: properties.country().unwrap_or(UNKNOWN_COUNTRY).to_string(),
            confirmed: count_or_unknown(properties.cases()),
            deaths: count_or_unknown(properties.deaths()),
            recovered: count_or_unknown(properties.recovered()),
            last_update: properties.updated().and_then(|millis| date_format.format_millis(millis)),
        };
        let html = marker_html(&label, &tooltip);

        MarkerVisual {
            position: feature.geometry.map(|point| point.lat_lng()),
            label,
            tooltip,
            html,
            rise_on_hover: true,
            rise_offset: RISE_OFFSET,
        }
    }

    pub(crate) fn is_placed(&self) -> bool {
        self.position.is_some()
    }
}

fn marker_html(label: &str, tooltip: &Tooltip) -> String {
    let mut items = format!(
        "<li><strong>Confirmed:</strong> {}</li><li><strong>Deaths:</strong> {}</li><li><strong>Recovered:</strong> {}</li>",
        Escape(&tooltip.confirmed),
        Escape(&tooltip.deaths),
        Escape(&tooltip.recovered),
    );
    if let Some(last_update) = &tooltip.last_update {
        items.push_str(&format!("<li><strong>Last Update:</strong> {}</li>", Escape(last_update)));
    }

    format!(
        "<span class=\"icon-marker\"><span class=\"icon-marker-tooltip\"><h2>{}</h2><ul>{}</ul></span>{}</span>",
        Escape(&tooltip.country),
        items,
        Escape(label),
    )
}

/// Markers attached to a map surface, in the order they were added.
#[derive(Debug, Default)]
pub(crate) struct MarkerLayer {
    markers: Vec<MarkerVisual>,
}

impl MarkerLayer {
    pub(crate) fn add(&mut self, marker: MarkerVisual) {
        self.markers.push(marker);
    }

    pub(crate) fn markers(&self) -> &[MarkerVisual] {
        &self.markers
    }

    pub(crate) fn placed(&self) -> impl Iterator<Item = &MarkerVisual> {
        self.markers().iter().filter(|m| m.is_placed())
    }

    pub(crate) fn unplaced(&self) -> impl Iterator<Item = &MarkerVisual> {
        self.markers().iter().filter(|m| !m.is_placed())
    }

    pub(crate) fn len(&self) -> usize {
        self.markers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Builds one marker per feature and attaches them all to `layer`. Returns how many were added.
pub(crate) fn render_markers(collection: &FeatureCollection, date_format: &DateFormat, layer: &mut MarkerLayer) -> usize {
    for feature in &collection.features {
        layer.add(MarkerVisual::from_feature(feature, date_format));
    }
    collection.len()
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use serde_json::json;

    use super::*;
    use crate::config::DisplayZone;
    use crate::covid::testing::record;
    use crate::covid::CountryRecord;
    use crate::geojson::to_feature_collection;

    fn utc() -> DateFormat {
        DateFormat::new(DisplayZone::Fixed(FixedOffset::east_opt(0).unwrap()), "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn abbreviates_strictly_above_one_thousand() {
        assert_eq!(abbreviate_cases(1500), "1k+");
        assert_eq!(abbreviate_cases(999), "999");
        assert_eq!(abbreviate_cases(1000), "1000");
        assert_eq!(abbreviate_cases(1001), "1k+");
        assert_eq!(abbreviate_cases(69176), "69k+");
        assert_eq!(abbreviate_cases(1_250_000), "1250k+");
        assert_eq!(abbreviate_cases(0), "0");
    }

    #[test]
    fn marker_carries_label_tooltip_and_position() {
        let collection = to_feature_collection(vec![record("Italy", 69176, 42.5, 12.5)]);
        let marker = MarkerVisual::from_feature(&collection.features[0], &utc());

        assert_eq!(marker.position, Some(LatLng { lat: 42.5, lng: 12.5 }));
        assert_eq!(marker.label, "69k+");
        assert_eq!(
            marker.tooltip,
            Tooltip {
                country: "Italy".to_string(),
                confirmed: "69176".to_string(),
                deaths: "3458".to_string(),
                recovered: "34588".to_string(),
                last_update: Some("2020-03-23 21:46".to_string()),
            }
        );
        assert!(marker.rise_on_hover);
        assert!(marker.html.contains("<h2>Italy</h2>"));
        assert!(marker.html.contains("<li><strong>Confirmed:</strong> 69176</li>"));
        assert!(marker.html.contains("<li><strong>Last Update:</strong> 2020-03-23 21:46</li>"));
        assert!(marker.html.ends_with("69k+</span>"));
    }

    #[test]
    fn missing_timestamp_omits_last_update() {
        let bare: CountryRecord = serde_json::from_value(json!({
            "country": "Vatican City",
            "cases": 4,
            "deaths": 0,
            "recovered": 0,
            "countryInfo": { "lat": 41.9, "long": 12.45 }
        }))
        .unwrap();
        let collection = to_feature_collection(vec![bare]);
        let marker = MarkerVisual::from_feature(&collection.features[0], &utc());

        assert_eq!(marker.tooltip.last_update, None);
        assert!(!marker.html.contains("Last Update"));
        assert_eq!(marker.label, "4");
    }

    #[test]
    fn missing_counts_show_as_unknown() {
        let sparse: CountryRecord = serde_json::from_value(json!({ "country": "Greenland" })).unwrap();
        let marker = MarkerVisual::from_feature(&to_feature_collection(vec![sparse]).features[0], &utc());
        assert_eq!(marker.label, "n/a");
        assert_eq!(marker.tooltip.country, "Greenland");

        let nameless: CountryRecord =
            serde_json::from_value(json!({ "country": null, "cases": 2500, "recovered": null })).unwrap();
        let marker = MarkerVisual::from_feature(&to_feature_collection(vec![nameless]).features[0], &utc());
        assert_eq!(marker.label, "2k+");
        assert_eq!(marker.tooltip.country, "Unknown");
        assert_eq!(marker.tooltip.recovered, "n/a");
        assert_eq!(marker.tooltip.recovered, "n/a");
        assert!(!marker.is_placed());
    }

    #[test]
    fn escape_writes_html_entities() {
        let escaped = Escape("Bosnia & <Herzegovina>").to_string();
        assert!(escaped.starts_with("Bosnia &amp; &lt;Herzegovina&gt;"));
        assert!(!escaped.contains('<'));
    }

    #[test]
    fn country_names_are_escaped() {
        let hostile = record("<script>alert(1)</script>", 12, 1.0, 1.0);
        let marker = MarkerVisual::from_feature(&to_feature_collection(vec![hostile]).features[0], &utc());
        assert!(!marker.html.contains("<script>"));
        assert!(marker.html.contains("&lt;script&gt;"));
        assert_eq!(marker.tooltip.country, "<script>alert(1)</script>");
    }

    #[test]
    fn render_attaches_every_feature_in_order() {
        let collection = to_feature_collection(vec![
            record("Italy", 69176, 42.5, 12.5),
            serde_json::from_value(json!({ "country": "MS Zaandam", "cases": 9 })).unwrap(),
            record("Chile", 922, -30.5, -71.5),
        ]);
        let mut layer = MarkerLayer::default();

        assert_eq!(render_markers(&collection, &utc(), &mut layer), 3);
        let labels: Vec<_> = layer.markers().iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["69k+", "9", "922"]);
        assert_eq!(layer.placed().count(), 2);
        assert_eq!(layer.unplaced().map(|m| m.tooltip.country.as_str()).collect::<Vec<_>>(), ["MS Zaandam"]);
    }
}
