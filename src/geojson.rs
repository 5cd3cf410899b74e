use serde_derive::Serialize;

use crate::config::LatLng;
use crate::covid::CountryRecord;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub(crate) features: Vec<GeoFeature>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct GeoFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub(crate) properties: CountryRecord,
    /// `None` serializes as `null`, GeoJSON's "unlocated feature".
    pub(crate) geometry: Option<Point>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub(crate) struct Point {
    #[serde(rename = "type")]
    kind: &'static str,
    /// `[longitude, latitude]`
    pub(crate) coordinates: [f64; 2],
}

impl Point {
    pub(crate) fn from_lat_lng(position: LatLng) -> Self {
        Point { kind: "Point", coordinates: [position.lng, position.lat] }
    }

    pub(crate) fn lat_lng(&self) -> LatLng {
        LatLng { lat: self.coordinates[1], lng: self.coordinates[0] }
    }
}

impl FeatureCollection {
    pub(crate) fn len(&self) -> usize {
        self.features.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl GeoFeature {
    fn from_record(record: CountryRecord) -> Self {
        let geometry = match (record.lat(), record.long()) {
            (Some(lat), Some(long)) => LatLng::new(lat, long).map(Point::from_lat_lng),
            _ => None,
        };
        GeoFeature { kind: "Feature", properties: record, geometry }
    }
}

/// One feature per record, in input order. Records without a usable location
/// keep their place in the collection with a `null` geometry.
pub(crate) fn to_feature_collection(records: Vec<CountryRecord>) -> FeatureCollection {
    FeatureCollection {
        kind: "FeatureCollection",
        features: records.into_iter().map(GeoFeature::from_record).collect(),
    }
}
