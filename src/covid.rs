use std::io::Read;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use hyper::client::HttpConnector;
use hyper::header;
use hyper::{body, Body, Client, Method, Request, Uri};
use hyper_tls::HttpsConnector;
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::FetchError;

/// One country entry as served by the statistics API.
///
/// The upstream object is kept as-is and serializes back to the same JSON;
/// the fields the map needs are read through accessors that return `None`
/// for anything missing, `null` or of the wrong type.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub(crate) struct CountryRecord {
    properties: Map<String, Value>,
}

impl CountryRecord {
    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub(crate) fn country(&self) -> Option<&str> {
        self.get("country").and_then(Value::as_str)
    }

    pub(crate) fn cases(&self) -> Option<u64> {
        self.get("cases").and_then(Value::as_u64)
    }

    pub(crate) fn deaths(&self) -> Option<u64> {
        self.get("deaths").and_then(Value::as_u64)
    }

    pub(crate) fn recovered(&self) -> Option<u64> {
        self.get("recovered").and_then(Value::as_u64)
    }

    /// Milliseconds since the Unix epoch.
    pub(crate) fn updated(&self) -> Option<i64> {
        let updated = self.get("updated")?;
        updated
            .as_i64()
            .or_else(|| updated.as_f64().filter(|ms| ms.is_finite()).map(|ms| ms as i64))
    }

    fn country_info(&self, key: &str) -> Option<f64> {
        self.get("countryInfo")?.get(key)?.as_f64()
    }

    pub(crate) fn lat(&self) -> Option<f64> {
        self.country_info("lat")
    }

    pub(crate) fn long(&self) -> Option<f64> {
        self.country_info("long")
    }
}

/// Anything able to hand out the current per-country statistics.
#[async_trait]
pub(crate) trait StatsSource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<CountryRecord>, FetchError>;

    /// Short identifier used in diagnostics.
    fn name(&self) -> &str;
}

pub(crate) type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

pub(crate) struct HttpStatsSource {
    endpoint: String,
    uri: Uri,
    client: HttpsClient,
}

impl HttpStatsSource {
    pub(crate) fn new(endpoint: &str) -> Result<Self, FetchError> {
        let uri: Uri = endpoint
            .parse()
            .map_err(|_| FetchError::InvalidEndpoint(endpoint.to_string()))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(FetchError::InvalidEndpoint(endpoint.to_string()));
        }

        Ok(HttpStatsSource {
            endpoint: endpoint.to_string(),
            uri,
            client: Client::builder().build::<HttpsConnector<HttpConnector>, Body>(HttpsConnector::new()),
        })
    }
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn fetch_countries(&self) -> Result<Vec<CountryRecord>, FetchError> {
        let request = Request::builder()
            .uri(self.uri.clone())
            .method(Method::GET)
            .header(header::ACCEPT, "application/json")
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::empty())?;

        let resp = self.client.request(request).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let gzipped = resp
            .headers()
            .get(header::CONTENT_ENCODING)
            .map_or(false, |encoding| encoding.as_bytes().eq_ignore_ascii_case(b"gzip"));

        let bytes = body::to_bytes(resp.into_body()).await?;

        debug!(endpoint = %self.endpoint, bytes = bytes.len(), gzipped, "received statistics payload");

        if gzipped {
            let mut gz = GzDecoder::new(&*bytes);
            let mut decoded_bytes: Vec<u8> = vec!();
            gz.read_to_end(&mut decoded_bytes)?;
            Ok(serde_json::from_slice(&decoded_bytes)?)
        } else {
            Ok(serde_json::from_slice(&bytes)?)
        }
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hyper::StatusCode;
    use serde_json::json;

    use super::*;

    pub(crate) fn record(country: &str, cases: u64, lat: f64, long: f64) -> CountryRecord {
        serde_json::from_value(json!({
            "country": country,
            "cases": cases,
            "deaths": cases / 20,
            "recovered": cases / 2,
            "updated": 1_585_000_000_000_i64,
            "countryInfo": { "lat": lat, "long": long, "iso2": &country[..2] },
            "active": cases / 3,
        }))
        .unwrap()
    }

    /// Serves the same records on every call and counts the calls.
    pub(crate) struct FixedSource {
        records: Vec<CountryRecord>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        pub(crate) fn new(records: Vec<CountryRecord>) -> Self {
            FixedSource { records, calls: AtomicUsize::new(0) }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatsSource for FixedSource {
        async fn fetch_countries(&self) -> Result<Vec<CountryRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    pub(crate) struct FailingSource;

    #[async_trait]
    impl StatsSource for FailingSource {
        async fn fetch_countries(&self) -> Result<Vec<CountryRecord>, FetchError> {
            Err(FetchError::Status(StatusCode::SERVICE_UNAVAILABLE))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }
}
