// SPDX-License-Identifier: GPL-3.0-only

//! Reverse geocoding with a session-lifetime cache
//!
//! Coordinates are quantized to four decimal places (about an 11 m grid)
//! before lookup. The cache only grows; the grid bounds its size for
//! realistic movement. Resolution never fails: any service problem yields
//! the "Unknown" placeholder, which is not cached so a later fix can retry.

use crate::config::Config;
use crate::constants::{geocoding, positioning};
use crate::errors::GeocodeError;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Quantized coordinate pair used as cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lat_e4: i64,
    lon_e4: i64,
}

impl CoordKey {
    pub fn from_coords(latitude: f64, longitude: f64) -> Self {
        let scale = 10f64.powi(positioning::CACHE_PRECISION);
        Self {
            lat_e4: (latitude * scale).round() as i64,
            lon_e4: (longitude * scale).round() as i64,
        }
    }
}

impl std::fmt::Display for CoordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.4},{:.4}",
            self.lat_e4 as f64 / 1e4,
            self.lon_e4 as f64 / 1e4
        )
    }
}

/// Quantized coordinate → place name
///
/// Safe to share between concurrent resolutions. Inserting an existing key
/// overwrites it; values for one key are expected to be stable.
#[derive(Debug, Default)]
pub struct PlaceNameCache {
    entries: Mutex<HashMap<CoordKey, String>>,
}

impl PlaceNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<CoordKey, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &CoordKey) -> Option<String> {
        self.entries().get(key).cloned()
    }

    pub fn insert(&self, key: CoordKey, name: String) {
        self.entries().insert(key, name);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

/// Address breakdown returned by the geocoding service
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub municipality: Option<String>,
    pub village: Option<String>,
}

impl Address {
    /// First available of city, town, municipality, village
    pub fn place_name(&self) -> Option<&str> {
        [&self.city, &self.town, &self.municipality, &self.village]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .find(|s| !s.trim().is_empty())
    }
}

/// Reverse geocoding service
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the address for a coordinate pair
    fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<Address, GeocodeError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

/// Nominatim (OpenStreetMap) reverse geocoding client
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    zoom: u8,
}

impl NominatimGeocoder {
    /// Create a client for the default public endpoint
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_settings(
            geocoding::DEFAULT_ENDPOINT,
            geocoding::DEFAULT_USER_AGENT,
            geocoding::DEFAULT_ZOOM,
            geocoding::DEFAULT_TIMEOUT,
        )
    }

    /// Create a client from the application config
    pub fn from_config(config: &Config) -> Result<Self, GeocodeError> {
        Self::with_settings(
            &config.geocoder_endpoint,
            &config.geocoder_user_agent,
            config.geocoder_zoom,
            Duration::from_secs(config.geocoder_timeout_secs),
        )
    }

    pub fn with_settings(
        endpoint: &str,
        user_agent: &str,
        zoom: u8,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            zoom,
        })
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Address, GeocodeError> {
        let query = [
            ("format", "jsonv2".to_string()),
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("zoom", self.zoom.to_string()),
            ("addressdetails", "1".to_string()),
        ];

        let response = self.client.get(&self.endpoint).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body: ReverseResponse = response.json().await?;
        Ok(body.address.unwrap_or_default())
    }
}

/// Cache-first place-name resolution
#[derive(Debug)]
pub struct PlaceResolver<G> {
    geocoder: G,
    cache: PlaceNameCache,
}

impl<G: ReverseGeocoder> PlaceResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self {
            geocoder,
            cache: PlaceNameCache::new(),
        }
    }

    pub fn cache(&self) -> &PlaceNameCache {
        &self.cache
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Resolve a coordinate pair to a place name
    ///
    /// Served from the cache when the quantized key is known. Never fails;
    /// lookups that go wrong return "Unknown".
    pub async fn resolve(&self, latitude: f64, longitude: f64) -> String {
        let key = CoordKey::from_coords(latitude, longitude);

        if let Some(name) = self.cache.get(&key) {
            debug!(%key, name = %name, "Place name cache hit");
            return name;
        }

        debug!(%key, "Place name cache miss");
        match self.geocoder.reverse(latitude, longitude).await {
            Ok(address) => {
                let name = address
                    .place_name()
                    .unwrap_or(positioning::UNKNOWN_PLACE)
                    .to_string();
                self.cache.insert(key, name.clone());
                name
            }
            Err(e) => {
                warn!(%key, error = %e, "Reverse geocoding failed");
                positioning::UNKNOWN_PLACE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        calls: Arc<AtomicUsize>,
        result: Result<Address, GeocodeError>,
    }

    impl ReverseGeocoder for CountingGeocoder {
        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Address, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn berlin() -> Address {
        Address {
            city: Some("Berlin".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_coord_key_quantization() {
        assert_eq!(
            CoordKey::from_coords(52.5200, 13.4050),
            CoordKey::from_coords(52.52001, 13.40499)
        );
        assert_ne!(
            CoordKey::from_coords(52.5200, 13.4050),
            CoordKey::from_coords(52.5201, 13.4050)
        );
        assert_eq!(
            CoordKey::from_coords(52.52, 13.405).to_string(),
            "52.5200,13.4050"
        );
    }

    #[test]
    fn test_address_priority() {
        let address = Address {
            city: None,
            town: Some("".to_string()),
            municipality: Some("Gemeinde".to_string()),
            village: Some("Dorf".to_string()),
        };
        assert_eq!(address.place_name(), Some("Gemeinde"));
        assert_eq!(Address::default().place_name(), None);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"place_id":1,"address":{"town":"Potsdam","country":"Germany"}}"#;
        let parsed: ReverseResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.address.unwrap().place_name(), Some("Potsdam"));

        let body = r#"{"error":"Unable to geocode"}"#;
        let parsed: ReverseResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.address.is_none());
    }

    #[tokio::test]
    async fn test_second_lookup_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = PlaceResolver::new(CountingGeocoder {
            calls: Arc::clone(&calls),
            result: Ok(berlin()),
        });

        assert_eq!(resolver.resolve(52.5200, 13.4050).await, "Berlin");
        assert_eq!(resolver.resolve(52.52001, 13.40499).await, "Berlin");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_returns_unknown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = PlaceResolver::new(CountingGeocoder {
            calls: Arc::clone(&calls),
            result: Err(GeocodeError::Status(503)),
        });

        assert_eq!(resolver.resolve(48.8566, 2.3522).await, "Unknown");
        assert!(resolver.cache().is_empty());

        // Failures are retried on the next fix
        assert_eq!(resolver.resolve(48.8566, 2.3522).await, "Unknown");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_address_without_place_caches_unknown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = PlaceResolver::new(CountingGeocoder {
            calls: Arc::clone(&calls),
            result: Ok(Address::default()),
        });

        assert_eq!(resolver.resolve(0.0, -30.0).await, "Unknown");
        assert_eq!(resolver.resolve(0.0, -30.0).await, "Unknown");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolution_keeps_cache_consistent() {
        let resolver = Arc::new(PlaceResolver::new(CountingGeocoder {
            calls: Arc::new(AtomicUsize::new(0)),
            result: Ok(berlin()),
        }));

        let a = tokio::spawn({
            let resolver = Arc::clone(&resolver);
            async move { resolver.resolve(52.5200, 13.4050).await }
        });
        let b = tokio::spawn({
            let resolver = Arc::clone(&resolver);
            async move { resolver.resolve(52.52002, 13.40502).await }
        });

        assert_eq!(a.await.unwrap(), "Berlin");
        assert_eq!(b.await.unwrap(), "Berlin");
        assert_eq!(resolver.cache().len(), 1);
    }

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/reverse", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });

        (endpoint, server)
    }

    fn client(endpoint: &str) -> NominatimGeocoder {
        NominatimGeocoder::with_settings(
            endpoint,
            geocoding::DEFAULT_USER_AGENT,
            geocoding::DEFAULT_ZOOM,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_nominatim_request_and_address() {
        let (endpoint, server) = serve_once("200 OK", r#"{"address":{"village":"Dorf"}}"#).await;
        let resolver = PlaceResolver::new(client(&endpoint));

        assert_eq!(resolver.resolve(52.52, 13.405).await, "Dorf");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with(
            "get /reverse?format=jsonv2&lat=52.52&lon=13.405&zoom=14&addressdetails=1 http/1.1\r\n"
        ));
        assert!(request.contains("user-agent: webcamwizard/1.0 (educational project)\r\n"));
    }

    #[tokio::test]
    async fn test_nominatim_error_status() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "").await;

        let result = client(&endpoint).reverse(52.52, 13.405).await;
        assert!(matches!(result, Err(GeocodeError::Status(500))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_nominatim_unparseable_body() {
        let (endpoint, server) = serve_once("200 OK", "<html>busy</html>").await;

        let result = client(&endpoint).reverse(52.52, 13.405).await;
        assert!(matches!(result, Err(GeocodeError::Malformed(_))));
        server.await.unwrap();
    }
}
