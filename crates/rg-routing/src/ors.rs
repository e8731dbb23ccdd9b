//! OpenRouteService provider.
//!
//! # Endpoints
//!
//! | Call         | Request                                                           |
//! |--------------|-------------------------------------------------------------------|
//! | `directions` | `POST {base}/v2/directions/{profile}` `{"coordinates", "preference", "radiuses"}` |
//! | `snap`       | `POST {base}/v2/snap/{profile}` `{"locations", "radius"}`          |
//!
//! Directions answers carry `routes[0].geometry` as an encoded polyline
//! (precision 5).  Error bodies look like
//! `{"error": {"code": 2010, "message": "..."}}`.
//!
//! Response classification and parsing are plain functions so they can be
//! exercised without a network.  The HTTP client itself needs the `ors`
//! feature.

use std::time::Duration;

use serde::Deserialize;

use rg_core::Coordinate;

use crate::{ProviderError, ProviderResult};

/// ORS internal code: no route between the given points.
pub const ORS_ROUTE_NOT_FOUND: u32 = 2009;
/// ORS internal code: no routable point within the search radius.
pub const ORS_POINT_NOT_FOUND: u32 = 2010;

const POLYLINE_PRECISION: u32 = 5;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct OrsConfig {
    pub base_url: String,
    pub api_key: String,
    /// Search radius around each endpoint, metres.
    pub radius_m: f64,
    pub preference: String,
    pub timeout: Duration,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".into(),
            api_key: String::new(),
            radius_m: 2_000.0,
            preference: "recommended".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl OrsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Self::default() }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn radius_m(mut self, radius: f64) -> Self {
        self.radius_m = radius;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ── Response bodies ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<RouteJson>,
}

#[derive(Deserialize)]
struct RouteJson {
    geometry: String,
}

#[derive(Deserialize)]
struct SnapResponse {
    #[serde(default)]
    locations: Vec<Option<SnappedJson>>,
}

#[derive(Deserialize)]
struct SnappedJson {
    location: [f64; 2],
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorJson,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorJson {
    Coded { code: u32, #[serde(default)] message: String },
    Text(String),
}

// ── Pure helpers ──────────────────────────────────────────────────────────────

/// Map a non-2xx answer onto the provider error taxonomy.
pub fn classify_error(status: u16, body: &str, retry_after: Option<Duration>) -> ProviderError {
    let (code, message) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error: ErrorJson::Coded { code, message } }) => (Some(code), message),
        Ok(ErrorResponse { error: ErrorJson::Text(message) }) => (None, message),
        Err(_) => (None, body.trim().to_owned()),
    };
    let message = if message.is_empty() { format!("HTTP {status}") } else { message };

    if matches!(code, Some(ORS_ROUTE_NOT_FOUND | ORS_POINT_NOT_FOUND)) {
        return ProviderError::NoRoute(message);
    }
    match status {
        404 => ProviderError::NoRoute(message),
        429 => ProviderError::RateLimited { retry_after },
        401 | 403 => ProviderError::Unauthorized(message),
        400 | 406 | 413 => ProviderError::InvalidInput(message),
        500..=599 => ProviderError::Network(format!("HTTP {status}: {message}")),
        _ => ProviderError::Malformed(format!("unexpected HTTP {status}: {message}")),
    }
}

/// Decode the first route of a directions answer.
pub fn parse_directions(body: &str) -> ProviderResult<Vec<Coordinate>> {
    let resp: DirectionsResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    let route = resp
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("response has no routes".into()))?;
    let line = polyline::decode_polyline(&route.geometry, POLYLINE_PRECISION)
        .map_err(|e| ProviderError::Malformed(format!("geometry: {e}")))?;
    Ok(line.coords().map(|c| Coordinate::new(c.x, c.y)).collect())
}

/// Extract the single snapped location, `None` when the service found no
/// road within the radius.
pub fn parse_snap(body: &str) -> ProviderResult<Option<Coordinate>> {
    let resp: SnapResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    Ok(resp.locations.into_iter().next().flatten().map(|s| Coordinate::from(s.location)))
}

/// `Retry-After` in its delta-seconds form.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

// ── HTTP client ───────────────────────────────────────────────────────────────

#[cfg(feature = "ors")]
pub use client::OrsClient;

#[cfg(feature = "ors")]
mod client {
    use reqwest::blocking::{Client, Response};
    use reqwest::header::{AUTHORIZATION, RETRY_AFTER};

    use serde::Serialize;

    use rg_core::TravelProfile;

    use super::*;
    use crate::RouteProvider;

    #[derive(Serialize)]
    struct DirectionsBody<'a> {
        coordinates: [[f64; 2]; 2],
        preference: &'a str,
        radiuses: [f64; 2],
    }

    #[derive(Serialize)]
    struct SnapBody {
        locations: [[f64; 2]; 1],
        radius: f64,
    }

    /// Blocking OpenRouteService client.  Cheap to share across threads.
    pub struct OrsClient {
        config: OrsConfig,
        http: Client,
    }

    impl OrsClient {
        pub fn new(config: OrsConfig) -> ProviderResult<Self> {
            let http = Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| ProviderError::Network(format!("HTTP client: {e}")))?;
            Ok(Self { config, http })
        }

        pub fn config(&self) -> &OrsConfig {
            &self.config
        }

        fn post<B: Serialize>(&self, path: &str, body: &B) -> ProviderResult<String> {
            let url = format!("{}/v2/{path}", self.config.base_url.trim_end_matches('/'));
            let resp = self
                .http
                .post(&url)
                .header(AUTHORIZATION, &self.config.api_key)
                .json(body)
                .send()
                .map_err(|e| ProviderError::Network(e.to_string()))?;
            read_body(resp)
        }
    }

    fn read_body(resp: Response) -> ProviderResult<String> {
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = resp.text().map_err(|e| ProviderError::Network(e.to_string()))?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_error(status.as_u16(), &body, retry_after))
        }
    }

    impl RouteProvider for OrsClient {
        fn directions(
            &self,
            origin: Coordinate,
            destination: Coordinate,
            profile: TravelProfile,
        ) -> ProviderResult<Vec<Coordinate>> {
            let body = DirectionsBody {
                coordinates: [origin.into(), destination.into()],
                preference: &self.config.preference,
                radiuses: [self.config.radius_m; 2],
            };
            let text = self.post(&format!("directions/{}", profile.as_str()), &body)?;
            parse_directions(&text)
        }

        fn snap(&self, point: Coordinate, profile: TravelProfile) -> ProviderResult<Option<Coordinate>> {
            let body = SnapBody { locations: [point.into()], radius: self.config.radius_m };
            let text = self.post(&format!("snap/{}", profile.as_str()), &body)?;
            parse_snap(&text)
        }

        fn name(&self) -> &str {
            "openrouteservice"
        }
    }
}
