//! Forward geocoding through the OpenCage API.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::coordinate::{Coordinate, CoordinateError};

pub const OPENCAGE_ENDPOINT: &str = "https://api.opencagedata.com";

/// A single candidate returned for a query.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub coordinate: Coordinate,
    pub formatted: String,
    /// OpenCage confidence, 0 (unknown) to 10 (precise).
    pub confidence: Option<u8>,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("the geocoder rejected the query: {0}")]
    InvalidInput(String),
    #[error("invalid API key")]
    NotAuthorized,
    #[error("API quota exceeded")]
    QuotaExceeded,
    #[error("API key is disabled or blocked")]
    Forbidden,
    #[error("too many requests, rate limit exceeded")]
    RateLimited,
    #[error("geocoder returned status {code}: {message}")]
    Status { code: u16, message: String },
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoder returned an invalid position: {0}")]
    Position(#[from] CoordinateError),
}

/// Something that resolves free text to ranked candidate locations.
#[async_trait]
pub trait Geocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<Match>, GeocodeError>;
}

pub struct OpenCageGeocoder {
    client: Client,
    endpoint: String,
    key: String,
}

impl fmt::Debug for OpenCageGeocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenCageGeocoder")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl OpenCageGeocoder {
    pub fn new(endpoint: &str, key: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<OpenCageResult>,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    formatted: String,
    geometry: Geometry,
    confidence: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    status: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    message: String,
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Vec<Match>, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/geocode/v1/json", self.endpoint))
            .query(&[
                ("q", query),
                ("key", self.key.as_str()),
                ("no_annotations", "1"),
            ])
            .send()
            .await
            .map_err(without_url)?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.status.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            return Err(status_error(status, message));
        }

        let body = response
            .json::<OpenCageResponse>()
            .await
            .map_err(without_url)?;
        debug!("{} result(s)", body.results.len());

        body.results
            .into_iter()
            .map(|result| -> Result<Match, GeocodeError> {
                let Geometry { lat, lng } = result.geometry;
                Ok(Match {
                    coordinate: Coordinate::new(lat, lng)?,
                    formatted: result.formatted,
                    confidence: result.confidence,
                })
            })
            .collect()
    }
}

// The request URL carries the API key in its query string
fn without_url(error: reqwest::Error) -> GeocodeError {
    GeocodeError::Request(error.without_url())
}

fn status_error(status: StatusCode, message: String) -> GeocodeError {
    match status {
        StatusCode::BAD_REQUEST => GeocodeError::InvalidInput(message),
        StatusCode::UNAUTHORIZED => GeocodeError::NotAuthorized,
        StatusCode::PAYMENT_REQUIRED => GeocodeError::QuotaExceeded,
        StatusCode::FORBIDDEN => GeocodeError::Forbidden,
        StatusCode::TOO_MANY_REQUESTS => GeocodeError::RateLimited,
        _ => GeocodeError::Status {
            code: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn query_matcher(query: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), query.into()),
            Matcher::UrlEncoded("key".into(), "key".into()),
            Matcher::UrlEncoded("no_annotations".into(), "1".into()),
        ])
    }

    #[tokio::test]
    async fn geocode_returns_ranked_matches() -> Result<(), GeocodeError> {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/geocode/v1/json")
            .match_query(query_matcher("Delft"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(include_str!("../tests/resources/opencage_delft.json"))
            .create_async()
            .await;

        let geocoder = OpenCageGeocoder::new(&server.url(), "key")?;
        let matches = geocoder.geocode("Delft").await?;

        mock.assert_async().await;
        assert_eq!(
            matches,
            vec![
                Match {
                    coordinate: Coordinate::new(52.0114017, 4.3586970).unwrap(),
                    formatted: "Delft, South Holland, Netherlands".to_string(),
                    confidence: Some(7),
                },
                Match {
                    coordinate: Coordinate::new(-25.6522, 28.1789).unwrap(),
                    formatted: "Delft, Pretoria, South Africa".to_string(),
                    confidence: None,
                },
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn geocode_with_no_results_is_empty() -> Result<(), GeocodeError> {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/geocode/v1/json")
            .match_query(query_matcher("nowhere at all"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(include_str!("../tests/resources/opencage_no_results.json"))
            .create_async()
            .await;

        let geocoder = OpenCageGeocoder::new(&server.url(), "key")?;
        assert!(geocoder.geocode("nowhere at all").await?.is_empty());

        Ok(())
    }

    #[rstest]
    #[case(400, "invalid_input")]
    #[case(401, "not_authorized")]
    #[case(402, "quota_exceeded")]
    #[case(403, "forbidden")]
    #[case(429, "rate_limited")]
    #[case(503, "status 503: service down")]
    #[tokio::test]
    async fn geocode_maps_error_statuses(#[case] code: usize, #[case] expected: &str) {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/geocode/v1/json")
            .match_query(Matcher::Any)
            .with_status(code)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": {"code": 0, "message": "service down"}, "results": []}"#)
            .create_async()
            .await;

        let geocoder = OpenCageGeocoder::new(&server.url(), "key").unwrap();
        let error = geocoder.geocode("Delft").await.unwrap_err();

        let kind = match error {
            GeocodeError::InvalidInput(_) => "invalid_input".to_string(),
            GeocodeError::NotAuthorized => "not_authorized".to_string(),
            GeocodeError::QuotaExceeded => "quota_exceeded".to_string(),
            GeocodeError::Forbidden => "forbidden".to_string(),
            GeocodeError::RateLimited => "rate_limited".to_string(),
            GeocodeError::Status { code, message } => format!("status {code}: {message}"),
            other => format!("unexpected: {other}"),
        };
        assert_eq!(kind, expected);
    }

    #[tokio::test]
    async fn geocode_falls_back_to_the_reason_phrase() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/geocode/v1/json")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("not json")
            .create_async()
            .await;

        let geocoder = OpenCageGeocoder::new(&server.url(), "key").unwrap();
        let error = geocoder.geocode("Delft").await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "geocoder returned status 500: Internal Server Error"
        );
    }

    #[tokio::test]
    async fn connection_errors_do_not_reveal_the_key() {
        // nothing listens on the discard port
        let geocoder =
            OpenCageGeocoder::new("http://127.0.0.1:9", "secret-key").unwrap();
        let error = geocoder.geocode("Delft").await.unwrap_err();

        assert!(matches!(error, GeocodeError::Request(_)));
        let report = format!("{:?}", anyhow::Error::from(error));
        assert!(!report.contains("secret-key"), "{report}");
    }

    #[test]
    fn debug_output_hides_the_key() {
        let geocoder = OpenCageGeocoder::new(OPENCAGE_ENDPOINT, "secret-key").unwrap();
        let debug = format!("{geocoder:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}
