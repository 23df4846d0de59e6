// Availability oracle: the external booking authority deciding which
// accommodations are still free for a date range

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, Instrument};

use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::model::{AccommodationId, DateRange};

pub const FILTER_AVAILABLE_PATH: &str = "/booking/accommodation/available";

#[async_trait]
pub trait AvailabilityOracle: Send + Sync + 'static {
    // Returns the raw identifiers the authority reports as free; correlating
    // them with the candidates is the caller's job
    async fn filter_available(
        &self,
        ids: &[AccommodationId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, OracleError>;
}

#[derive(Debug, Serialize)]
struct FilterAvailableRequest<'a> {
    accommodation_ids: Vec<&'a str>,
    start_date: String,
    end_date: String,
}

#[derive(Debug, Deserialize)]
struct FilterAvailableResponse {
    #[serde(default)]
    accommodation_ids: Vec<String>,
}

// Dates travel as RFC3339 timestamps at midnight UTC
fn wire_date(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

// JSON-over-HTTP client for the booking service
pub struct HttpAvailabilityOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl HttpAvailabilityOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            FILTER_AVAILABLE_PATH
        )
    }

    fn map_transport_error(&self, err: reqwest::Error) -> OracleError {
        if err.is_timeout() {
            OracleError::Timeout(self.config.timeout_ms)
        } else {
            OracleError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl AvailabilityOracle for HttpAvailabilityOracle {
    async fn filter_available(
        &self,
        ids: &[AccommodationId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, OracleError> {
        let body = FilterAvailableRequest {
            accommodation_ids: ids.iter().map(AccommodationId::as_str).collect(),
            start_date: wire_date(start),
            end_date: wire_date(end),
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OracleError::Rejected {
                status_code: status.as_u16(),
                message,
            });
        }

        let decoded: FilterAvailableResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Decode(e.to_string()))?;
        Ok(decoded.accommodation_ids)
    }
}

/// Booking ledger kept in process, answering availability by half-open
/// range overlap. Used for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryAvailabilityOracle {
    bookings: DashMap<AccommodationId, Vec<DateRange>>,
    calls: AtomicUsize,
}

impl InMemoryAvailabilityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    // Records a booking; false when it collides with an existing one
    pub fn book(&self, id: &AccommodationId, range: DateRange) -> bool {
        let mut ranges = self.bookings.entry(id.clone()).or_default();
        if ranges.iter().any(|booked| booked.overlaps(&range)) {
            return false;
        }
        ranges.push(range);
        true
    }

    pub fn is_available(&self, id: &AccommodationId, range: &DateRange) -> bool {
        self.bookings
            .get(id)
            .map_or(true, |ranges| !ranges.iter().any(|booked| booked.overlaps(range)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityOracle for InMemoryAvailabilityOracle {
    async fn filter_available(
        &self,
        ids: &[AccommodationId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let requested = DateRange::new(start, end);
        Ok(ids
            .iter()
            .filter(|id| self.is_available(id, &requested))
            .map(|id| id.to_string())
            .collect())
    }
}

// Logging decorator around any oracle
pub struct TracedOracle<O> {
    inner: O,
    name: &'static str,
}

impl<O: AvailabilityOracle> TracedOracle<O> {
    pub fn new(name: &'static str, inner: O) -> Self {
        Self { inner, name }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

#[async_trait]
impl<O: AvailabilityOracle> AvailabilityOracle for TracedOracle<O> {
    async fn filter_available(
        &self,
        ids: &[AccommodationId],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, OracleError> {
        let span = tracing::info_span!(
            "filter_available",
            oracle = self.name,
            candidates = ids.len(),
            %start,
            %end
        );

        async {
            debug!("Filtering available accommodations");
            let started = Instant::now();
            let result = self.inner.filter_available(ids, start, end).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(available) => info!(
                    available = available.len(),
                    elapsed_ms, "Available accommodations filtered"
                ),
                Err(err) => error!(error = %err, elapsed_ms, "Availability oracle call failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::date;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn id(raw: &str) -> AccommodationId {
        AccommodationId::parse(raw).unwrap()
    }

    // Answers a single HTTP request with a canned response and hands back the
    // raw request text it received
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            let _ = tx.send(String::from_utf8_lossy(&received).into_owned());
        });

        (base_url, rx)
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        received.len() >= header_end + 4 + content_length
    }

    fn oracle_at(base_url: String, api_key: &str) -> HttpAvailabilityOracle {
        HttpAvailabilityOracle::new(OracleConfig {
            base_url,
            api_key: api_key.to_string(),
            timeout_ms: 2000,
        })
        .unwrap()
    }

    #[test]
    fn test_wire_date_format() {
        assert_eq!(wire_date(date(2025, 6, 1)), "2025-06-01T00:00:00Z");
    }

    #[test]
    fn test_request_serialization() {
        let ids = vec![id("6643a56c9dea1760db469b7b")];
        let body = FilterAvailableRequest {
            accommodation_ids: ids.iter().map(AccommodationId::as_str).collect(),
            start_date: wire_date(date(2025, 6, 1)),
            end_date: wire_date(date(2025, 6, 4)),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "accommodation_ids": ["6643a56c9dea1760db469b7b"],
                "start_date": "2025-06-01T00:00:00Z",
                "end_date": "2025-06-04T00:00:00Z",
            })
        );
    }

    #[test]
    fn test_response_without_ids_decodes_as_empty() {
        let decoded: FilterAvailableResponse = serde_json::from_str("{}").unwrap();
        assert!(decoded.accommodation_ids.is_empty());
    }

    #[tokio::test]
    async fn test_endpoint_joins_base_url() {
        let oracle = HttpAvailabilityOracle::new(OracleConfig {
            base_url: "http://booking:8001/".to_string(),
            ..OracleConfig::default()
        })
        .unwrap();
        assert_eq!(
            oracle.endpoint(),
            "http://booking:8001/booking/accommodation/available"
        );
    }

    #[tokio::test]
    async fn test_http_oracle_unreachable_is_an_error() {
        // Nothing listens on port 9 (discard) in the test environment
        let oracle = HttpAvailabilityOracle::new(OracleConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: String::new(),
            timeout_ms: 500,
        })
        .unwrap();

        let result = oracle
            .filter_available(
                &[id("6643a56c9dea1760db469b7b")],
                date(2025, 6, 1),
                date(2025, 6, 2),
            )
            .await;
        assert!(matches!(
            result,
            Err(OracleError::Unavailable(_)) | Err(OracleError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_http_oracle_decodes_available_ids() {
        let (base_url, received) = serve_once(
            "200 OK",
            r#"{"accommodation_ids":["6643a56c9dea1760db469b7b"]}"#,
        )
        .await;
        let oracle = oracle_at(base_url, "secret-key");
        let ids = [id("6643a56c9dea1760db469b7b"), id("6643bdc7240f80f13b5d18d7")];

        let available = oracle
            .filter_available(&ids, date(2025, 6, 1), date(2025, 6, 4))
            .await
            .unwrap();
        assert_eq!(available, vec!["6643a56c9dea1760db469b7b".to_string()]);

        let request = received.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert_eq!(request_line, format!("POST {FILTER_AVAILABLE_PATH} HTTP/1.1"));
        let lowered = request.to_ascii_lowercase();
        assert!(lowered.contains("authorization: bearer secret-key"));
        assert!(request.contains(r#""start_date":"2025-06-01T00:00:00Z""#));
        assert!(request.contains("6643bdc7240f80f13b5d18d7"));
    }

    #[tokio::test]
    async fn test_http_oracle_omits_auth_without_api_key() {
        let (base_url, received) = serve_once("200 OK", r#"{"accommodation_ids":[]}"#).await;
        let oracle = oracle_at(base_url, "");

        let available = oracle
            .filter_available(
                &[id("6643a56c9dea1760db469b7b")],
                date(2025, 6, 1),
                date(2025, 6, 2),
            )
            .await
            .unwrap();
        assert!(available.is_empty());

        let request = received.await.unwrap();
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_http_oracle_maps_error_status_to_rejected() {
        let (base_url, _received) = serve_once("503 Service Unavailable", "booking down").await;
        let oracle = oracle_at(base_url, "secret-key");

        let result = oracle
            .filter_available(
                &[id("6643a56c9dea1760db469b7b")],
                date(2025, 6, 1),
                date(2025, 6, 2),
            )
            .await;
        assert_eq!(
            result,
            Err(OracleError::Rejected {
                status_code: 503,
                message: "booking down".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_http_oracle_undecodable_body_is_decode_error() {
        let (base_url, _received) = serve_once("200 OK", "not json").await;
        let oracle = oracle_at(base_url, "secret-key");

        let result = oracle
            .filter_available(
                &[id("6643a56c9dea1760db469b7b")],
                date(2025, 6, 1),
                date(2025, 6, 2),
            )
            .await;
        assert!(matches!(result, Err(OracleError::Decode(_))));
    }

    #[tokio::test]
    async fn test_in_memory_oracle_filters_booked() {
        let oracle = InMemoryAvailabilityOracle::new();
        let booked = id("6643a56c9dea1760db469b7b");
        let free = id("6643bdc7240f80f13b5d18d7");
        assert!(oracle.book(&booked, DateRange::new(date(2025, 6, 2), date(2025, 6, 5))));

        let available = oracle
            .filter_available(
                &[booked.clone(), free.clone()],
                date(2025, 6, 1),
                date(2025, 6, 3),
            )
            .await
            .unwrap();
        assert_eq!(available, vec![free.to_string()]);

        // Checkout day of the existing booking is free again
        let available = oracle
            .filter_available(&[booked.clone(), free], date(2025, 6, 5), date(2025, 6, 7))
            .await
            .unwrap();
        assert_eq!(available.len(), 2);
        assert_eq!(oracle.calls(), 2);
    }

    #[test]
    fn test_double_booking_rejected() {
        let oracle = InMemoryAvailabilityOracle::new();
        let target = id("6643a56c9dea1760db469b7b");
        assert!(oracle.book(&target, DateRange::new(date(2025, 6, 1), date(2025, 6, 4))));
        assert!(!oracle.book(&target, DateRange::new(date(2025, 6, 3), date(2025, 6, 6))));
        assert!(oracle.book(&target, DateRange::new(date(2025, 6, 4), date(2025, 6, 6))));
    }

    #[tokio::test]
    async fn test_traced_oracle_passes_results_through() {
        let traced = TracedOracle::new("in-memory", InMemoryAvailabilityOracle::new());
        let target = id("6643a56c9dea1760db469b7b");

        let available = traced
            .filter_available(
                std::slice::from_ref(&target),
                date(2025, 6, 1),
                date(2025, 6, 2),
            )
            .await
            .unwrap();
        assert_eq!(available, vec![target.to_string()]);
        assert_eq!(traced.inner().calls(), 1);
    }
}
