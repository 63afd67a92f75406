//! REST client for Hive pipeline steps.
//!
//! A small JSON-over-HTTP client meant to be embedded in pipeline runnables
//! that need to call an arbitrary REST API. Transient failures (connection
//! errors, timeouts and retry-after statuses) are retried with a fixed delay
//! before giving up.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, warn};

use crate::error::{Result, UtilsError};

/// HTTP statuses worth retrying, matching the usual retry-after set
const RETRY_STATUS_CODES: [u16; 3] = [413, 429, 503];

/// Default number of retries on transient failures
const DEFAULT_RETRIES: u32 = 3;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default delay between retries
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// JSON REST client with retries for pipeline steps
#[derive(Debug, Clone)]
pub struct HiveRestClient {
    endpoint: String,
    method: Method,
    headers: HeaderMap,
    payload: Option<serde_json::Value>,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl HiveRestClient {
    /// Create a client for the given endpoint with the default parameter set.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf8"),
        );
        Self {
            endpoint: endpoint.into(),
            method: Method::GET,
            headers,
            payload: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Perform the configured request and return the JSON response body.
    pub async fn fetch(&self) -> Result<serde_json::Value> {
        let mut attempt = 0;
        loop {
            match self.send_once().await {
                Ok(response) => {
                    let status = response.status();
                    if RETRY_STATUS_CODES.contains(&status.as_u16()) && attempt < self.max_retries {
                        warn!(%status, attempt, endpoint = %self.endpoint, "Retrying request");
                    } else if !status.is_success() {
                        return Err(UtilsError::ResponseStatus {
                            status: status.as_u16(),
                            url: self.endpoint.clone(),
                        });
                    } else {
                        debug!(%status, endpoint = %self.endpoint, "Request succeeded");
                        return Ok(response.json().await?);
                    }
                }
                Err(error) if attempt < self.max_retries && is_transient(&error) => {
                    warn!(%error, attempt, endpoint = %self.endpoint, "Retrying request");
                }
                Err(error) => return Err(error.into()),
            }
            attempt += 1;
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn send_once(&self) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .request(self.method.clone(), &self.endpoint)
            .headers(self.headers.clone())
            .timeout(self.timeout);
        if let Some(payload) = &self.payload {
            request = request.json(payload);
        }
        request.send().await
    }
}

/// Only timeouts and failed connections are worth another attempt;
/// anything else fails the same way every time.
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_get_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/endpoint"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let client = HiveRestClient::new(format!("{}/api/endpoint", server.uri()));
        let response = client.fetch().await.unwrap();
        assert_eq!(response["status"], "ok");
    }

    #[tokio::test]
    async fn test_fetch_post_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/jobs"))
            .and(body_json(json!({"analysis": "dump"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": 42})))
            .mount(&server)
            .await;

        let client = HiveRestClient::new(format!("{}/api/jobs", server.uri()))
            .with_method(Method::POST)
            .with_payload(json!({"analysis": "dump"}));
        let response = client.fetch().await.unwrap();
        assert_eq!(response["job_id"], 42);
    }

    #[tokio::test]
    async fn test_fetch_retries_on_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recovered": true})))
            .mount(&server)
            .await;

        let client = HiveRestClient::new(format!("{}/api/flaky", server.uri()))
            .with_retries(3, Duration::from_millis(10));
        let response = client.fetch().await.unwrap();
        assert_eq!(response["recovered"], true);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HiveRestClient::new(format!("{}/api/down", server.uri()))
            .with_retries(1, Duration::from_millis(10));
        let result = client.fetch().await;
        assert!(matches!(
            result,
            Err(UtilsError::ResponseStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_broken_connection_not_retried() {
        // A server that accepts and immediately closes produces a request
        // error that is neither a timeout nor a failed connection
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                drop(stream);
            }
        });

        let client = HiveRestClient::new(format!("http://{addr}/api"))
            .with_retries(3, Duration::from_secs(5));
        let start = std::time::Instant::now();
        let result = client.fetch().await;
        assert!(matches!(result, Err(UtilsError::Http(_))));
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "non-transient error was retried"
        );
    }

    #[tokio::test]
    async fn test_fetch_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = HiveRestClient::new(format!("{}/api/missing", server.uri()));
        let result = client.fetch().await;
        assert!(matches!(
            result,
            Err(UtilsError::ResponseStatus { status: 404, .. })
        ));
    }
}
