use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::HttpConfig;
use crate::error::Result;

const USER_AGENT: &str = concat!("ftpr/", env!("CARGO_PKG_VERSION"));

/// Rate-limit reset headers, as epoch seconds (GitHub first, then GitLab).
const RATE_LIMIT_RESET_HEADERS: [&str; 2] = ["x-ratelimit-reset", "ratelimit-reset"];

/// A successful (2xx) response with its body parsed as JSON.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: Value,
}

impl ApiResponse {
    /// Deserializes the body, logging and discarding shape mismatches.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| debug!("Unexpected response shape: {e}"))
            .ok()
    }
}

/// GET-only REST client with rate-limit handling and retries.
///
/// Every failure mode (exhausted retries, unparsable body) resolves to
/// `None`; callers treat that as "skip this unit of work".
pub struct ApiClient {
    client: Client,
    max_retries: u32,
    backoff_base: Duration,
    default_retry_after: Duration,
}

impl ApiClient {
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(http.timeout())
            .build()?;

        Ok(Self {
            client,
            max_retries: http.max_retries.max(1),
            backoff_base: http.backoff_base(),
            default_retry_after: http.default_retry_after(),
        })
    }

    /// Performs a GET request, retrying on rate limits, error statuses and
    /// network failures until the retry budget is spent.
    pub async fn get(
        &self,
        url: &Url,
        headers: &HeaderMap,
        query: &[(&str, String)],
    ) -> Option<ApiResponse> {
        for attempt in 0..self.max_retries {
            let request = self
                .client
                .get(url.clone())
                .headers(headers.clone())
                .query(query);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let wait = retry_after(response.headers(), Utc::now())
                            .unwrap_or(self.default_retry_after);
                        warn!("Rate limited. Waiting {} seconds...", wait.as_secs());
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if status == StatusCode::FORBIDDEN {
                        if let Some(wait) = rate_limit_reset_wait(response.headers(), Utc::now()) {
                            warn!("Rate limit exceeded. Waiting {} seconds...", wait.as_secs());
                            tokio::time::sleep(wait).await;
                            continue;
                        }
                    }

                    if status.is_success() {
                        return match response.json::<Value>().await {
                            Ok(body) => Some(ApiResponse { body }),
                            Err(e) => {
                                warn!("Failed to parse response from {url}: {e}");
                                None
                            }
                        };
                    }

                    warn!(
                        "Request to {url} failed with status {status} (attempt {}/{})",
                        attempt + 1,
                        self.max_retries
                    );
                }
                Err(e) => {
                    warn!(
                        "Request failed (attempt {}/{}): {e}",
                        attempt + 1,
                        self.max_retries
                    );
                }
            }

            if attempt + 1 < self.max_retries {
                let backoff = self.backoff_base.saturating_mul(2u32.saturating_pow(attempt));
                tokio::time::sleep(backoff).await;
            }
        }

        None
    }
}

/// Parses `Retry-After` as delta seconds or an HTTP date.
fn retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let seconds = (at.with_timezone(&Utc) - now).num_seconds().max(0);
    u64::try_from(seconds).ok().map(Duration::from_secs)
}

/// Time left until the rate-limit window resets, if a reset header is in the future.
fn rate_limit_reset_wait(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let reset = RATE_LIMIT_RESET_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;

    let wait = reset - now.timestamp();
    (wait > 0)
        .then(|| u64::try_from(wait).ok())
        .flatten()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::header::HeaderValue;
    use std::time::Instant;

    fn fast_config() -> HttpConfig {
        HttpConfig {
            timeout_secs: 5,
            max_retries: 3,
            backoff_base_ms: 1,
            default_retry_after_secs: 60,
        }
    }

    fn endpoint(server: &mockito::ServerGuard, path: &str) -> Url {
        Url::parse(&format!("{}{path}", server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_returns_first_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/items")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .match_header("private-token", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(&fast_config()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("private-token", HeaderValue::from_static("secret"));

        let response = client
            .get(
                &endpoint(&server, "/items"),
                &headers,
                &[("page", "2".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(response.body[0]["id"], 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_after_429_with_retry_after() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/limited")
            .with_status(429)
            .with_header("retry-after", "2")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/limited")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(&fast_config()).unwrap();
        let started = Instant::now();
        let response = client
            .get(&endpoint(&server, "/limited"), &HeaderMap::new(), &[])
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(response.body["ok"], true);
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_after_403_rate_limit_reset() {
        let mut server = mockito::Server::new_async().await;
        let reset = (Utc::now().timestamp() + 2).to_string();
        let exhausted = server
            .mock("GET", "/exhausted")
            .with_status(403)
            .with_header("x-ratelimit-reset", &reset)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/exhausted")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(&fast_config()).unwrap();
        let started = Instant::now();
        let response = client
            .get(&endpoint(&server, "/exhausted"), &HeaderMap::new(), &[])
            .await;

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(response.unwrap().body["ok"], true);
        exhausted.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_server_errors_with_backoff() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/flaky")
            .with_status(502)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/flaky")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(&fast_config()).unwrap();
        let response = client
            .get(&endpoint(&server, "/flaky"), &HeaderMap::new(), &[])
            .await;

        assert!(response.is_some());
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let client = ApiClient::new(&fast_config()).unwrap();
        let response = client
            .get(&endpoint(&server, "/missing"), &HeaderMap::new(), &[])
            .await;

        assert!(response.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forbidden_without_reset_header_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/forbidden")
            .with_status(403)
            .expect(3)
            .create_async()
            .await;

        let client = ApiClient::new(&fast_config()).unwrap();
        let response = client
            .get(&endpoint(&server, "/forbidden"), &HeaderMap::new(), &[])
            .await;

        assert!(response.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unparsable_body_is_no_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/html")
            .with_status(200)
            .with_body("<html>oops</html>")
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(&fast_config()).unwrap();
        let response = client
            .get(&endpoint(&server, "/html"), &HeaderMap::new(), &[])
            .await;

        assert!(response.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_host_is_no_result() {
        let client = ApiClient::new(&fast_config()).unwrap();
        let url = Url::parse("http://127.0.0.1:1/nothing").unwrap();

        assert!(client.get(&url, &HeaderMap::new(), &[]).await.is_none());
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

        assert_eq!(
            retry_after(&headers, Utc::now()),
            Some(Duration::from_secs(7))
        );
    }

    #[test]
    fn test_retry_after_http_date() {
        let now = DateTime::parse_from_rfc3339("2015-10-21T07:28:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:30 GMT"),
        );

        assert_eq!(retry_after(&headers, now), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_retry_after_missing() {
        assert_eq!(retry_after(&HeaderMap::new(), Utc::now()), None);
    }

    #[test]
    fn test_rate_limit_reset_in_future() {
        let now = Utc::now();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-ratelimit-reset",
            HeaderValue::from_str(&(now.timestamp() + 42).to_string()).unwrap(),
        );

        assert_eq!(
            rate_limit_reset_wait(&headers, now),
            Some(Duration::from_secs(42))
        );
    }

    #[test]
    fn test_gitlab_rate_limit_reset_header() {
        let now = Utc::now();
        let mut headers = HeaderMap::new();
        headers.insert(
            "ratelimit-reset",
            HeaderValue::from_str(&(now.timestamp() + 5).to_string()).unwrap(),
        );

        assert_eq!(
            rate_limit_reset_wait(&headers, now),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_rate_limit_reset_in_past() {
        let now = Utc::now();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-ratelimit-reset",
            HeaderValue::from_str(&(now.timestamp() - 10).to_string()).unwrap(),
        );

        assert_eq!(rate_limit_reset_wait(&headers, now), None);
    }
}
