use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::errors::{AppError, UpstreamError, FALLBACK_STATUS};
use crate::rate_limiter::RateLimiter;

/// Upper bound honoured for a `Retry-After` header.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);
/// Upper bound of the computed exponential backoff.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Random jitter added to the exponential backoff, in milliseconds.
pub const MAX_JITTER_MS: u64 = 250;

/// `Authorization` header schemes accepted by Talana deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Token <t>`, tried first.
    Token,
    /// `Authorization: Bearer <t>`, tried once after a 401.
    Bearer,
}

impl AuthScheme {
    pub fn header_value(self, token: &str) -> String {
        match self {
            AuthScheme::Token => format!("Token {}", token),
            AuthScheme::Bearer => format!("Bearer {}", token),
        }
    }
}

/// 429 retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// `min(30s, base * 2^(attempt-1) + jitter)`, `attempt` starting at 1.
    pub fn backoff(&self, attempt: u32, jitter: Duration) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .saturating_add(jitter)
            .min(MAX_BACKOFF)
    }

    fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| {
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS));
            self.backoff(attempt, jitter)
        })
    }
}

/// Parses a `Retry-After` value in seconds, capped at [`MAX_RETRY_AFTER`].
///
/// Zero, negative or non-numeric values yield `None` so the exponential backoff applies.
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
    let seconds: u64 = raw.trim().parse().ok()?;
    if seconds == 0 {
        return None;
    }
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

enum Attempt {
    Success(String),
    Unauthorized(String),
}

/// Rate-limited Talana HTTP client with 429 retries and auth-scheme fallback.
///
/// Every attempt, including retries and the `Bearer` fallback, first waits for a
/// slot of the shared [`RateLimiter`]. Clones share the limiter.
#[derive(Clone)]
pub struct TalanaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl TalanaClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create Talana client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: config.talana_base_url.trim_end_matches('/').to_string(),
            token: config.talana_token.trim().to_string(),
            limiter: Arc::new(RateLimiter::new(config.min_request_interval)),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_base_delay,
            },
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Builds `<base><path>` plus the query pairs; `path` may carry its own query.
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, UpstreamError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        let mut url = Url::parse(&joined).map_err(|e| UpstreamError {
            status: FALLBACK_STATUS,
            message: format!("Invalid Talana URL {}: {}", joined, e),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, UpstreamError> {
        self.execute(Method::GET, path, query, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<String, UpstreamError> {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    pub async fn patch_json(&self, path: &str, body: &Value) -> Result<String, UpstreamError> {
        self.execute(Method::PATCH, path, &[], Some(body)).await
    }

    /// Runs one logical request: `Token` scheme with 429 retries, then once more with
    /// `Bearer` if the first scheme ended in 401.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<String, UpstreamError> {
        if self.token.is_empty() {
            return Err(UpstreamError {
                status: 401,
                message: "HTTP 401 calling Talana: missing token (set TALANA_API_TOKEN)"
                    .to_string(),
            });
        }
        let url = self.url(path, query)?;

        match self.send_with_retries(&method, &url, body, AuthScheme::Token).await? {
            Attempt::Success(text) => Ok(text),
            Attempt::Unauthorized(_) => {
                tracing::warn!(
                    "Talana answered 401 to Token auth for {}, retrying with Bearer",
                    url
                );
                match self
                    .send_with_retries(&method, &url, body, AuthScheme::Bearer)
                    .await?
                {
                    Attempt::Success(text) => Ok(text),
                    Attempt::Unauthorized(text) => {
                        Err(UpstreamError::http(401, url.as_str(), &text))
                    }
                }
            }
        }
    }

    async fn send_with_retries(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        scheme: AuthScheme,
    ) -> Result<Attempt, UpstreamError> {
        let mut retries = 0u32;
        loop {
            self.limiter.acquire().await;

            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header(ACCEPT, "application/json")
                .header(AUTHORIZATION, scheme.header_value(&self.token));
            if let Some(body) = body {
                request = request.json(body);
            }

            tracing::debug!("Talana {} {} ({:?})", method, url, scheme);
            let response = request
                .send()
                .await
                .map_err(|e| UpstreamError::transport(url.as_str(), e))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && retries < self.retry.max_retries {
                retries += 1;
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after);
                let delay = self.retry.delay(retries, retry_after);
                tracing::warn!(
                    "Talana rate limited {} (retry {}/{}), backing off {:?}",
                    url,
                    retries,
                    self.retry.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let text = response
                .text()
                .await
                .map_err(|e| UpstreamError::transport(url.as_str(), e))?;

            if status.is_success() {
                return Ok(Attempt::Success(text));
            }
            if status == StatusCode::UNAUTHORIZED {
                return Ok(Attempt::Unauthorized(text));
            }
            return Err(UpstreamError::http(status.as_u16(), url.as_str(), &text));
        }
    }

    // ============ Typed paths ============

    /// `persona-paginado`, falling back to `personas-paginadas` on 404.
    pub async fn personas_paginated(
        &self,
        query: &[(&str, String)],
    ) -> Result<String, UpstreamError> {
        self.get_with_fallback("/persona-paginado/", "/personas-paginadas/", query)
            .await
    }

    pub async fn persona_detail(&self, persona_id: i64) -> Result<String, UpstreamError> {
        self.get(&format!("/persona/{}/", persona_id), &[]).await
    }

    pub async fn contracts_paginated(
        &self,
        query: &[(&str, String)],
    ) -> Result<String, UpstreamError> {
        self.get("/contrato-paginado/", query).await
    }

    pub async fn contract_detail(&self, contract_id: i64) -> Result<String, UpstreamError> {
        self.get(&format!("/contrato/{}/", contract_id), &[]).await
    }

    /// `centro-costo`, falling back to `centroCosto` on 404.
    pub async fn cost_centers(&self, query: &[(&str, String)]) -> Result<String, UpstreamError> {
        self.get_with_fallback("/centro-costo/", "/centroCosto/", query)
            .await
    }

    pub async fn cost_center_detail(&self, id: i64) -> Result<String, UpstreamError> {
        self.get_with_fallback(
            &format!("/centro-costo/{}/", id),
            &format!("/centroCosto/{}/", id),
            &[],
        )
        .await
    }

    pub async fn branch_detail(&self, id: i64) -> Result<String, UpstreamError> {
        self.get(&format!("/sucursal/{}/", id), &[]).await
    }

    pub async fn branches(&self, query: &[(&str, String)]) -> Result<String, UpstreamError> {
        self.get("/sucursal/", query).await
    }

    pub async fn job_titles(&self, query: &[(&str, String)]) -> Result<String, UpstreamError> {
        self.get("/job-title/", query).await
    }

    /// POST to a collection or PATCH one of its items.
    pub async fn write(
        &self,
        collection: &str,
        id: Option<i64>,
        body: &Value,
    ) -> Result<String, UpstreamError> {
        match id {
            Some(id) => self.patch_json(&format!("/{}/{}/", collection, id), body).await,
            None => self.post_json(&format!("/{}/", collection), body).await,
        }
    }

    /// Cost center write, retried against `centroCosto` on 404.
    pub async fn write_cost_center(
        &self,
        id: Option<i64>,
        body: &Value,
    ) -> Result<String, UpstreamError> {
        match self.write("centro-costo", id, body).await {
            Err(err) if err.is_status(404) => {
                tracing::debug!("centro-costo write not available (404), trying centroCosto");
                self.write("centroCosto", id, body).await
            }
            other => other,
        }
    }

    async fn get_with_fallback(
        &self,
        primary: &str,
        fallback: &str,
        query: &[(&str, String)],
    ) -> Result<String, UpstreamError> {
        match self.get(primary, query).await {
            Err(err) if err.is_status(404) => {
                tracing::debug!("{} not available (404), trying {}", primary, fallback);
                self.get(fallback, query).await
            }
            other => other,
        }
    }
}

/// `limit`/`offset` query pairs, only when both are given.
pub fn limit_offset_query(window: Option<(u32, u32)>) -> Vec<(&'static str, String)> {
    match window {
        Some((limit, offset)) => vec![("limit", limit.to_string()), ("offset", offset.to_string())],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheTtls;

    fn config(base: &str, token: &str) -> Config {
        Config {
            port: 3000,
            talana_base_url: base.to_string(),
            talana_token: token.to_string(),
            min_request_interval: Duration::from_millis(1),
            request_timeout: Duration::from_secs(5),
            max_retries: 5,
            retry_base_delay: Duration::from_millis(1000),
            skip_vacation_balance: true,
            cache_ttls: CacheTtls::default(),
            warmup_hour_utc: None,
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
        };
        assert_eq!(policy.backoff(1, Duration::ZERO), Duration::from_secs(1));
        assert_eq!(policy.backoff(3, Duration::from_millis(200)), Duration::from_millis(4200));
        assert_eq!(policy.backoff(6, Duration::ZERO), MAX_BACKOFF);
        assert_eq!(policy.backoff(40, Duration::from_millis(250)), MAX_BACKOFF);
    }

    #[test]
    fn test_retry_after_parsing() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 120 "), Some(MAX_RETRY_AFTER));
        assert_eq!(parse_retry_after("0"), None);
        assert_eq!(parse_retry_after("-3"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_auth_header_values() {
        assert_eq!(AuthScheme::Token.header_value("abc"), "Token abc");
        assert_eq!(AuthScheme::Bearer.header_value("abc"), "Bearer abc");
    }

    #[test]
    fn test_url_joins_base_path_and_query() {
        let client = TalanaClient::new(&config("https://talana.test/es/api/", "t")).unwrap();
        let url = client
            .url("/contrato/?empleado=5", &[("page", "2".to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "https://talana.test/es/api/contrato/?empleado=5&page=2");

        let url = client.url("persona/3/", &[]).unwrap();
        assert_eq!(url.as_str(), "https://talana.test/es/api/persona/3/");
    }

    #[tokio::test]
    async fn test_missing_token_fails_fast() {
        let client = TalanaClient::new(&config("https://talana.invalid", "  ")).unwrap();
        let err = client.get("/persona/1/", &[]).await.unwrap_err();
        assert_eq!(err.status, 401);
        assert!(err.message.starts_with("HTTP 401 calling Talana: missing token"));
    }

    #[test]
    fn test_limit_offset_query() {
        assert!(limit_offset_query(None).is_empty());
        assert_eq!(
            limit_offset_query(Some((10, 20))),
            vec![("limit", "10".to_string()), ("offset", "20".to_string())]
        );
    }
}
