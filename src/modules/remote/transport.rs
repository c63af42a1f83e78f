//! HTTP transports for the pipeline backend
//!
//! Two surfaces: named function invocations (`POST {base}/functions/v1/{name}`)
//! and PostgREST-style record queries (`GET {base}/rest/v1/{table}?...`).
//! Both pace outbound requests through a `governor` quota so concurrent poll
//! sessions cannot stampede the backend.

use async_trait::async_trait;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::shared::config::ClientConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::LogContext;

type DirectRateLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

/// A way of invoking a named pipeline function with a JSON payload.
#[async_trait]
pub trait FunctionTransport: Send + Sync {
    fn name(&self) -> &str;
    async fn invoke(&self, function: &str, payload: &Value) -> AppResult<Value>;
}

/// Create a rate limiter with specified requests per second and burst capacity
fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> DirectRateLimiter {
    let period = if requests_per_second > 0.0 {
        Duration::from_secs_f64(1.0 / requests_per_second)
    } else {
        Duration::MAX
    };

    let burst = NonZeroU32::new(burst_size.max(1)).unwrap();
    let quota = Quota::with_period(period).unwrap().allow_burst(burst);

    GovernorRateLimiter::direct(quota)
}

/// Map a non-success HTTP response onto the error taxonomy.
async fn error_from_response(context: &str, response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, truncate(&body, 200))
    };

    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthenticated(format!("{} ({})", context, detail)),
        StatusCode::FORBIDDEN => AppError::PermissionDenied(format!("{} ({})", context, detail)),
        StatusCode::NOT_FOUND => AppError::NotFound(format!("{} ({})", context, detail)),
        StatusCode::REQUEST_TIMEOUT => AppError::Timeout(format!("{} ({})", context, detail)),
        StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::UnsupportedFormat(format!("{} ({})", context, detail))
        }
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(format!("{} ({})", context, detail)),
        s if s.is_server_error() => AppError::ConnectionFailure(format!("{} ({})", context, detail)),
        _ => AppError::ApiError(format!("{} ({})", context, detail)),
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

async fn parse_json(context: &str, response: Response) -> AppResult<Value> {
    let text = response
        .text()
        .await
        .map_err(|e| AppError::SerializationError(format!("{}: failed to read body: {}", context, e)))?;

    serde_json::from_str(&text).map_err(|e| {
        AppError::SerializationError(format!(
            "{}: failed to parse response: {}. Body: {}",
            context,
            e,
            truncate(&text, 200)
        ))
    })
}

/// Direct HTTP implementation of `FunctionTransport`.
pub struct HttpFunctionTransport {
    client: Client,
    rate_limiter: DirectRateLimiter,
    endpoint: String,
    api_key: String,
    auth_token: RwLock<Option<String>>,
    name: String,
}

impl HttpFunctionTransport {
    /// Standard transport talking straight to the backend's function endpoint
    pub fn direct(config: &ClientConfig) -> Self {
        Self::new("direct", config.functions_endpoint(), &config.api_key)
    }

    /// Preferred transport going through the edge gateway, when configured
    pub fn gateway(config: &ClientConfig) -> Option<Self> {
        config.gateway_url.as_ref().map(|url| {
            Self::new(
                "gateway",
                format!("{}/functions/v1", url.trim_end_matches('/')),
                &config.api_key,
            )
        })
    }

    fn new(name: &str, endpoint: String, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            // 5 req/sec with small bursts is plenty for poll-driven traffic
            rate_limiter: create_rate_limiter(5.0, 3),
            endpoint,
            api_key: api_key.to_string(),
            auth_token: RwLock::new(None),
            name: name.to_string(),
        }
    }

    /// Install or clear the bearer token used for subsequent invocations.
    pub async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    async fn apply_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let mut builder = builder
            .header("apikey", &self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        if let Some(token) = self.auth_token.read().await.as_deref() {
            builder = builder.bearer_auth(token);
        }

        builder
    }
}

#[async_trait]
impl FunctionTransport for HttpFunctionTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, function: &str, payload: &Value) -> AppResult<Value> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}", self.endpoint, function);
        let builder = self.apply_headers(self.client.post(&url)).await;
        let response = builder.json(payload).send().await.map_err(AppError::from)?;

        if !response.status().is_success() {
            let error = error_from_response(function, response).await;
            LogContext::transport_call(&self.name, function, error.code());
            return Err(error);
        }

        LogContext::transport_call(&self.name, function, "ok");
        parse_json(function, response).await
    }
}

/// Read-only record queries against the backend's REST surface.
pub struct RestClient {
    client: Client,
    rate_limiter: DirectRateLimiter,
    endpoint: String,
    api_key: String,
    auth_token: RwLock<Option<String>>,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            rate_limiter: create_rate_limiter(10.0, 5),
            endpoint: config.rest_endpoint(),
            api_key: config.api_key.clone(),
            auth_token: RwLock::new(None),
        }
    }

    /// Install or clear the bearer token used for subsequent queries.
    pub async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    async fn get(&self, url: &str, context: &str) -> AppResult<Value> {
        self.rate_limiter.until_ready().await;

        let mut builder = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Accept", "application/json");

        if let Some(token) = self.auth_token.read().await.as_deref() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(AppError::from)?;

        if !response.status().is_success() {
            let error = error_from_response(context, response).await;
            LogContext::transport_call("rest", context, error.code());
            return Err(error);
        }

        LogContext::transport_call("rest", context, "ok");
        parse_json(context, response).await
    }

    /// Fetch rows from `table` matching `column = value`, selecting `columns`.
    pub async fn fetch_rows(
        &self,
        table: &str,
        column: &str,
        value: &str,
        columns: &str,
    ) -> AppResult<Vec<Value>> {
        let url = format!(
            "{}/{}?{}=eq.{}&select={}",
            self.endpoint,
            table,
            column,
            urlencoding::encode(value),
            urlencoding::encode(columns)
        );

        match self.get(&url, table).await? {
            Value::Array(rows) => Ok(rows),
            other => Err(AppError::SerializationError(format!(
                "{}: expected a JSON array, got {}",
                table, other
            ))),
        }
    }

    /// Fetch the single row of `table` with the given id.
    pub async fn fetch_row_by_id(&self, table: &str, id: Uuid, columns: &str) -> AppResult<Value> {
        let id_string = id.to_string();
        let mut rows = self.fetch_rows(table, "id", &id_string, columns).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("{} {} not found", table, id)));
        }
        Ok(rows.swap_remove(0))
    }
}
