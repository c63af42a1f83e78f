//! Client configuration
//!
//! Everything the transports need is read once from the environment into an
//! immutable `ClientConfig` value. A `.env` file is honored in development.

use std::env;

use super::errors::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the pipeline backend, e.g. `https://api.example.com`
    pub base_url: String,
    /// Public API key sent with every request
    pub api_key: String,
    /// Optional edge gateway endpoint preferred for function invocations
    pub gateway_url: Option<String>,
    /// Production deployments prefer the gateway transport when configured
    pub production: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            gateway_url: None,
            production: false,
        }
    }

    pub fn with_gateway(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Load configuration from the environment (honoring a `.env` file).
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let base_url = env::var("PITCHLINE_API_URL")
            .map_err(|_| AppError::InvalidInput("PITCHLINE_API_URL must be set".to_string()))?;
        let api_key = env::var("PITCHLINE_API_KEY")
            .map_err(|_| AppError::InvalidInput("PITCHLINE_API_KEY must be set".to_string()))?;
        let gateway_url = env::var("PITCHLINE_GATEWAY_URL").ok().filter(|v| !v.is_empty());
        let production = env::var("PITCHLINE_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            base_url,
            api_key,
            gateway_url,
            production,
        })
    }

    /// Endpoint for named pipeline function invocations.
    pub fn functions_endpoint(&self) -> String {
        format!("{}/functions/v1", self.base_url.trim_end_matches('/'))
    }

    /// Endpoint for record queries (PostgREST-style).
    pub fn rest_endpoint(&self) -> String {
        format!("{}/rest/v1", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_derived_from_base_url() {
        let config = ClientConfig::new("https://api.example.com/", "anon-key");
        assert_eq!(
            config.functions_endpoint(),
            "https://api.example.com/functions/v1"
        );
        assert_eq!(config.rest_endpoint(), "https://api.example.com/rest/v1");
    }

    #[test]
    fn gateway_defaults_off() {
        let config = ClientConfig::new("https://api.example.com", "anon-key");
        assert!(config.gateway_url.is_none());
        assert!(!config.production);

        let config = config.with_gateway("https://edge.example.com").with_production(true);
        assert_eq!(
            config.gateway_url.as_deref(),
            Some("https://edge.example.com")
        );
        assert!(config.production);
    }
}
