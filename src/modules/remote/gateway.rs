//! Function gateway with dual-transport fallback
//!
//! Production deployments may configure a preferred edge transport. It is
//! probed at most once per top-level invocation; any non-fatal failure falls
//! back to the standard transport, which alone carries the retry loop. The
//! two transports are never nested inside each other's retries.

use serde_json::Value;
use std::sync::Arc;
use tokio::time::timeout;

use crate::log_warn;
use crate::shared::config::ClientConfig;
use crate::shared::errors::{classify, AppError, ClassifiedError, ErrorKind};

use super::invoker::invoke;
use super::retry_policy::RetryPolicy;
use super::transport::{FunctionTransport, HttpFunctionTransport};

pub struct FunctionGateway {
    standard: Arc<dyn FunctionTransport>,
    preferred: Option<Arc<dyn FunctionTransport>>,
    policy: RetryPolicy,
    production: bool,
}

impl FunctionGateway {
    pub fn new(
        standard: Arc<dyn FunctionTransport>,
        preferred: Option<Arc<dyn FunctionTransport>>,
        policy: RetryPolicy,
        production: bool,
    ) -> Self {
        Self {
            standard,
            preferred,
            policy,
            production,
        }
    }

    /// Build both transports from configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        let standard: Arc<dyn FunctionTransport> =
            Arc::new(HttpFunctionTransport::direct(config));
        let preferred: Option<Arc<dyn FunctionTransport>> = HttpFunctionTransport::gateway(config)
            .map(|transport| Arc::new(transport) as Arc<dyn FunctionTransport>);

        Self::new(standard, preferred, RetryPolicy::standard(), config.production)
    }

    /// Invoke a named pipeline function, preferring the gateway transport in
    /// production and retrying only on the standard path.
    pub async fn invoke(&self, function: &str, payload: &Value) -> Result<Value, ClassifiedError> {
        if self.production {
            if let Some(preferred) = &self.preferred {
                match self.try_preferred(preferred.as_ref(), function, payload).await {
                    Ok(value) => return Ok(value),
                    Err(classified) => {
                        // An invalid credential fails identically on both
                        // transports, so auth and malformed-request failures
                        // propagate instead of falling back. Not-found means
                        // the gateway does not carry the function; fall back.
                        let fallback_allowed = classified.classification.is_retryable()
                            || classified.classification.allows_defensive_retry()
                            || classified.classification.kind == ErrorKind::NotFound;
                        if !fallback_allowed {
                            return Err(classified);
                        }
                        log_warn!(
                            "Gateway: {} failed on preferred transport '{}' ({}), falling back",
                            function,
                            preferred.name(),
                            classified.error
                        );
                    }
                }
            }
        }

        let transport = Arc::clone(&self.standard);
        let function_name = function.to_string();
        let body = payload.clone();
        invoke(function, &self.policy, move || {
            let transport = Arc::clone(&transport);
            let function_name = function_name.clone();
            let body = body.clone();
            async move { transport.invoke(&function_name, &body).await }
        })
        .await
    }

    async fn try_preferred(
        &self,
        transport: &dyn FunctionTransport,
        function: &str,
        payload: &Value,
    ) -> Result<Value, ClassifiedError> {
        let outcome = match timeout(
            self.policy.timeout_per_attempt,
            transport.invoke(function, payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} exceeded the {:?} per-attempt budget on preferred transport",
                function, self.policy.timeout_per_attempt
            ))),
        };

        outcome.map_err(|error| ClassifiedError {
            classification: classify(&error),
            error,
            attempts: 1,
        })
    }
}
