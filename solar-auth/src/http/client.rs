//! HTTP client builder with middleware.

use std::time::Duration;

use reqwest_middleware::ClientBuilder;
use reqwest_retry::RetryTransientMiddleware;

use super::{BackoffPolicy, BearerInterceptor};
use crate::error::Error;
use crate::settings::HttpClientConfig;

/// HTTP client with middleware.
pub type AuthenticatedClient = reqwest_middleware::ClientWithMiddleware;

/// Builder for HTTP clients used by and handed out by the auth core.
///
/// Every client keeps a cookie store so the HTTP-only refresh cookie set by the token endpoint
/// rides along on later calls. Transient failures are retried with [`BackoffPolicy`] unless
/// [`Self::without_retry`] is set. An optional [`BearerInterceptor`] attaches the live access
/// token.
pub struct AuthenticatedClientBuilder {
    config: HttpClientConfig,
    interceptor: Option<BearerInterceptor>,
    retry: bool,
}

impl AuthenticatedClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
            interceptor: None,
            retry: true,
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(mut self, config: HttpClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach the bearer token interceptor.
    pub fn with_interceptor(mut self, interceptor: BearerInterceptor) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Send every request exactly once. Required for one-time grants such as an
    /// authorization code or a rotating refresh cookie.
    pub fn without_retry(mut self) -> Self {
        self.retry = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<AuthenticatedClient, Error> {
        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.clone())
            .cookie_store(true)
            .build()?;

        let mut builder = ClientBuilder::new(client);
        if self.retry && self.config.max_retries > 0 {
            let policy = BackoffPolicy::from_config(&self.config);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
        }

        if let Some(interceptor) = self.interceptor {
            builder = builder.with(interceptor);
        }

        Ok(builder.build())
    }
}

impl Default for AuthenticatedClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let builder = AuthenticatedClientBuilder::new();
        assert_eq!(builder.config.timeout, Duration::from_secs(30));
        assert_eq!(builder.config.max_retries, 2);
        assert!(builder.retry);
        assert!(builder.interceptor.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let builder = AuthenticatedClientBuilder::new()
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(0)
            .with_user_agent("test-agent".to_string())
            .with_interceptor(BearerInterceptor::new());

        assert_eq!(builder.config.timeout, Duration::from_secs(5));
        assert_eq!(builder.config.max_retries, 0);
        assert_eq!(builder.config.user_agent, "test-agent");
        assert!(builder.interceptor.is_some());
    }

    #[tokio::test]
    async fn test_without_retry_sends_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/once")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new().without_retry().build().unwrap();
        let response = client
            .post(format!("{}/once", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 503);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_client_retries_transient_failures() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new()
            .with_max_retries(1)
            .build()
            .unwrap();
        client
            .get(format!("{}/flaky", server.url()))
            .send()
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_build_client() {
        let result = AuthenticatedClientBuilder::new()
            .with_interceptor(BearerInterceptor::new())
            .build();
        assert!(result.is_ok());
    }
}
