//! Auth API trait and its HTTP implementation.

use async_trait::async_trait;
use log::*;
use reqwest::Response;
use serde::Serialize;

use super::{IntrospectionRequest, TokenGrant, TokenRequest, TokenResponse, UserDetails};
use crate::error::{status_error, Error};
use crate::http::{AuthenticatedClient, AuthenticatedClientBuilder};
use crate::settings::{AuthEndpoints, HttpClientConfig};

/// Trait for the remote calls the state machine depends on.
///
/// All calls are made with credentials included, so the HTTP-only refresh cookie set by the
/// token endpoint is sent back on later calls.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange a grant at the token endpoint.
    ///
    /// # Returns
    ///
    /// The interpreted answer. `TokenGrant::AuthRequired` is a valid answer meaning there is
    /// no session to refresh.
    async fn exchange_token(&self, request: &TokenRequest) -> Result<TokenGrant, Error>;

    /// Introspect a token (or its `jti`).
    async fn validate_token(&self, token_or_id: &str) -> Result<UserDetails, Error>;

    /// End the server-side session. The response body is ignored.
    async fn logout(&self) -> Result<(), Error>;
}

/// [`AuthApi`] over HTTP with a cookie store.
pub struct HttpAuthApi {
    client: AuthenticatedClient,
    endpoints: AuthEndpoints,
}

impl HttpAuthApi {
    /// Create a client for `endpoints` using the given HTTP settings.
    ///
    /// Retries in `config` are ignored: a code exchange or refresh must reach the server at
    /// most once, so every call here is a single POST.
    pub fn new(endpoints: AuthEndpoints, config: HttpClientConfig) -> Result<Self, Error> {
        let client = AuthenticatedClientBuilder::new()
            .with_config(config)
            .without_retry()
            .build()?;
        Ok(Self::with_client(client, endpoints))
    }

    /// Use an already built client.
    pub fn with_client(client: AuthenticatedClient, endpoints: AuthEndpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Response, Error> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {:?}", url, e);
                Error::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!("{} answered {}: {}", url, status, body);
            Err(status_error(status.as_u16(), body))
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn exchange_token(&self, request: &TokenRequest) -> Result<TokenGrant, Error> {
        debug!("Calling token endpoint with {} grant", request.grant_type());

        let response = self.post_json(&self.endpoints.token_url, request).await?;
        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse token response: {:?}", e);
            Error::from(e)
        })?;

        TokenGrant::try_from(body)
    }

    async fn validate_token(&self, token_or_id: &str) -> Result<UserDetails, Error> {
        debug!("Introspecting access token");

        let response = self
            .post_json(
                &self.endpoints.introspect_url,
                &IntrospectionRequest::access_token(token_or_id),
            )
            .await?;

        response.json().await.map_err(|e| {
            warn!("Failed to parse introspection response: {:?}", e);
            Error::from(e)
        })
    }

    async fn logout(&self) -> Result<(), Error> {
        debug!("Calling logout endpoint");
        self.client
            .post(&self.endpoints.logout_url)
            .send()
            .await
            .map_err(Error::from)
            .and_then(|response| {
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    Err(status_error(status.as_u16(), String::new()))
                }
            })
    }
}
