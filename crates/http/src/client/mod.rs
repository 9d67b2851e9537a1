//! SmartMix API client

pub mod auth;
pub mod error;

use error::ClientError;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use smartmix_core::config::DEFAULT_TIMEOUT_MS;
use smartmix_core::{ClientConfig, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("smartmix-client/", env!("CARGO_PKG_VERSION"));

/// Client for the SmartMix backend
///
/// The session's token is read right before each request is dispatched, so
/// a login or logout takes effect for the very next request.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Create a client from loaded configuration
    pub fn from_config(
        config: &ClientConfig,
        session: Arc<SessionStore>,
    ) -> Result<Self, ClientError> {
        Self::builder()
            .base_url(&config.api.base_url)
            .timeout(config.timeout())
            .session(session)
            .build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session this client reads credentials from
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Create a request builder for `path` relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        self.client.request(method, url)
    }

    /// Dispatch a request and decode the response payload
    ///
    /// A 401 response expires the session before the error is returned.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = match self.authorize(request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, timeout = e.is_timeout(), "Request failed before a response");
                return Err(e.into());
            }
        };

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Received response");

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        let error = ClientError::from_status(status, message);
        if error.is_auth_expired() {
            self.handle_unauthorized();
        }
        Err(error)
    }

    /// GET `path`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(self.request(Method::GET, path)).await
    }

    /// POST `body` as JSON to `path`
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::POST, path).json(body))
            .await
    }

    /// PUT `body` as JSON to `path`
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::PUT, path).json(body))
            .await
    }

    /// DELETE `path`
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.session.token();
        if token.is_empty() {
            request
        } else {
            request.header(header::AUTHORIZATION, format!("Bearer {token}"))
        }
    }

    fn handle_unauthorized(&self) {
        // The caller still gets the 401; a storage failure here is only logged
        if let Err(e) = self.session.expire() {
            warn!(error = %e, "Failed to clear expired session");
        }
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<Arc<SessionStore>>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the session credentials are read from
    pub fn session(mut self, session: Arc<SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;
        let session = self
            .session
            .ok_or_else(|| ClientError::Configuration("session is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new()
            .user_agent(self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()));

        #[cfg(not(target_arch = "wasm32"))]
        {
            let timeout = self
                .timeout
                .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS));
            client_builder = client_builder.timeout(timeout);
        }

        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        Ok(ApiClient {
            client: client_builder.build()?,
            base_url,
            session,
        })
    }
}
