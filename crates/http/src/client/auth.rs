//! Authentication API client methods

use super::{ApiClient, ClientError};
use crate::types::{ApiEnvelope, LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use reqwest::Method;
use tracing::info;

impl ApiClient {
    /// Log in and store the returned credential, role and profile in the
    /// session
    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<LoginResponse, ClientError> {
        let request = self
            .request(Method::POST, "/api/auth/login")
            .json(&LoginRequest {
                username: username.into(),
                password: password.into(),
            });
        let envelope: ApiEnvelope<LoginResponse> = self.execute(request).await?;
        let login = envelope.into_data()?;

        self.session.set_token(login.token.clone())?;
        self.session.set_roles(vec![login.role.clone()])?;
        self.session.set_info(login.profile())?;

        info!(username = %login.username, role = %login.role, "Logged in");
        Ok(login)
    }

    /// Create an account; returns the server's confirmation message
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, ClientError> {
        let envelope: ApiEnvelope<String> = self.post("/api/auth/register", request).await?;
        envelope.into_data()
    }

    /// Fetch the logged-in user
    pub async fn current_user(&self) -> Result<UserInfo, ClientError> {
        let envelope: ApiEnvelope<UserInfo> = self.get("/api/auth/me").await?;
        envelope.into_data()
    }

    /// Fetch the logged-in user and store it as the session profile
    pub async fn refresh_profile(&self) -> Result<UserInfo, ClientError> {
        let user = self.current_user().await?;
        self.session.set_info(user.profile())?;
        Ok(user)
    }

    /// End the session locally; the backend keeps no session state
    pub fn logout(&self) -> Result<(), ClientError> {
        self.session.logout()?;
        Ok(())
    }
}
