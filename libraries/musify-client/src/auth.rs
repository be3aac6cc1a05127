//! Authentication methods for the Musify API.

use crate::error::{ClientError, Result};
use crate::response::{decode, decode_required};
use crate::types::{LoginRequest, TokenResponse};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

/// Authentication client for the Musify API.
pub struct AuthClient<'a> {
    http: &'a Client,
    base_url: &'a Url,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a Url) -> Self {
        Self { http, base_url }
    }

    /// Login with email and password.
    ///
    /// Returns the access token on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let url = crate::client::join(self.base_url, &["auth", "login"])?;
        debug!(url = %url, email = %email, "Attempting login");

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        match decode_required::<TokenResponse>(response, "login").await {
            Ok(token) => {
                info!(email = %email, "Login successful");
                Ok(token)
            }
            Err(ClientError::AuthRequired) => {
                warn!(email = %email, "Login failed: invalid credentials");
                Err(ClientError::AuthFailed(
                    "Invalid email or password".to_string(),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Invalidate an access token on the server.
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let url = crate::client::join(self.base_url, &["auth", "logout"])?;
        debug!(url = %url, "Logging out");

        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        decode::<serde_json::Value>(response, "logout").await?;
        Ok(())
    }
}
