use async_trait::async_trait;
use serde::Deserialize;

use super::{AuthProvider, ProviderTokens, ProviderUserInfo};
use crate::config::GoogleConfig;
use crate::error::AppError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const SCOPES: &str = "openid email profile https://www.googleapis.com/auth/calendar.events";

#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCredential {
    pub code: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

impl GoogleProvider {
    pub fn from_config(config: &GoogleConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Consent screen URL; `state` comes back untouched on the callback.
    pub fn authorization_url(&self, state: &str) -> Result<String, AppError> {
        let url = reqwest::Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build Google URL: {e}")))?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl AuthProvider for GoogleProvider {
    fn provider_id(&self) -> &str {
        "google"
    }

    async fn authenticate(
        &self,
        credential: &serde_json::Value,
    ) -> Result<ProviderUserInfo, AppError> {
        let cred: GoogleCredential = serde_json::from_value(credential.clone()).map_err(|_| {
            AppError::BadRequest("Invalid Google credential: expected {\"code\": \"...\"}".to_string())
        })?;

        let token: TokenResponse = self
            .http_client
            .post(TOKEN_URL)
            .form(&[
                ("code", cred.code.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = token.error {
            let description = token.error_description.unwrap_or_default();
            return Err(AppError::BadRequest(format!(
                "Google token error {error}: {description}"
            )));
        }

        let access_token = token
            .access_token
            .ok_or_else(|| AppError::BadRequest("Google did not return an access token".to_string()))?;

        let info: UserInfoResponse = self
            .http_client
            .get(USERINFO_URL)
            .bearer_auth(&access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // Only trust verified addresses for account linking
        let email = match info.email_verified {
            Some(true) => info.email.map(|e| e.to_lowercase()),
            _ => None,
        };

        Ok(ProviderUserInfo {
            provider_account_id: info.sub,
            email,
            name: info.name,
            tokens: Some(ProviderTokens {
                access_token,
                refresh_token: token.refresh_token,
                expires_in: token.expires_in,
            }),
        })
    }
}
