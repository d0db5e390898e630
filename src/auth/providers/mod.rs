pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUserInfo {
    pub provider_account_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub tokens: Option<ProviderTokens>,
}

/// OAuth tokens kept so the backend can act for the user later (calendar events).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn provider_id(&self) -> &str;
    async fn authenticate(
        &self,
        credential: &serde_json::Value,
    ) -> Result<ProviderUserInfo, AppError>;
}
