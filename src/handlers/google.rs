use axum::{
    extract::{Query, State},
    response::Redirect,
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::providers::google::GoogleProvider;
use crate::auth::providers::{AuthProvider, ProviderUserInfo};
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;
use entity::sea_orm_active_enums::Role;
use entity::user;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn provider(state: &AppState) -> Result<GoogleProvider, AppError> {
    state
        .config
        .google
        .as_ref()
        .map(GoogleProvider::from_config)
        .ok_or(AppError::GoogleNotConfigured)
}

fn frontend_callback(state: &AppState, params: &[(&str, &str)]) -> Result<Redirect, AppError> {
    let base = format!(
        "{}/auth/callback",
        state.config.frontend_url.trim_end_matches('/')
    );
    let url = reqwest::Url::parse_with_params(&base, params)
        .map_err(|e| AppError::Internal(format!("Bad FRONTEND_URL: {e}")))?;
    Ok(Redirect::temporary(url.as_str()))
}

/// Sends the browser to Google's consent screen.
pub async fn redirect(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let google = provider(&state)?;
    let oauth_state = state.jwt.issue_state_token()?;
    Ok(Redirect::temporary(&google.authorization_url(&oauth_state)?))
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let google = provider(&state)?;

    if let Some(error) = query.error.as_deref() {
        tracing::warn!(error, "Google sign-in was not completed");
        return frontend_callback(&state, &[("error", error)]);
    }
    let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
        return Err(AppError::BadRequest("Missing code or state".to_string()));
    };
    state.jwt.verify_state_token(&oauth_state)?;

    let info = match google
        .authenticate(&serde_json::json!({ "code": code }))
        .await
    {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!("Google code exchange failed: {e}");
            return frontend_callback(&state, &[("error", "google_auth_failed")]);
        }
    };

    let user = link_or_create_google_user(&state.db, info).await?;
    let token = state.jwt.issue_token(&user)?;
    tracing::info!(user_id = %user.id, "signed in with Google");
    frontend_callback(&state, &[("token", token.as_str())])
}

/// Match the Google account by id, then by verified email, and otherwise
/// create a new student. Stored tokens are refreshed every time.
pub async fn link_or_create_google_user<C: ConnectionTrait>(
    db: &C,
    info: ProviderUserInfo,
) -> Result<user::Model, AppError> {
    let now = Utc::now().naive_utc();
    let tokens = info.tokens;
    let expires_at = tokens
        .as_ref()
        .and_then(|t| t.expires_in)
        .map(|secs| now + Duration::seconds(secs));

    let existing = match queries::users::find_by_google_id(db, &info.provider_account_id).await? {
        Some(user) => Some(user),
        None => match info.email.as_deref() {
            Some(email) => queries::users::find_by_email(db, email).await?,
            None => None,
        },
    };

    if let Some(existing) = existing {
        let previous_refresh = existing.google_refresh_token.clone();
        let mut active: user::ActiveModel = existing.into();
        active.google_id = Set(Some(info.provider_account_id));
        if let Some(tokens) = tokens {
            active.google_access_token = Set(Some(tokens.access_token));
            // Google only returns a refresh token on the first consent
            active.google_refresh_token = Set(tokens.refresh_token.or(previous_refresh));
            active.google_token_expires_at = Set(expires_at);
        }
        active.updated_at = Set(now);
        return Ok(active.update(db).await?);
    }

    let email = info.email.ok_or_else(|| {
        AppError::BadRequest("Google account has no verified email".to_string())
    })?;
    let name = info
        .name
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let user = user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name),
        // Google has no notion of a student id
        student_id: Set(format!("GOOGLE-{}", info.provider_account_id)),
        email: Set(email),
        password_hash: Set(None),
        role: Set(Role::Student),
        google_id: Set(Some(info.provider_account_id)),
        google_access_token: Set(tokens.as_ref().map(|t| t.access_token.clone())),
        google_refresh_token: Set(tokens.and_then(|t| t.refresh_token)),
        google_token_expires_at: Set(expires_at),
        reset_token_hash: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(user)
}
