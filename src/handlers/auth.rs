use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MessageResponse, UserResponse};
use crate::auth::middleware::AuthenticatedUser;
use crate::auth::password::{
    generate_token, hash_password, hash_token, validate_password, verify_password,
};
use crate::db::queries;
use crate::error::AppError;
use crate::notify::templates;
use crate::AppState;
use entity::sea_orm_active_enums::Role;
use entity::{legacy_credential, user};

const RESET_TOKEN_TTL_MINUTES: i64 = 60;

// --- Request / Response types ---

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub student_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub student_id: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn auth_response(state: &AppState, user: user::Model) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        token: state.jwt.issue_token(&user)?,
        user: user.into(),
    })
}

// --- Handlers ---

/// Password login. Users that only exist in the legacy roster are
/// provisioned on their first successful login.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    let student_id = req.student_id.trim();

    if let Some(user) = queries::users::find_by_email(&state.db, &email).await? {
        if user.student_id != student_id {
            return Err(AppError::InvalidCredentials);
        }
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&req.password, hash)? {
            return Err(AppError::InvalidCredentials);
        }
        return Ok(Json(auth_response(&state, user)?));
    }

    let legacy = legacy_credential::Entity::find_by_id(student_id.to_string())
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if legacy.email != email || !verify_password(&req.password, &legacy.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    if queries::users::find_by_student_id(&state.db, student_id)
        .await?
        .is_some()
    {
        // Roster entry already belongs to an account under another email
        return Err(AppError::InvalidCredentials);
    }

    let now = Utc::now().naive_utc();
    let txn = state.db.begin().await?;
    let user = user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(legacy
            .name
            .clone()
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string())),
        student_id: Set(legacy.student_id.clone()),
        email: Set(email),
        password_hash: Set(Some(legacy.password_hash.clone())),
        role: Set(Role::Student),
        google_id: Set(None),
        google_access_token: Set(None),
        google_refresh_token: Set(None),
        google_token_expires_at: Set(None),
        reset_token_hash: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let mut claimed: legacy_credential::ActiveModel = legacy.into();
    claimed.claimed_at = Set(Some(now));
    claimed.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.id, "provisioned user from legacy roster");
    Ok(Json(auth_response(&state, user)?))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = req.name.trim();
    let student_id = req.student_id.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() || student_id.is_empty() {
        return Err(AppError::BadRequest(
            "Name and student ID are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    validate_password(&req.password)?;

    if queries::users::identity_taken(&state.db, &email, student_id).await? {
        return Err(AppError::UserAlreadyExists);
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name.to_string()),
        student_id: Set(student_id.to_string()),
        email: Set(email),
        password_hash: Set(Some(hash_password(&req.password)?)),
        role: Set(Role::Student),
        google_id: Set(None),
        google_access_token: Set(None),
        google_refresh_token: Set(None),
        google_token_expires_at: Set(None),
        reset_token_hash: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

/// Always answers 200 so the endpoint can't be used to probe for accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if let Some(user) = queries::users::find_by_email(&state.db, &req.email).await? {
        let token = generate_token();
        let to = user.email.clone();
        let mut active: user::ActiveModel = user.into();
        active.reset_token_hash = Set(Some(hash_token(&token)));
        active.reset_token_expires_at =
            Set(Some((Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).naive_utc()));
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&state.db).await?;

        let link = format!(
            "{}/reset-password?token={token}",
            state.config.frontend_url.trim_end_matches('/')
        );
        state
            .notifications
            .send_in_background(templates::password_reset(&to, &link, RESET_TOKEN_TTL_MINUTES));
    }

    Ok(Json(MessageResponse::new(
        "If that email is registered, a reset link has been sent",
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let invalid = || AppError::BadRequest("Invalid or expired reset token".to_string());

    let user = queries::users::find_by_reset_token_hash(&state.db, &hash_token(req.token.trim()))
        .await?
        .ok_or_else(invalid)?;
    match user.reset_token_expires_at {
        Some(expires_at) if expires_at > Utc::now().naive_utc() => {}
        _ => return Err(invalid()),
    }
    validate_password(&req.password)?;

    let user_id = user.id.clone();
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(Some(hash_password(&req.password)?));
    active.reset_token_hash = Set(None);
    active.reset_token_expires_at = Set(None);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(&state.db).await?;

    tracing::info!(%user_id, "password reset");
    Ok(Json(MessageResponse::new("Password has been reset")))
}

pub async fn change_password(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = queries::users::find_by_id(&state.db, &auth.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    // Google-only accounts have no password to check against
    if let Some(hash) = user.password_hash.as_deref() {
        if !verify_password(&req.current_password, hash)? {
            return Err(AppError::InvalidCredentials);
        }
    }
    validate_password(&req.new_password)?;

    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(Some(hash_password(&req.new_password)?));
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(&state.db).await?;

    tracing::info!(user_id = %auth.user_id, "password changed");
    Ok(Json(MessageResponse::new("Password updated")))
}
