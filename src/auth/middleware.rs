use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;
use entity::sea_orm_active_enums::Role;

/// Extracts the authenticated user from a Bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
    pub email: String,
    pub student_id: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner-or-admin guard.
    pub fn ensure_can_access(&self, owner_id: &str) -> Result<(), AppError> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync + AsRef<crate::AppState>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state: &crate::AppState = state.as_ref();

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let claims = app_state.jwt.verify_token(token)?;

        Ok(AuthenticatedUser {
            user_id: claims.id,
            role: claims.role,
            email: claims.email,
            student_id: claims.student_id,
        })
    }
}

/// Requires a Bearer token with the admin role.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync + AsRef<crate::AppState>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(AdminAuth(user))
    }
}
