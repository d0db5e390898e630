use std::fmt;

use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::auth::password::{hash_password, validate_password};
use crate::db::queries;
use crate::error::AppError;
use entity::sea_orm_active_enums::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Created,
    Promoted,
    AlreadyAdmin,
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserAction::Created => "created",
            UserAction::Promoted => "promoted",
            UserAction::AlreadyAdmin => "already_admin",
        })
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub user_id: String,
    pub user_action: UserAction,
}

/// Create the admin account, or promote an existing user to admin.
///
/// `admin_password` is only required when the user does not exist yet.
pub async fn bootstrap(
    db: &DatabaseConnection,
    admin_email: &str,
    admin_password: Option<&str>,
) -> Result<SeedResult, AppError> {
    let email = admin_email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::BadRequest(format!("Not an email address: {admin_email}")));
    }

    if let Some(user) = queries::users::find_by_email(db, &email).await? {
        if user.role == Role::Admin {
            return Ok(SeedResult {
                user_id: user.id,
                user_action: UserAction::AlreadyAdmin,
            });
        }
        let user_id = user.id.clone();
        let mut active: entity::user::ActiveModel = user.into();
        active.role = Set(Role::Admin);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(db).await?;
        tracing::info!(%user_id, "promoted user to admin");
        return Ok(SeedResult {
            user_id,
            user_action: UserAction::Promoted,
        });
    }

    let password = admin_password.ok_or_else(|| {
        AppError::BadRequest(
            "Password is required when creating a new admin user. Usage: itso-id-tracker seed <email> <password>".to_string(),
        )
    })?;
    validate_password(password)?;

    let now = chrono::Utc::now().naive_utc();
    let user_id = uuid::Uuid::new_v4().to_string();
    let student_id = format!("ADMIN-{}", &user_id[..8]);
    entity::user::ActiveModel {
        id: Set(user_id.clone()),
        name: Set("Administrator".to_string()),
        student_id: Set(student_id),
        email: Set(email),
        password_hash: Set(Some(hash_password(password)?)),
        role: Set(Role::Admin),
        google_id: Set(None),
        google_access_token: Set(None),
        google_refresh_token: Set(None),
        google_token_expires_at: Set(None),
        reset_token_hash: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    tracing::info!(%user_id, "created admin user");

    Ok(SeedResult {
        user_id,
        user_action: UserAction::Created,
    })
}
