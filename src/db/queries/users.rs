use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::error::AppError;
use entity::user;

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: &str) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find_by_id(id).one(db).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?)
}

pub async fn find_by_student_id<C: ConnectionTrait>(
    db: &C,
    student_id: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::StudentId.eq(student_id.trim()))
        .one(db)
        .await?)
}

pub async fn find_by_google_id<C: ConnectionTrait>(
    db: &C,
    google_id: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::GoogleId.eq(google_id))
        .one(db)
        .await?)
}

pub async fn find_by_reset_token_hash<C: ConnectionTrait>(
    db: &C,
    token_hash: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::ResetTokenHash.eq(token_hash))
        .one(db)
        .await?)
}

/// Whether an email or student id is already taken.
pub async fn identity_taken<C: ConnectionTrait>(
    db: &C,
    email: &str,
    student_id: &str,
) -> Result<bool, AppError> {
    Ok(find_by_email(db, email).await?.is_some()
        || find_by_student_id(db, student_id).await?.is_some())
}
