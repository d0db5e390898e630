pub mod announcements;
pub mod appointments;
pub mod auth;
pub mod closures;
pub mod google;
pub mod idcards;
pub mod slots;
pub mod user;
pub mod windows;

use serde::Serialize;

use entity::sea_orm_active_enums::Role;
use entity::user as user_entity;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub student_id: String,
    pub email: String,
    pub role: Role,
    pub google_linked: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<user_entity::Model> for UserResponse {
    fn from(u: user_entity::Model) -> Self {
        Self {
            google_linked: u.google_id.is_some(),
            id: u.id,
            name: u.name,
            student_id: u.student_id,
            email: u.email,
            role: u.role,
            created_at: u.created_at.to_string(),
            updated_at: u.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
