use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Calendar closure not found")]
    ClosureNotFound,

    #[error("Scheduling window not found")]
    WindowNotFound,

    #[error("Announcement not found")]
    AnnouncementNotFound,

    #[error("ID card not found")]
    IdCardNotFound,

    #[error("Slot is full")]
    SlotFull,

    #[error("Duplicate booking: you already have an appointment for this slot")]
    DuplicateBooking,

    #[error("Fully booked for this date")]
    DateFullyBooked,

    #[error("Date is closed: {0}")]
    DateClosed(chrono::NaiveDate),

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid token")]
    InvalidCheckinToken,

    #[error("Token expired")]
    CheckinTokenExpired,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Google sign-in is not configured")]
    GoogleNotConfigured,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", self.to_string())
            }
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::UserAlreadyExists => {
                (StatusCode::CONFLICT, "user_already_exists", self.to_string())
            }
            AppError::SlotNotFound => (StatusCode::NOT_FOUND, "slot_not_found", self.to_string()),
            AppError::AppointmentNotFound => {
                (StatusCode::NOT_FOUND, "appointment_not_found", self.to_string())
            }
            AppError::ClosureNotFound => {
                (StatusCode::NOT_FOUND, "closure_not_found", self.to_string())
            }
            AppError::WindowNotFound => {
                (StatusCode::NOT_FOUND, "window_not_found", self.to_string())
            }
            AppError::AnnouncementNotFound => {
                (StatusCode::NOT_FOUND, "announcement_not_found", self.to_string())
            }
            AppError::IdCardNotFound => {
                (StatusCode::NOT_FOUND, "id_card_not_found", self.to_string())
            }
            AppError::SlotFull => (StatusCode::BAD_REQUEST, "slot_full", self.to_string()),
            AppError::DuplicateBooking => {
                (StatusCode::BAD_REQUEST, "duplicate_booking", self.to_string())
            }
            AppError::DateFullyBooked => {
                (StatusCode::BAD_REQUEST, "date_fully_booked", self.to_string())
            }
            AppError::DateClosed(_) => (StatusCode::BAD_REQUEST, "date_closed", self.to_string()),
            AppError::InvalidTransition { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_transition", self.to_string())
            }
            AppError::InvalidCheckinToken => {
                (StatusCode::BAD_REQUEST, "invalid_checkin_token", self.to_string())
            }
            AppError::CheckinTokenExpired => {
                (StatusCode::BAD_REQUEST, "checkin_token_expired", self.to_string())
            }
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "invalid_token", self.to_string())
            }
            AppError::GoogleNotConfigured => {
                (StatusCode::BAD_REQUEST, "google_not_configured", self.to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::Jwt(_) => (StatusCode::UNAUTHORIZED, "invalid_token", "Invalid token".to_string()),
            AppError::HttpClient(e) => {
                tracing::error!("HTTP client error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_error",
                    "External provider error".to_string(),
                )
            }
        };

        let body = json!({
            "error": error_type,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
