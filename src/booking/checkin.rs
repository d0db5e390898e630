use std::io::Cursor;

use base64::Engine;
use chrono::{Duration, NaiveDateTime, Utc};
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};

use crate::auth::password::{generate_token, hash_token};
use crate::error::AppError;
use entity::appointment;

/// What the QR code encodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinPayload {
    #[serde(rename = "ref")]
    pub reference: String,
    pub t: String,
}

/// A freshly issued check-in token. Only `token_hash` is persisted.
#[derive(Debug, Clone)]
pub struct IssuedCheckin {
    pub payload: CheckinPayload,
    pub token_hash: String,
    pub expires_at: NaiveDateTime,
}

impl IssuedCheckin {
    pub fn payload_json(&self) -> String {
        serde_json::to_string(&self.payload).unwrap_or_default()
    }
}

pub fn issue(appointment_id: &str, ttl_hours: i64) -> IssuedCheckin {
    let token = generate_token();
    IssuedCheckin {
        token_hash: hash_token(&token),
        payload: CheckinPayload {
            reference: appointment_id.to_string(),
            t: token,
        },
        expires_at: (Utc::now() + Duration::hours(ttl_hours)).naive_utc(),
    }
}

/// Check a scanned token against the appointment's stored one.
pub fn verify(
    appointment: &appointment::Model,
    token: &str,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let stored = appointment
        .checkin_token_hash
        .as_deref()
        .ok_or(AppError::InvalidCheckinToken)?;
    if stored != hash_token(token) {
        return Err(AppError::InvalidCheckinToken);
    }
    match appointment.checkin_expires_at {
        Some(expires_at) if expires_at >= now => Ok(()),
        _ => Err(AppError::CheckinTokenExpired),
    }
}

pub fn render_png(payload: &str) -> Result<Vec<u8>, AppError> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| AppError::Internal(format!("QR encoding error: {e}")))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(300, 300)
        .build();

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("PNG encoding error: {e}")))?;
    Ok(bytes)
}

pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}
