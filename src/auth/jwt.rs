use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;
use entity::sea_orm_active_enums::Role;
use entity::user;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: String, // user ID
    pub role: Role,
    pub email: String,
    pub student_id: String,
    pub exp: i64,
    pub iat: i64,
}

/// Claims of the short-lived `state` parameter round-tripped through Google.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct StateClaims {
    nonce: String,
    purpose: String,
    exp: i64,
    iat: i64,
}

const STATE_PURPOSE: &str = "google_oauth_state";

#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

impl JwtManager {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        if config.jwt_secret.len() < 16 {
            return Err(AppError::Internal(
                "JWT_SECRET must be at least 16 bytes".to_string(),
            ));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry_days: config.jwt_expiry_days,
        })
    }

    pub fn issue_token(&self, user: &user::Model) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id.clone(),
            role: user.role,
            email: user.email.clone(),
            student_id: user.student_id.clone(),
            exp: (now + Duration::days(self.expiry_days)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(AppError::Jwt)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    pub fn issue_state_token(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = StateClaims {
            nonce: uuid::Uuid::new_v4().to_string(),
            purpose: STATE_PURPOSE.to_string(),
            exp: (now + Duration::minutes(10)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(AppError::Jwt)
    }

    pub fn verify_state_token(&self, token: &str) -> Result<(), AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<StateClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::BadRequest("Invalid OAuth state".to_string()))?;
        if data.claims.purpose != STATE_PURPOSE {
            return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
        }
        Ok(())
    }
}
