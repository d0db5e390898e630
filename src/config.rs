use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origins: String,
    pub frontend_url: String,
    /// Offset of the office's local time from UTC, used to decide "today".
    pub utc_offset_minutes: i32,
    pub daily_appointment_cap: u64,
    pub checkin_token_ttl_hours: i64,
    pub auth_rate_limit_per_minute: u32,
    pub smtp: Option<SmtpConfig>,
    pub google: Option<GoogleConfig>,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiry_days: parse_or("JWT_EXPIRY_DAYS", 7),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_or("SERVER_PORT", 5000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173,http://localhost:8081".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            utc_offset_minutes: parse_or("UTC_OFFSET_MINUTES", 480),
            daily_appointment_cap: parse_or("DAILY_APPOINTMENT_CAP", 1500),
            checkin_token_ttl_hours: parse_or("CHECKIN_TOKEN_TTL_HOURS", 6),
            auth_rate_limit_per_minute: parse_or("AUTH_RATE_LIMIT_PER_MINUTE", 20),
            smtp: smtp_from_env(),
            google: google_from_env(),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn smtp_from_env() -> Option<SmtpConfig> {
    let host = env::var("SMTP_HOST").ok()?;
    let username = env::var("SMTP_USERNAME").ok()?;
    let password = env::var("SMTP_PASSWORD").ok()?;
    Some(SmtpConfig {
        host,
        port: parse_or("SMTP_PORT", 587),
        from_email: env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| username.clone()),
        from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "ITSO ID Tracker".to_string()),
        username,
        password,
    })
}

fn google_from_env() -> Option<GoogleConfig> {
    Some(GoogleConfig {
        client_id: env::var("GOOGLE_CLIENT_ID").ok()?,
        client_secret: env::var("GOOGLE_CLIENT_SECRET").ok()?,
        redirect_uri: env::var("GOOGLE_REDIRECT_URI").ok()?,
    })
}
