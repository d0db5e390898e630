pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod rate_limit;
pub mod roster;
pub mod routes;
pub mod seed;

use sea_orm::DatabaseConnection;

use config::Config;
use notify::Notifications;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt: auth::jwt::JwtManager,
    pub notifications: Notifications,
    pub config: Config,
}

impl AsRef<AppState> for AppState {
    fn as_ref(&self) -> &AppState {
        self
    }
}

impl AppState {
    /// Today's date in the office's local time.
    pub fn today(&self) -> chrono::NaiveDate {
        let offset = chrono::Duration::minutes(self.config.utc_offset_minutes as i64);
        (chrono::Utc::now().naive_utc() + offset).date()
    }
}
