use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub type Db = DatabaseConnection;

pub async fn connect(database_url: &str) -> Result<Db, DbErr> {
    // SQLite allows one writer; a single connection queues booking
    // transactions instead of failing them with SQLITE_BUSY.
    let max_connections = if database_url.starts_with("sqlite:") { 1 } else { 5 };

    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);
    Database::connect(options).await
}
