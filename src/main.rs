use std::net::SocketAddr;
use std::path::Path;

use itso_id_tracker::config::Config;
use itso_id_tracker::notify::Notifications;
use itso_id_tracker::seed::UserAction;
use itso_id_tracker::AppState;

const USAGE: &str = "Usage:
  itso-id-tracker                         start the API server
  itso-id-tracker seed <email> [password] create or promote an admin
  itso-id-tracker import-roster <csv>     load the legacy student_ids.csv";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itso_id_tracker=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env().map_err(|e| {
        format!("DATABASE_URL and JWT_SECRET must be set ({e})\n\n{USAGE}")
    })?;

    let db = itso_id_tracker::db::pool::connect(&config.database_url).await?;
    tracing::info!("Connected to database");

    itso_id_tracker::db::migration::run(&db).await?;
    tracing::info!("Migrations applied");

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("seed") => {
            let Some(email) = args.get(2) else {
                return Err(USAGE.into());
            };
            let password = args.get(3).map(String::as_str);
            let result = itso_id_tracker::seed::bootstrap(&db, email, password).await?;
            match result.user_action {
                UserAction::Created => println!("Created admin user: {email}"),
                UserAction::Promoted => println!("Promoted {email} to admin role."),
                UserAction::AlreadyAdmin => println!("User {email} is already an admin."),
            }
            return Ok(());
        }
        Some("import-roster") => {
            let Some(path) = args.get(2) else {
                return Err(USAGE.into());
            };
            let report = itso_id_tracker::roster::import_file(&db, Path::new(path)).await?;
            println!(
                "Imported {} roster entries ({} already present, {} invalid rows).",
                report.imported, report.skipped_existing, report.invalid
            );
            return Ok(());
        }
        Some(other) => {
            return Err(format!("Unknown command: {other}\n\n{USAGE}").into());
        }
        None => {}
    }

    let jwt = itso_id_tracker::auth::jwt::JwtManager::new(&config)?;
    let notifications = Notifications::from_config(&config)?;

    let state = AppState {
        db,
        jwt,
        notifications,
        config: config.clone(),
    };

    let app = itso_id_tracker::routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
