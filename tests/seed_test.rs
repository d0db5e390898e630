mod common;

use std::io::Write;

use entity::sea_orm_active_enums::Role;
use itso_id_tracker::roster::{import_file, import_from_reader, ImportReport};
use itso_id_tracker::seed::{bootstrap, UserAction};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

async fn test_db() -> sea_orm::DatabaseConnection {
    let db = itso_id_tracker::db::pool::connect("sqlite::memory:")
        .await
        .expect("Failed to connect");
    use migration::MigratorTrait;
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

async fn user_by_email(db: &sea_orm::DatabaseConnection, email: &str) -> entity::user::Model {
    entity::user::Entity::find()
        .filter(entity::user::Column::Email.eq(email))
        .one(db)
        .await
        .unwrap()
        .expect("user not found")
}

// ─── Seed ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seed_creates_admin_user() {
    let db = test_db().await;

    let result = bootstrap(&db, "Admin@ITSO.test", Some("StrongPass1"))
        .await
        .expect("seed failed");
    assert_eq!(result.user_action, UserAction::Created);
    assert_eq!(result.user_action.to_string(), "created");

    let user = user_by_email(&db, "admin@itso.test").await;
    assert_eq!(user.id, result.user_id);
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.name, "Administrator");
    assert!(user.student_id.starts_with("ADMIN-"));
    assert!(itso_id_tracker::auth::password::verify_password(
        "StrongPass1",
        user.password_hash.as_deref().unwrap()
    )
    .unwrap());
}

#[tokio::test]
async fn seed_promotes_existing_student() {
    let db = test_db().await;
    let now = chrono::Utc::now().naive_utc();
    entity::user::ActiveModel {
        id: Set("u-1".to_string()),
        name: Set("Ana".to_string()),
        student_id: Set("2021-00001".to_string()),
        email: Set("ana@school.test".to_string()),
        password_hash: Set(None),
        role: Set(Role::Student),
        google_id: Set(None),
        google_access_token: Set(None),
        google_refresh_token: Set(None),
        google_token_expires_at: Set(None),
        reset_token_hash: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    // No password needed for an existing account
    let result = bootstrap(&db, "ana@school.test", None).await.unwrap();
    assert_eq!(result.user_action, UserAction::Promoted);
    assert_eq!(result.user_id, "u-1");

    let user = user_by_email(&db, "ana@school.test").await;
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.student_id, "2021-00001");

    let again = bootstrap(&db, "ana@school.test", None).await.unwrap();
    assert_eq!(again.user_action, UserAction::AlreadyAdmin);
    assert_eq!(again.user_action.to_string(), "already_admin");
    assert_eq!(entity::user::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn seed_new_user_needs_a_valid_password() {
    let db = test_db().await;

    assert!(bootstrap(&db, "admin@itso.test", None).await.is_err());
    assert!(bootstrap(&db, "admin@itso.test", Some("weak")).await.is_err());
    assert!(bootstrap(&db, "not-an-email", Some("StrongPass1")).await.is_err());
    assert_eq!(entity::user::Entity::find().count(&db).await.unwrap(), 0);
}

// ─── Roster import ───────────────────────────────────────────────────────────

#[tokio::test]
async fn roster_import_counts_rows() {
    let db = test_db().await;
    let csv = "\
studentId,email,password,name
2019-00001, one@school.test ,Secret123,One
2019-00002,two@school.test,Secret456,
,missing@school.test,Secret789,Nobody
2019-00003,not-an-email,Secret000,Bad
";

    let report = import_from_reader(&db, csv.as_bytes()).await.unwrap();
    assert_eq!(
        report,
        ImportReport {
            imported: 2,
            skipped_existing: 0,
            invalid: 2,
        }
    );

    let one = entity::legacy_credential::Entity::find_by_id("2019-00001".to_string())
        .one(&db)
        .await
        .unwrap()
        .expect("row missing");
    assert_eq!(one.email, "one@school.test");
    assert!(one.password_hash.starts_with("$argon2"));
    assert!(one.claimed_at.is_none());

    // Re-running keeps what is already there
    let report = import_from_reader(&db, csv.as_bytes()).await.unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.skipped_existing, 2);
}

#[tokio::test]
async fn roster_import_keeps_prehashed_passwords() {
    let db = test_db().await;
    let hash = itso_id_tracker::auth::password::hash_password("Secret123").unwrap();
    let csv = format!("student_id,email,password\n2019-00009,nine@school.test,\"{hash}\"\n");

    import_from_reader(&db, csv.as_bytes()).await.unwrap();
    let row = entity::legacy_credential::Entity::find_by_id("2019-00009".to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.password_hash, hash);
}

#[tokio::test]
async fn roster_import_from_file() {
    let db = test_db().await;
    let path = std::env::temp_dir().join(format!("roster-{}.csv", uuid::Uuid::new_v4()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "student_id,email,password,name").unwrap();
    writeln!(file, "2019-00042,file@school.test,Secret123,From File").unwrap();
    drop(file);

    let report = import_file(&db, &path).await.unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(report.imported, 1);

    let missing = std::env::temp_dir().join("no-such-roster.csv");
    assert!(import_file(&db, &missing).await.is_err());
}
