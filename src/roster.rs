//! One-time import of the legacy `student_ids.csv` credential list.
//!
//! Rows land in `legacy_credentials` with their passwords argon2-hashed.
//! The CSV file itself is only ever read.

use std::io::Read;
use std::path::Path;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;

use crate::auth::password::hash_password;
use crate::error::AppError;
use entity::legacy_credential;

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(alias = "studentId", alias = "student_number")]
    student_id: String,
    email: String,
    password: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_existing: usize,
    pub invalid: usize,
}

pub async fn import_file(db: &DatabaseConnection, path: &Path) -> Result<ImportReport, AppError> {
    let file = std::fs::File::open(path)
        .map_err(|e| AppError::BadRequest(format!("Cannot open {}: {e}", path.display())))?;
    import_from_reader(db, file).await
}

pub async fn import_from_reader<R: Read>(
    db: &DatabaseConnection,
    reader: R,
) -> Result<ImportReport, AppError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut report = ImportReport::default();
    for (line, row) in csv.deserialize::<RosterRow>().enumerate() {
        let row = match row {
            Ok(row) if !row.student_id.is_empty() && row.email.contains('@') && !row.password.is_empty() => row,
            Ok(_) => {
                report.invalid += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(line = line + 2, "skipping unreadable roster row: {e}");
                report.invalid += 1;
                continue;
            }
        };

        if legacy_credential::Entity::find_by_id(row.student_id.clone())
            .one(db)
            .await?
            .is_some()
        {
            report.skipped_existing += 1;
            continue;
        }

        // Some exports already carry argon2 hashes
        let password_hash = if row.password.starts_with("$argon2") {
            row.password
        } else {
            hash_password(&row.password)?
        };

        legacy_credential::ActiveModel {
            student_id: Set(row.student_id),
            email: Set(row.email.to_lowercase()),
            name: Set(row.name.filter(|n| !n.is_empty())),
            password_hash: Set(password_hash),
            claimed_at: Set(None),
            imported_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(db)
        .await?;
        report.imported += 1;
    }

    tracing::info!(
        imported = report.imported,
        skipped = report.skipped_existing,
        invalid = report.invalid,
        "roster import finished"
    );
    Ok(report)
}
