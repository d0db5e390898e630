pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_users;
mod m20250601_000002_create_slots;
mod m20250601_000003_create_appointments;
mod m20250601_000004_create_calendar_closures;
mod m20250601_000005_create_scheduling_windows;
mod m20250601_000006_create_announcements;
mod m20250601_000007_create_id_cards;
mod m20250601_000008_create_legacy_credentials;
mod m20250615_000009_add_appointment_scan_audit;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_users::Migration),
            Box::new(m20250601_000002_create_slots::Migration),
            Box::new(m20250601_000003_create_appointments::Migration),
            Box::new(m20250601_000004_create_calendar_closures::Migration),
            Box::new(m20250601_000005_create_scheduling_windows::Migration),
            Box::new(m20250601_000006_create_announcements::Migration),
            Box::new(m20250601_000007_create_id_cards::Migration),
            Box::new(m20250601_000008_create_legacy_credentials::Migration),
            Box::new(m20250615_000009_add_appointment_scan_audit::Migration),
        ]
    }
}
