//! Booking consistency service.
//!
//! Every operation that touches slot seats runs inside one database
//! transaction and changes `booked_count` only through the conditional
//! updates in `queries::slots`, so the counter never leaves
//! `0..=capacity`. Notifications are dispatched after commit.

pub mod checkin;
pub mod effects;
pub mod id_cards;
pub mod status;
pub mod window;

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;
use entity::sea_orm_active_enums::{AppointmentStatus, Purpose};
use entity::{appointment, calendar_closure, id_card, id_card_event, slot, user};
use status::Actor;

static GMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@gmail\.com$").expect("Gmail pattern is a valid regex")
});

pub fn validate_contact_email(email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if GMAIL_RE.is_match(email) {
        Ok(email.to_string())
    } else {
        Err(AppError::BadRequest(
            "Contact email must be a valid Gmail address".to_string(),
        ))
    }
}

/// Frontends send these ids for the built-in time buckets that have no slot row.
pub fn is_placeholder_slot(slot_id: &str) -> bool {
    let slot_id = slot_id.trim();
    slot_id.is_empty() || slot_id.starts_with("placeholder-") || slot_id.starts_with("default-")
}

/// Parse `HH:MM`, returning it normalized.
pub fn parse_hhmm(raw: &str) -> Option<String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .ok()
        .map(|t| t.format("%H:%M").to_string())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAppointment {
    pub slot_id: Option<String>,
    pub purpose: Option<Purpose>,
    pub picture_option: Option<String>,
    pub notes: Option<String>,
    pub appointment_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub contact_email: String,
    pub status: Option<String>,
}

/// Where and when a new appointment lands.
struct Placement {
    slot: Option<slot::Model>,
    date: NaiveDate,
    start_time: String,
    end_time: String,
    purpose: Purpose,
}

fn raw_schedule(req: &NewAppointment) -> Result<(NaiveDate, String, String), AppError> {
    let (Some(date), Some(start), Some(end)) = (
        req.appointment_date.as_deref(),
        req.start_time.as_deref(),
        req.end_time.as_deref(),
    ) else {
        return Err(AppError::BadRequest(
            "appointment_date, start_time and end_time are required without a slot".to_string(),
        ));
    };

    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("appointment_date must be YYYY-MM-DD".to_string()))?;
    let (Some(start), Some(end)) = (parse_hhmm(start), parse_hhmm(end)) else {
        return Err(AppError::BadRequest("Times must be HH:MM".to_string()));
    };
    if start >= end {
        return Err(AppError::BadRequest(
            "start_time must be before end_time".to_string(),
        ));
    }
    Ok((date, start, end))
}

async fn resolve_placement<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    req: &NewAppointment,
) -> Result<Placement, AppError> {
    let slot_id = req
        .slot_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !is_placeholder_slot(id));

    let Some(slot_id) = slot_id else {
        let (date, start_time, end_time) = raw_schedule(req)?;
        let purpose = req
            .purpose
            .ok_or_else(|| AppError::BadRequest("purpose is required".to_string()))?;
        return Ok(Placement {
            slot: None,
            date,
            start_time,
            end_time,
            purpose,
        });
    };

    let slot = queries::slots::find_by_id(db, slot_id)
        .await?
        .ok_or(AppError::SlotNotFound)?;
    if slot.is_full() {
        return Err(AppError::SlotFull);
    }
    if queries::appointments::find_user_booking_for_slot(db, user_id, &slot.id)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateBooking);
    }

    Ok(Placement {
        date: slot.date,
        start_time: slot.start_time.clone(),
        end_time: slot.end_time.clone(),
        purpose: slot.purpose,
        slot: Some(slot),
    })
}

pub async fn create_appointment(
    state: &AppState,
    user: &AuthenticatedUser,
    req: NewAppointment,
) -> Result<appointment::Model, AppError> {
    let contact_email = validate_contact_email(&req.contact_email)?;
    if let Some(raw) = req.status.as_deref() {
        if status::parse_status(raw) != Some(AppointmentStatus::PendingApproval) {
            return Err(AppError::BadRequest(
                "New appointments start as pending-approval".to_string(),
            ));
        }
    }

    let txn = state.db.begin().await?;
    let placement = resolve_placement(&txn, &user.user_id, &req).await?;

    let closed = calendar_closure::Entity::find()
        .filter(calendar_closure::Column::Date.eq(placement.date))
        .one(&txn)
        .await?;
    if closed.is_some() {
        return Err(AppError::DateClosed(placement.date));
    }

    let booked_that_day =
        queries::appointments::count_seat_holding_on_date(&txn, placement.date).await?;
    if booked_that_day >= state.config.daily_appointment_cap {
        return Err(AppError::DateFullyBooked);
    }

    let id = Uuid::new_v4().to_string();
    let issued = checkin::issue(&id, state.config.checkin_token_ttl_hours);
    let now = Utc::now().naive_utc();
    let appt = appointment::ActiveModel {
        id: Set(id),
        user_id: Set(user.user_id.clone()),
        slot_id: Set(placement.slot.as_ref().map(|s| s.id.clone())),
        purpose: Set(placement.purpose),
        picture_option: Set(req.picture_option),
        notes: Set(req.notes),
        appointment_date: Set(placement.date),
        start_time: Set(placement.start_time),
        end_time: Set(placement.end_time),
        status: Set(AppointmentStatus::PendingApproval),
        contact_email: Set(contact_email),
        admin_remarks: Set(None),
        status_updated_at: Set(None),
        status_updated_by: Set(None),
        checkin_token_hash: Set(Some(issued.token_hash.clone())),
        checkin_expires_at: Set(Some(issued.expires_at)),
        qr_payload: Set(Some(issued.payload_json())),
        calendar_event_id: Set(None),
        last_scanned_at: Set(None),
        scanned_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    if let Some(slot) = &placement.slot {
        if !queries::slots::reserve_seat(&txn, &slot.id).await? {
            return Err(AppError::SlotFull);
        }
    }
    txn.commit().await?;

    tracing::info!(
        appointment_id = %appt.id,
        user_id = %appt.user_id,
        date = %appt.appointment_date,
        "appointment booked"
    );
    effects::after_booking(state, appt.clone(), issued.payload_json());
    Ok(appt)
}

/// Remove an appointment with its ID card records, releasing the seat it held.
async fn remove_appointment<C: ConnectionTrait>(
    db: &C,
    appt: &appointment::Model,
) -> Result<(), AppError> {
    let cards: Vec<String> = id_card::Entity::find()
        .filter(id_card::Column::AppointmentId.eq(&appt.id))
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    if !cards.is_empty() {
        id_card_event::Entity::delete_many()
            .filter(id_card_event::Column::IdCardId.is_in(cards.clone()))
            .exec(db)
            .await?;
        id_card::Entity::delete_many()
            .filter(id_card::Column::Id.is_in(cards))
            .exec(db)
            .await?;
    }

    appointment::Entity::delete_by_id(appt.id.clone())
        .exec(db)
        .await?;

    if appt.status.holds_seat() {
        if let Some(slot_id) = &appt.slot_id {
            queries::slots::release_seat(db, slot_id).await?;
        }
    }
    Ok(())
}

pub async fn cancel_appointment(
    state: &AppState,
    user: &AuthenticatedUser,
    appointment_id: &str,
) -> Result<(), AppError> {
    let txn = state.db.begin().await?;
    let appt = queries::appointments::find_by_id(&txn, appointment_id)
        .await?
        .ok_or(AppError::AppointmentNotFound)?;
    user.ensure_can_access(&appt.user_id)?;

    // Students can drop finished (declined/cancelled) rows, but not an ID in progress
    if !user.is_admin()
        && appt.status.holds_seat()
        && !status::can_transition(Actor::Owner, appt.status, AppointmentStatus::Cancelled)
    {
        return Err(AppError::InvalidTransition {
            from: appt.status.as_str().to_string(),
            to: AppointmentStatus::Cancelled.as_str().to_string(),
        });
    }

    remove_appointment(&txn, &appt).await?;
    txn.commit().await?;

    tracing::info!(appointment_id, actor = %user.user_id, "appointment cancelled");
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusChange {
    pub status: Option<String>,
    pub admin_remarks: Option<String>,
}

pub async fn update_status(
    state: &AppState,
    user: &AuthenticatedUser,
    appointment_id: &str,
    change: StatusChange,
) -> Result<appointment::Model, AppError> {
    let actor = if user.is_admin() {
        Actor::Admin
    } else {
        Actor::Owner
    };
    if actor == Actor::Owner && change.admin_remarks.is_some() {
        return Err(AppError::Forbidden);
    }

    let target = match change.status.as_deref() {
        Some(raw) => Some(
            status::parse_status(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {raw}")))?,
        ),
        None => None,
    };
    if target.is_none() && change.admin_remarks.is_none() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let txn = state.db.begin().await?;
    let appt = queries::appointments::find_by_id(&txn, appointment_id)
        .await?
        .ok_or(AppError::AppointmentNotFound)?;
    user.ensure_can_access(&appt.user_id)?;

    let from = appt.status;
    let to = target.unwrap_or(from);
    if target.is_some() {
        status::ensure_transition(actor, from, to)?;
    }

    let now = Utc::now().naive_utc();
    let slot_id = appt.slot_id.clone();
    let mut active: appointment::ActiveModel = appt.into();
    active.status = Set(to);
    active.updated_at = Set(now);

    let mut fresh_qr = None;
    if actor == Actor::Admin {
        active.status_updated_at = Set(Some(now));
        active.status_updated_by = Set(Some(user.user_id.clone()));
        if let Some(remarks) = change.admin_remarks {
            active.admin_remarks = Set(Some(remarks));
        }
        if to == AppointmentStatus::Confirmed && target.is_some() {
            let issued = checkin::issue(appointment_id, state.config.checkin_token_ttl_hours);
            active.checkin_token_hash = Set(Some(issued.token_hash.clone()));
            active.checkin_expires_at = Set(Some(issued.expires_at));
            active.qr_payload = Set(Some(issued.payload_json()));
            fresh_qr = Some(issued.payload_json());
        }
    }
    let updated = active.update(&txn).await?;

    if from.holds_seat() && !to.holds_seat() {
        if let Some(slot_id) = &slot_id {
            queries::slots::release_seat(&txn, slot_id).await?;
        }
    }
    txn.commit().await?;

    tracing::info!(
        appointment_id,
        from = from.as_str(),
        to = to.as_str(),
        actor = %user.user_id,
        "appointment status updated"
    );
    if actor == Actor::Admin {
        effects::after_status_change(state, updated.clone(), fresh_qr);
    }
    Ok(updated)
}

#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    pub payload: String,
    pub qr_code: String,
    pub expires_at: NaiveDateTime,
}

/// Issue a new check-in token, replacing the previous one.
pub async fn generate_qr(
    state: &AppState,
    user: &AuthenticatedUser,
    appointment_id: &str,
) -> Result<QrCodeResponse, AppError> {
    let appt = queries::appointments::find_by_id(&state.db, appointment_id)
        .await?
        .ok_or(AppError::AppointmentNotFound)?;
    user.ensure_can_access(&appt.user_id)?;
    if !appt.status.holds_seat() {
        return Err(AppError::BadRequest(format!(
            "No QR code for a {} appointment",
            appt.status.as_str()
        )));
    }

    let issued = checkin::issue(&appt.id, state.config.checkin_token_ttl_hours);
    let payload = issued.payload_json();
    let png = checkin::render_png(&payload)?;

    let mut active: appointment::ActiveModel = appt.into();
    active.checkin_token_hash = Set(Some(issued.token_hash));
    active.checkin_expires_at = Set(Some(issued.expires_at));
    active.qr_payload = Set(Some(payload.clone()));
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(&state.db).await?;

    Ok(QrCodeResponse {
        payload,
        qr_code: checkin::png_data_url(&png),
        expires_at: issued.expires_at,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanAction {
    #[default]
    CheckIn,
    Claim,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    #[serde(rename = "ref")]
    pub reference: String,
    pub t: String,
    #[serde(default)]
    pub action: ScanAction,
}

#[derive(Debug, Serialize)]
pub struct ScanOutcome {
    pub appointment: appointment::Model,
    pub id_card: Option<id_card::Model>,
}

/// Handle a QR code scanned at the counter.
pub async fn scan(
    state: &AppState,
    admin: &AuthenticatedUser,
    req: ScanRequest,
) -> Result<ScanOutcome, AppError> {
    let now = Utc::now().naive_utc();
    let txn = state.db.begin().await?;
    let appt = queries::appointments::find_by_id(&txn, req.reference.trim())
        .await?
        .ok_or(AppError::AppointmentNotFound)?;
    checkin::verify(&appt, &req.t, now)?;

    let from = appt.status;
    let to = match req.action {
        ScanAction::CheckIn => match from {
            AppointmentStatus::PendingApproval | AppointmentStatus::Confirmed => {
                AppointmentStatus::Confirmed
            }
            _ => {
                return Err(AppError::InvalidTransition {
                    from: from.as_str().to_string(),
                    to: AppointmentStatus::Confirmed.as_str().to_string(),
                })
            }
        },
        ScanAction::Claim => ensure_claimable(from)?,
    };

    let id_card = match req.action {
        ScanAction::Claim => {
            let remarks = Some("Claimed at counter".to_string());
            Some(id_cards::issue(&txn, &appt, &admin.user_id, remarks).await?)
        }
        ScanAction::CheckIn => None,
    };

    let mut active: appointment::ActiveModel = appt.into();
    active.status = Set(to);
    active.status_updated_at = Set(Some(now));
    active.status_updated_by = Set(Some(admin.user_id.clone()));
    active.last_scanned_at = Set(Some(now));
    active.scanned_by = Set(Some(admin.user_id.clone()));
    active.checkin_token_hash = Set(None);
    active.checkin_expires_at = Set(None);
    active.qr_payload = Set(None);
    active.updated_at = Set(now);
    let appointment = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        appointment_id = %appointment.id,
        action = ?req.action,
        from = from.as_str(),
        to = to.as_str(),
        admin = %admin.user_id,
        "QR code scanned"
    );
    Ok(ScanOutcome {
        appointment,
        id_card,
    })
}

fn ensure_claimable(from: AppointmentStatus) -> Result<AppointmentStatus, AppError> {
    if status::can_claim(from) {
        Ok(AppointmentStatus::Claimed)
    } else {
        Err(AppError::InvalidTransition {
            from: from.as_str().to_string(),
            to: AppointmentStatus::Claimed.as_str().to_string(),
        })
    }
}

/// Hand out the card at the counter without a scan. The appointment moves
/// to `claimed` along with the card.
pub async fn issue_id_card(
    state: &AppState,
    admin: &AuthenticatedUser,
    appointment_id: &str,
    remarks: Option<String>,
) -> Result<id_card::Model, AppError> {
    let now = Utc::now().naive_utc();
    let txn = state.db.begin().await?;
    let appt = queries::appointments::find_by_id(&txn, appointment_id)
        .await?
        .ok_or(AppError::AppointmentNotFound)?;
    let to = ensure_claimable(appt.status)?;
    let card = id_cards::issue(&txn, &appt, &admin.user_id, remarks).await?;

    let mut active: appointment::ActiveModel = appt.into();
    active.status = Set(to);
    active.status_updated_at = Set(Some(now));
    active.status_updated_by = Set(Some(admin.user_id.clone()));
    active.checkin_token_hash = Set(None);
    active.checkin_expires_at = Set(None);
    active.qr_payload = Set(None);
    active.updated_at = Set(now);
    active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(card_id = %card.id, appointment_id, admin = %admin.user_id, "ID card issued");
    Ok(card)
}

/// Delete a user with everything that hangs off them, releasing held seats.
pub async fn delete_user(state: &AppState, user_id: &str) -> Result<(), AppError> {
    let txn = state.db.begin().await?;
    let user = queries::users::find_by_id(&txn, user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let appointments = appointment::Entity::find()
        .filter(appointment::Column::UserId.eq(&user.id))
        .all(&txn)
        .await?;
    let count = appointments.len();
    for appt in &appointments {
        remove_appointment(&txn, appt).await?;
    }
    user::Entity::delete_by_id(user.id.clone()).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(user_id, appointments = count, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_gmail_addresses_are_accepted() {
        assert!(validate_contact_email("juan.dela-cruz+id@gmail.com").is_ok());
        assert_eq!(
            validate_contact_email("  someone@gmail.com ").unwrap(),
            "someone@gmail.com"
        );
        assert!(validate_contact_email("someone@yahoo.com").is_err());
        assert!(validate_contact_email("someone@gmail.com.ph").is_err());
        assert!(validate_contact_email("@gmail.com").is_err());
    }

    #[test]
    fn claim_needs_an_approved_status() {
        assert_eq!(
            ensure_claimable(AppointmentStatus::ToClaim).unwrap(),
            AppointmentStatus::Claimed
        );
        let err = ensure_claimable(AppointmentStatus::PendingApproval).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot change status from pending-approval to claimed"
        );
    }

    #[test]
    fn placeholder_ids_mean_no_slot() {
        assert!(is_placeholder_slot(""));
        assert!(is_placeholder_slot("placeholder-0800"));
        assert!(is_placeholder_slot("default-2025-06-02-08:00"));
        assert!(!is_placeholder_slot("4b8f7c1e-2f55-4a4e-9d1e-6a1f0d8b2c3a"));
    }

    #[test]
    fn raw_schedule_requires_ordered_times() {
        let mut req = NewAppointment {
            appointment_date: Some("2025-06-02".to_string()),
            start_time: Some("9:00".to_string()),
            end_time: Some("10:00".to_string()),
            ..Default::default()
        };
        let (date, start, end) = raw_schedule(&req).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(start, "09:00");
        assert_eq!(end, "10:00");

        req.end_time = Some("08:30".to_string());
        assert!(raw_schedule(&req).is_err());

        req.end_time = None;
        assert!(raw_schedule(&req).is_err());
    }

    #[test]
    fn scan_action_defaults_to_check_in() {
        let req: ScanRequest = serde_json::from_str(r#"{"ref":"a1","t":"tok"}"#).unwrap();
        assert_eq!(req.action, ScanAction::CheckIn);
        let req: ScanRequest =
            serde_json::from_str(r#"{"ref":"a1","t":"tok","action":"claim"}"#).unwrap();
        assert_eq!(req.action, ScanAction::Claim);
    }
}
