use entity::sea_orm_active_enums::AppointmentStatus;

use crate::error::AppError;

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Owner,
    Admin,
}

/// Parse a status sent by a client. Accepts the kebab-case names as well as
/// the upper-case spellings older clients still send.
pub fn parse_status(raw: &str) -> Option<AppointmentStatus> {
    let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
    let status = match normalized.as_str() {
        "pending-approval" | "pending" => AppointmentStatus::PendingApproval,
        "confirmed" | "approved" => AppointmentStatus::Confirmed,
        "declined" | "rejected" => AppointmentStatus::Declined,
        "on-hold" | "onhold" => AppointmentStatus::OnHold,
        "for-printing" => AppointmentStatus::ForPrinting,
        "to-claim" => AppointmentStatus::ToClaim,
        "claimed" => AppointmentStatus::Claimed,
        "missed" => AppointmentStatus::Missed,
        "cancelled" | "canceled" => AppointmentStatus::Cancelled,
        _ => return None,
    };
    Some(status)
}

pub fn can_transition(actor: Actor, from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;

    if from == to {
        return actor == Actor::Admin;
    }

    match actor {
        Actor::Owner => matches!(
            (from, to),
            (PendingApproval | OnHold | Confirmed | Missed, Cancelled)
        ),
        Actor::Admin => matches!(
            (from, to),
            (PendingApproval, Confirmed | Declined | OnHold | Cancelled)
                | (OnHold, Confirmed | Declined | Cancelled)
                | (Confirmed, ForPrinting | Missed | OnHold | Cancelled)
                | (ForPrinting, ToClaim)
                | (ToClaim, Claimed)
                | (Missed, Confirmed | Cancelled)
        ),
    }
}

/// Statuses from which a scanned QR code may mark the ID as claimed.
pub fn can_claim(from: AppointmentStatus) -> bool {
    matches!(
        from,
        AppointmentStatus::Confirmed | AppointmentStatus::ForPrinting | AppointmentStatus::ToClaim
    )
}

pub fn ensure_transition(
    actor: Actor,
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), AppError> {
    if can_transition(actor, from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}
