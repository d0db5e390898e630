use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "student")]
    Student,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

/// What a slot (and the appointment booked on it) is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Purpose {
    #[sea_orm(string_value = "NEW_ID")]
    NewId,
    #[sea_orm(string_value = "RENEWAL")]
    Renewal,
    #[sea_orm(string_value = "LOST_REPLACEMENT")]
    LostReplacement,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::NewId => "NEW_ID",
            Purpose::Renewal => "RENEWAL",
            Purpose::LostReplacement => "LOST_REPLACEMENT",
        }
    }
}

/// Purpose filter of a scheduling window. `All` matches every slot purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowPurpose {
    #[sea_orm(string_value = "ALL")]
    All,
    #[sea_orm(string_value = "NEW_ID")]
    NewId,
    #[sea_orm(string_value = "RENEWAL")]
    Renewal,
    #[sea_orm(string_value = "LOST_REPLACEMENT")]
    LostReplacement,
}

impl WindowPurpose {
    pub fn covers(&self, purpose: Purpose) -> bool {
        matches!(
            (self, purpose),
            (WindowPurpose::All, _)
                | (WindowPurpose::NewId, Purpose::NewId)
                | (WindowPurpose::Renewal, Purpose::Renewal)
                | (WindowPurpose::LostReplacement, Purpose::LostReplacement)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[sea_orm(string_value = "pending-approval")]
    PendingApproval,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "declined")]
    Declined,
    #[sea_orm(string_value = "on-hold")]
    OnHold,
    #[sea_orm(string_value = "for-printing")]
    ForPrinting,
    #[sea_orm(string_value = "to-claim")]
    ToClaim,
    #[sea_orm(string_value = "claimed")]
    Claimed,
    #[sea_orm(string_value = "missed")]
    Missed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::PendingApproval => "pending-approval",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Declined => "declined",
            AppointmentStatus::OnHold => "on-hold",
            AppointmentStatus::ForPrinting => "for-printing",
            AppointmentStatus::ToClaim => "to-claim",
            AppointmentStatus::Claimed => "claimed",
            AppointmentStatus::Missed => "missed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Whether an appointment in this status occupies a seat on its slot.
    pub fn holds_seat(&self) -> bool {
        !matches!(
            self,
            AppointmentStatus::Declined | AppointmentStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdCardStatus {
    #[sea_orm(string_value = "CLAIMED")]
    Claimed,
    #[sea_orm(string_value = "RETURNED")]
    Returned,
}
