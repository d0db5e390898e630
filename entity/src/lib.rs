pub mod announcement;
pub mod appointment;
pub mod calendar_closure;
pub mod id_card;
pub mod id_card_event;
pub mod legacy_credential;
pub mod scheduling_window;
pub mod sea_orm_active_enums;
pub mod slot;
pub mod user;

pub mod prelude {
    pub use super::announcement::Entity as Announcement;
    pub use super::appointment::Entity as Appointment;
    pub use super::calendar_closure::Entity as CalendarClosure;
    pub use super::id_card::Entity as IdCard;
    pub use super::id_card_event::Entity as IdCardEvent;
    pub use super::legacy_credential::Entity as LegacyCredential;
    pub use super::scheduling_window::Entity as SchedulingWindow;
    pub use super::slot::Entity as Slot;
    pub use super::user::Entity as User;
}
