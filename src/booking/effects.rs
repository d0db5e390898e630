//! Work that happens after a booking change has been committed.
//!
//! Everything here runs detached from the request and only logs on failure.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::checkin;
use crate::db::queries;
use crate::notify::{templates, with_retry};
use crate::AppState;
use entity::appointment;

fn qr_png(payload: Option<&str>) -> Option<Vec<u8>> {
    let payload = payload?;
    match checkin::render_png(payload) {
        Ok(png) => Some(png),
        Err(e) => {
            tracing::warn!("QR rendering failed, sending email without it: {e}");
            None
        }
    }
}

/// Calendar event plus confirmation email for a new appointment.
pub fn after_booking(state: &AppState, appt: appointment::Model, qr_payload: String) {
    let state = state.clone();
    tokio::spawn(async move {
        add_calendar_event(&state, &appt).await;
        let email = templates::booking_confirmation(&appt, qr_png(Some(&qr_payload)));
        state.notifications.deliver(email).await;
    });
}

pub fn after_status_change(state: &AppState, appt: appointment::Model, qr_payload: Option<String>) {
    let state = state.clone();
    tokio::spawn(async move {
        let email = templates::status_change(&appt, qr_png(qr_payload.as_deref()));
        state.notifications.deliver(email).await;
    });
}

async fn add_calendar_event(state: &AppState, appt: &appointment::Model) {
    let user = match queries::users::find_by_id(&state.db, &appt.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(appointment_id = %appt.id, "could not load user for calendar event: {e}");
            return;
        }
    };
    let Some(access_token) = user.google_access_token else {
        return;
    };

    let calendar = state.notifications.calendar();
    let event_id = with_retry("calendar", state.notifications.retry_policy(), || {
        calendar.create_event(&access_token, appt)
    })
    .await;

    if let Some(event_id) = event_id {
        let saved = appointment::Entity::update_many()
            .col_expr(appointment::Column::CalendarEventId, Expr::value(event_id))
            .filter(appointment::Column::Id.eq(&appt.id))
            .exec(&state.db)
            .await;
        if let Err(e) = saved {
            tracing::warn!(appointment_id = %appt.id, "could not store calendar event id: {e}");
        }
    }
}
