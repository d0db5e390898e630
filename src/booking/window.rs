use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::db::queries;
use crate::error::AppError;
use entity::sea_orm_active_enums::Purpose;
use entity::{calendar_closure, scheduling_window, slot};

/// A slot is offered when some active window covers today, covers the slot's
/// date, and matches the slot's purpose. No active window means nothing is
/// offered.
pub fn is_offered(
    slot: &slot::Model,
    windows: &[scheduling_window::Model],
    today: NaiveDate,
) -> bool {
    windows.iter().any(|w| {
        w.is_active && w.contains(today) && w.contains(slot.date) && w.purpose.covers(slot.purpose)
    })
}

/// Windows that are switched on and open today.
pub async fn open_windows<C: ConnectionTrait>(
    db: &C,
    today: NaiveDate,
) -> Result<Vec<scheduling_window::Model>, AppError> {
    Ok(scheduling_window::Entity::find()
        .filter(scheduling_window::Column::IsActive.eq(true))
        .filter(scheduling_window::Column::StartDate.lte(today))
        .filter(scheduling_window::Column::EndDate.gte(today))
        .order_by_asc(scheduling_window::Column::StartDate)
        .all(db)
        .await?)
}

#[derive(Debug, Default, Clone)]
pub struct SlotQuery {
    pub date: Option<NaiveDate>,
    pub purpose: Option<Purpose>,
}

/// Slots a student may book right now.
///
/// On top of the window rule this drops full slots, slots on closed dates and
/// slots on dates that already reached the daily cap.
pub async fn available_slots<C: ConnectionTrait>(
    db: &C,
    today: NaiveDate,
    query: &SlotQuery,
    daily_cap: u64,
) -> Result<Vec<slot::Model>, AppError> {
    let windows = open_windows(db, today).await?;
    if windows.is_empty() {
        return Ok(Vec::new());
    }

    // Only dates some open window can cover
    let earliest = windows.iter().map(|w| w.start_date).min().unwrap_or(today);
    let latest = windows.iter().map(|w| w.end_date).max().unwrap_or(today);

    let mut select = slot::Entity::find()
        .filter(slot::Column::Date.gte(earliest))
        .filter(slot::Column::Date.lte(latest));
    if let Some(date) = query.date {
        select = select.filter(slot::Column::Date.eq(date));
    }
    if let Some(purpose) = query.purpose {
        select = select.filter(slot::Column::Purpose.eq(purpose));
    }
    let slots = select
        .order_by_asc(slot::Column::Date)
        .order_by_asc(slot::Column::StartTime)
        .all(db)
        .await?;

    let closed: HashSet<NaiveDate> = calendar_closure::Entity::find()
        .filter(calendar_closure::Column::Date.gte(earliest))
        .filter(calendar_closure::Column::Date.lte(latest))
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.date)
        .collect();

    let mut capped: HashMap<NaiveDate, bool> = HashMap::new();
    let mut offered = Vec::new();
    for slot in slots {
        if slot.is_full() || closed.contains(&slot.date) || !is_offered(&slot, &windows, today) {
            continue;
        }
        let at_cap = match capped.get(&slot.date) {
            Some(at_cap) => *at_cap,
            None => {
                let count = queries::appointments::count_seat_holding_on_date(db, slot.date).await?;
                let at_cap = count >= daily_cap;
                capped.insert(slot.date, at_cap);
                at_cap
            }
        };
        if !at_cap {
            offered.push(slot);
        }
    }

    Ok(offered)
}
