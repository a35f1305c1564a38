use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use super::db::last_insert_rowid;
use crate::models::{
    MaintenanceSchedule, MaintenanceScheduleInput, MaintenanceScheduleUpdate,
    NewMaintenanceSchedule,
};

/// Inserts a new maintenance schedule; `is_active` defaults to true.
pub fn insert_maintenance_schedule(
    conn: &mut SqliteConnection,
    input: MaintenanceScheduleInput,
) -> Result<MaintenanceSchedule, diesel::result::Error> {
    use crate::schema::maintenance_schedules::dsl::*;

    let now = Utc::now().naive_utc();
    let new_schedule = NewMaintenanceSchedule {
        building_id: input.building_id,
        title: input.title,
        description: input.description,
        frequency: input.frequency,
        next_due_date: input.next_due_date,
        assigned_to: input.assigned_to,
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(maintenance_schedules)
        .values(&new_schedule)
        .execute(conn)?;

    let last_id = last_insert_rowid(conn)?;
    maintenance_schedules
        .filter(id.eq(last_id))
        .select(MaintenanceSchedule::as_select())
        .first(conn)
}

pub fn get_maintenance_schedule(
    conn: &mut SqliteConnection,
    schedule_id: i32,
) -> Result<Option<MaintenanceSchedule>, diesel::result::Error> {
    use crate::schema::maintenance_schedules::dsl::*;
    maintenance_schedules
        .filter(id.eq(schedule_id))
        .select(MaintenanceSchedule::as_select())
        .first(conn)
        .optional()
}

/// Schedules of one building ordered by next due date.
pub fn list_maintenance_schedules_for_building(
    conn: &mut SqliteConnection,
    building: i32,
) -> Result<Vec<MaintenanceSchedule>, diesel::result::Error> {
    use crate::schema::maintenance_schedules::dsl::*;
    maintenance_schedules
        .filter(building_id.eq(building))
        .order((next_due_date.asc(), id.asc()))
        .select(MaintenanceSchedule::as_select())
        .load(conn)
}

/// Active schedules due on or before `cutoff`, ordered by due date.
///
/// When `building_ids` is `Some`, only those buildings are considered.
pub fn list_due_maintenance_schedules(
    conn: &mut SqliteConnection,
    cutoff: NaiveDateTime,
    building_ids: Option<&[i32]>,
) -> Result<Vec<MaintenanceSchedule>, diesel::result::Error> {
    use crate::schema::maintenance_schedules::dsl::*;

    let mut query = maintenance_schedules
        .filter(is_active.eq(true))
        .filter(next_due_date.le(cutoff))
        .into_boxed();
    if let Some(ids) = building_ids {
        query = query.filter(building_id.eq_any(ids.to_vec()));
    }
    query
        .order((next_due_date.asc(), id.asc()))
        .select(MaintenanceSchedule::as_select())
        .load(conn)
}

/// Applies a partial update to a schedule and stamps `updated_at`.
pub fn update_maintenance_schedule(
    conn: &mut SqliteConnection,
    schedule_id: i32,
    changes: MaintenanceScheduleUpdate,
) -> Result<MaintenanceSchedule, diesel::result::Error> {
    use crate::schema::maintenance_schedules::dsl::*;

    let affected = diesel::update(maintenance_schedules.filter(id.eq(schedule_id)))
        .set((&changes, updated_at.eq(Utc::now().naive_utc())))
        .execute(conn)?;
    if affected == 0 {
        return Err(diesel::result::Error::NotFound);
    }

    maintenance_schedules
        .filter(id.eq(schedule_id))
        .select(MaintenanceSchedule::as_select())
        .first(conn)
}

pub fn delete_maintenance_schedule(
    conn: &mut SqliteConnection,
    schedule_id: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::maintenance_schedules::dsl::*;
    diesel::delete(maintenance_schedules.filter(id.eq(schedule_id))).execute(conn)
}
