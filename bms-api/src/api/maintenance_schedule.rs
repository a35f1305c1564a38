//! API endpoints for recurring maintenance schedules.
//!
//! # Authorization Rules
//! - Staff with access to a building create and update its schedules
//! - Anyone with access to the building can read them
//! - Administrators delete schedules

use chrono::{TimeDelta, Utc};
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;

use super::{
    ApiError, api_error, not_found, require_building_access, require_non_blank,
    require_non_blank_if_set, require_target_building, store_error, value_list,
};
use crate::DbConn;
use crate::access::visible_building_ids;
use crate::logged_json::LoggedJson;
use crate::models::{MaintenanceSchedule, MaintenanceScheduleInput, MaintenanceScheduleUpdate};
use crate::orm::maintenance_schedule::{
    delete_maintenance_schedule, get_maintenance_schedule, insert_maintenance_schedule,
    list_due_maintenance_schedules, update_maintenance_schedule,
};
use crate::session_guards::{AdministratorUser, AuthenticatedUser, StaffUser};

/// Create Maintenance Schedule endpoint.
///
/// - **URL:** `/api/1/MaintenanceSchedules`
/// - **Method:** `POST`
/// - **Authorization:** staff with access to the building
///
/// # Request Format
///
/// ```json
/// {
///   "building_id": 1,
///   "title": "Test sprinkler pumps",
///   "frequency": "monthly",
///   "next_due_date": "2025-04-01T08:00:00",
///   "assigned_to": 3
/// }
/// ```
///
/// `is_active` defaults to true.
#[post("/1/MaintenanceSchedules", data = "<new_schedule>")]
pub async fn create_maintenance_schedule(
    db: DbConn,
    new_schedule: LoggedJson<MaintenanceScheduleInput>,
    staff: StaffUser,
) -> Result<status::Created<Json<MaintenanceSchedule>>, ApiError> {
    let input = new_schedule.into_inner();
    require_non_blank("title", &input.title)?;

    db.run(move |conn| {
        require_target_building(conn, &staff.user, input.building_id)?;
        insert_maintenance_schedule(conn, input)
            .map(|schedule| {
                status::Created::new(format!("/api/1/MaintenanceSchedules/{}", schedule.id))
                    .body(Json(schedule))
            })
            .map_err(|e| store_error("creating maintenance schedule", e))
    })
    .await
}

/// Due Maintenance endpoint.
///
/// - **URL:** `/api/1/MaintenanceSchedules/Due?within_days=<n>`
/// - **Method:** `GET`
///
/// Active schedules of buildings visible to the caller that fall due within
/// `n` days from now, ordered by due date. `n` defaults to 0, which lists
/// schedules that are due or overdue.
#[get("/1/MaintenanceSchedules/Due?<within_days>")]
pub async fn list_due_maintenance(
    db: DbConn,
    within_days: Option<i64>,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let days = within_days.unwrap_or(0);
    if days < 0 {
        return Err(api_error(
            Status::BadRequest,
            "within_days must not be negative",
        ));
    }
    let cutoff = TimeDelta::try_days(days)
        .and_then(|window| Utc::now().naive_utc().checked_add_signed(window))
        .ok_or_else(|| api_error(Status::BadRequest, "within_days is too large"))?;

    db.run(move |conn| {
        let building_ids = visible_building_ids(conn, &auth_user.user)?;
        list_due_maintenance_schedules(conn, cutoff, building_ids.as_deref())
    })
    .await
    .map(value_list)
    .map_err(|e| store_error("listing due maintenance", e))
}

/// Get Maintenance Schedule endpoint.
///
/// - **URL:** `/api/1/MaintenanceSchedules/<schedule_id>`
/// - **Method:** `GET`
#[get("/1/MaintenanceSchedules/<schedule_id>")]
pub async fn get_maintenance_schedule_endpoint(
    db: DbConn,
    schedule_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<MaintenanceSchedule>, ApiError> {
    db.run(move |conn| {
        let schedule = match get_maintenance_schedule(conn, schedule_id) {
            Ok(Some(s)) => s,
            Ok(None) => return Err(not_found("Maintenance schedule", schedule_id)),
            Err(e) => return Err(store_error("fetching maintenance schedule", e)),
        };
        require_building_access(conn, &auth_user.user, schedule.building_id)?;
        Ok(Json(schedule))
    })
    .await
}

/// Update Maintenance Schedule endpoint.
///
/// - **URL:** `/api/1/MaintenanceSchedules/<schedule_id>`
/// - **Method:** `PUT`
/// - **Authorization:** staff with access to the building
#[put("/1/MaintenanceSchedules/<schedule_id>", data = "<changes>")]
pub async fn update_maintenance_schedule_endpoint(
    db: DbConn,
    schedule_id: i32,
    changes: LoggedJson<MaintenanceScheduleUpdate>,
    staff: StaffUser,
) -> Result<Json<MaintenanceSchedule>, ApiError> {
    let changes = changes.into_inner();
    require_non_blank_if_set("title", changes.title.as_deref())?;

    db.run(move |conn| {
        let existing = match get_maintenance_schedule(conn, schedule_id) {
            Ok(Some(s)) => s,
            Ok(None) => return Err(not_found("Maintenance schedule", schedule_id)),
            Err(e) => return Err(store_error("fetching maintenance schedule", e)),
        };
        require_building_access(conn, &staff.user, existing.building_id)?;
        update_maintenance_schedule(conn, schedule_id, changes)
            .map(Json)
            .map_err(|e| store_error("updating maintenance schedule", e))
    })
    .await
}

/// Delete Maintenance Schedule endpoint.
///
/// - **URL:** `/api/1/MaintenanceSchedules/<schedule_id>`
/// - **Method:** `DELETE`
/// - **Authorization:** companyAdministrator
#[delete("/1/MaintenanceSchedules/<schedule_id>")]
pub async fn delete_maintenance_schedule_endpoint(
    db: DbConn,
    schedule_id: i32,
    _admin: AdministratorUser,
) -> Result<Status, ApiError> {
    match db
        .run(move |conn| delete_maintenance_schedule(conn, schedule_id))
        .await
    {
        Ok(0) => Err(not_found("Maintenance schedule", schedule_id)),
        Ok(_) => Ok(Status::NoContent),
        Err(e) => Err(store_error("deleting maintenance schedule", e)),
    }
}

pub fn routes() -> Vec<Route> {
    routes![
        create_maintenance_schedule,
        list_due_maintenance,
        get_maintenance_schedule_endpoint,
        update_maintenance_schedule_endpoint,
        delete_maintenance_schedule_endpoint
    ]
}
