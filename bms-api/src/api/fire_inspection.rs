//! API endpoints for fire inspections.
//!
//! # Authorization Rules
//! - Staff with access to a building record and update its inspections
//! - Anyone with access to the building can read them
//! - Administrators delete inspections

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;

use super::{ApiError, not_found, require_building_access, require_target_building, store_error};
use crate::DbConn;
use crate::logged_json::LoggedJson;
use crate::models::{FireInspection, FireInspectionInput, FireInspectionUpdate};
use crate::orm::fire_inspection::{
    delete_fire_inspection, get_fire_inspection, insert_fire_inspection, update_fire_inspection,
};
use crate::session_guards::{AdministratorUser, AuthenticatedUser, StaffUser};

/// Create Fire Inspection endpoint.
///
/// - **URL:** `/api/1/FireInspections`
/// - **Method:** `POST`
/// - **Authorization:** staff with access to the building
///
/// # Request Format
///
/// ```json
/// {
///   "building_id": 1,
///   "inspection_date": "2025-03-01T09:00:00",
///   "notes": "Annual inspection",
///   "findings": [
///     { "category": "exits", "description": "Blocked door", "severity": "high", "action_required": true }
///   ]
/// }
/// ```
///
/// The caller is recorded as inspector. `status` defaults to `pending`.
#[post("/1/FireInspections", data = "<new_inspection>")]
pub async fn create_fire_inspection(
    db: DbConn,
    new_inspection: LoggedJson<FireInspectionInput>,
    staff: StaffUser,
) -> Result<status::Created<Json<FireInspection>>, ApiError> {
    let input = new_inspection.into_inner();
    db.run(move |conn| {
        require_target_building(conn, &staff.user, input.building_id)?;
        insert_fire_inspection(conn, input, staff.user.id)
            .map(|inspection| {
                status::Created::new(format!("/api/1/FireInspections/{}", inspection.id))
                    .body(Json(inspection))
            })
            .map_err(|e| store_error("creating fire inspection", e))
    })
    .await
}

/// Get Fire Inspection endpoint.
///
/// - **URL:** `/api/1/FireInspections/<inspection_id>`
/// - **Method:** `GET`
#[get("/1/FireInspections/<inspection_id>")]
pub async fn get_fire_inspection_endpoint(
    db: DbConn,
    inspection_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<FireInspection>, ApiError> {
    db.run(move |conn| {
        let inspection = match get_fire_inspection(conn, inspection_id) {
            Ok(Some(i)) => i,
            Ok(None) => return Err(not_found("Fire inspection", inspection_id)),
            Err(e) => return Err(store_error("fetching fire inspection", e)),
        };
        require_building_access(conn, &auth_user.user, inspection.building_id)?;
        Ok(Json(inspection))
    })
    .await
}

/// Update Fire Inspection endpoint.
///
/// - **URL:** `/api/1/FireInspections/<inspection_id>`
/// - **Method:** `PUT`
/// - **Authorization:** staff with access to the building
#[put("/1/FireInspections/<inspection_id>", data = "<changes>")]
pub async fn update_fire_inspection_endpoint(
    db: DbConn,
    inspection_id: i32,
    changes: LoggedJson<FireInspectionUpdate>,
    staff: StaffUser,
) -> Result<Json<FireInspection>, ApiError> {
    let changes = changes.into_inner();
    db.run(move |conn| {
        let existing = match get_fire_inspection(conn, inspection_id) {
            Ok(Some(i)) => i,
            Ok(None) => return Err(not_found("Fire inspection", inspection_id)),
            Err(e) => return Err(store_error("fetching fire inspection", e)),
        };
        require_building_access(conn, &staff.user, existing.building_id)?;
        update_fire_inspection(conn, inspection_id, changes)
            .map(Json)
            .map_err(|e| store_error("updating fire inspection", e))
    })
    .await
}

/// Delete Fire Inspection endpoint.
///
/// - **URL:** `/api/1/FireInspections/<inspection_id>`
/// - **Method:** `DELETE`
/// - **Authorization:** companyAdministrator
#[delete("/1/FireInspections/<inspection_id>")]
pub async fn delete_fire_inspection_endpoint(
    db: DbConn,
    inspection_id: i32,
    _admin: AdministratorUser,
) -> Result<Status, ApiError> {
    match db
        .run(move |conn| delete_fire_inspection(conn, inspection_id))
        .await
    {
        Ok(0) => Err(not_found("Fire inspection", inspection_id)),
        Ok(_) => Ok(Status::NoContent),
        Err(e) => Err(store_error("deleting fire inspection", e)),
    }
}

pub fn routes() -> Vec<Route> {
    routes![
        create_fire_inspection,
        get_fire_inspection_endpoint,
        update_fire_inspection_endpoint,
        delete_fire_inspection_endpoint
    ]
}
