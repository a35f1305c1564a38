//! API endpoints for buildings and building access grants.
//!
//! # Authorization Rules
//! - Administrators create, update and delete buildings and manage grants
//! - Everyone else sees the buildings they hold a grant for, together with
//!   the substances, deviations, inspections and schedules of those buildings

use diesel::SqliteConnection;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{
    ApiError, api_error, not_found, require_building_access, require_non_blank,
    require_non_blank_if_set, store_error, value_list,
};
use crate::DbConn;
use crate::access::visible_buildings;
use crate::logged_json::LoggedJson;
use crate::models::{Building, BuildingAccess, BuildingInput, BuildingUpdate, User};
use crate::orm::building::{delete_building, get_building, insert_building, update_building};
use crate::orm::deviation::list_deviations_for_buildings;
use crate::orm::fire_inspection::list_fire_inspections_for_building;
use crate::orm::maintenance_schedule::list_maintenance_schedules_for_building;
use crate::orm::user::get_user;
use crate::resolver::{
    grant_access, list_access_for_building, resolve_substances_for_building, revoke_access,
};
use crate::session_guards::{AdministratorUser, AuthenticatedUser};

/// Request payload for granting a user access to a building
#[derive(Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct GrantAccessRequest {
    pub user_id: i32,
}

/// Loads a building the caller may see: 404 when missing, 403 without a
/// grant.
pub(crate) fn load_visible_building(
    conn: &mut SqliteConnection,
    user: &User,
    building_id: i32,
) -> Result<Building, ApiError> {
    let building = match get_building(conn, building_id) {
        Ok(Some(building)) => building,
        Ok(None) => return Err(not_found("Building", building_id)),
        Err(e) => return Err(store_error("fetching building", e)),
    };
    require_building_access(conn, user, building_id)?;
    Ok(building)
}

/// Create Building endpoint.
///
/// - **URL:** `/api/1/Buildings`
/// - **Method:** `POST`
/// - **Authorization:** companyAdministrator
///
/// # Request Format
///
/// ```json
/// { "name": "Harbour House", "description": "Head office", "image_url": null }
/// ```
///
/// **Success (HTTP 201 Created):** the stored building.
#[post("/1/Buildings", data = "<new_building>")]
pub async fn create_building(
    db: DbConn,
    new_building: LoggedJson<BuildingInput>,
    admin: AdministratorUser,
) -> Result<status::Created<Json<Building>>, ApiError> {
    let input = new_building.into_inner();
    require_non_blank("name", &input.name)?;

    db.run(move |conn| insert_building(conn, input, admin.user.id))
        .await
        .map(|building| {
            status::Created::new(format!("/api/1/Buildings/{}", building.id)).body(Json(building))
        })
        .map_err(|e| store_error("creating building", e))
}

/// List Buildings endpoint.
///
/// - **URL:** `/api/1/Buildings`
/// - **Method:** `GET`
///
/// Administrators get every building; other users get the buildings they
/// hold grants for.
#[get("/1/Buildings")]
pub async fn list_buildings(
    db: DbConn,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.run(move |conn| visible_buildings(conn, &auth_user.user))
        .await
        .map(value_list)
        .map_err(|e| store_error("listing buildings", e))
}

/// Get Building endpoint.
///
/// - **URL:** `/api/1/Buildings/<building_id>`
/// - **Method:** `GET`
#[get("/1/Buildings/<building_id>")]
pub async fn get_building_endpoint(
    db: DbConn,
    building_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<Building>, ApiError> {
    db.run(move |conn| load_visible_building(conn, &auth_user.user, building_id))
        .await
        .map(Json)
}

/// Update Building endpoint.
///
/// - **URL:** `/api/1/Buildings/<building_id>`
/// - **Method:** `PUT`
/// - **Authorization:** companyAdministrator
#[put("/1/Buildings/<building_id>", data = "<changes>")]
pub async fn update_building_endpoint(
    db: DbConn,
    building_id: i32,
    changes: LoggedJson<BuildingUpdate>,
    _admin: AdministratorUser,
) -> Result<Json<Building>, ApiError> {
    let changes = changes.into_inner();
    require_non_blank_if_set("name", changes.name.as_deref())?;

    db.run(move |conn| update_building(conn, building_id, changes))
        .await
        .map(Json)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => not_found("Building", building_id),
            other => store_error("updating building", other),
        })
}

/// Delete Building endpoint.
///
/// - **URL:** `/api/1/Buildings/<building_id>`
/// - **Method:** `DELETE`
/// - **Authorization:** companyAdministrator
///
/// Rows referencing the building (grants, substance associations,
/// deviations, inspections, schedules) are not removed.
#[delete("/1/Buildings/<building_id>")]
pub async fn delete_building_endpoint(
    db: DbConn,
    building_id: i32,
    _admin: AdministratorUser,
) -> Result<Status, ApiError> {
    match db.run(move |conn| delete_building(conn, building_id)).await {
        Ok(0) => Err(not_found("Building", building_id)),
        Ok(_) => Ok(Status::NoContent),
        Err(e) => Err(store_error("deleting building", e)),
    }
}

/// Grant Access endpoint.
///
/// - **URL:** `/api/1/Buildings/<building_id>/Access`
/// - **Method:** `POST`
/// - **Authorization:** companyAdministrator
///
/// Always inserts a new grant, even if the user already holds one for this
/// building.
#[post("/1/Buildings/<building_id>/Access", data = "<request>")]
pub async fn grant_building_access(
    db: DbConn,
    building_id: i32,
    request: LoggedJson<GrantAccessRequest>,
    admin: AdministratorUser,
) -> Result<status::Created<Json<BuildingAccess>>, ApiError> {
    let grantee = request.user_id;
    db.run(move |conn| {
        match get_building(conn, building_id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(not_found("Building", building_id)),
            Err(e) => return Err(store_error("fetching building", e)),
        }
        match get_user(conn, grantee) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(api_error(
                    Status::BadRequest,
                    format!("User with ID {} does not exist", grantee),
                ));
            }
            Err(e) => return Err(store_error("validating user", e)),
        }
        grant_access(conn, grantee, building_id, admin.user.id)
            .map(|grant| {
                info!(
                    "User {} granted user {} access to building {}",
                    admin.user.id, grantee, building_id
                );
                status::Created::new(format!("/api/1/Buildings/{}/Access", building_id))
                    .body(Json(grant))
            })
            .map_err(|e| store_error("granting access", e))
    })
    .await
}

/// Revoke Access endpoint.
///
/// - **URL:** `/api/1/Buildings/<building_id>/Access/<user_id>`
/// - **Method:** `DELETE`
/// - **Authorization:** companyAdministrator
///
/// Removes one grant per call. Returns 204 whether or not a grant matched.
#[delete("/1/Buildings/<building_id>/Access/<user_id>")]
pub async fn revoke_building_access(
    db: DbConn,
    building_id: i32,
    user_id: i32,
    _admin: AdministratorUser,
) -> Result<Status, ApiError> {
    db.run(move |conn| revoke_access(conn, user_id, building_id))
        .await
        .map(|_| Status::NoContent)
        .map_err(|e| store_error("revoking access", e))
}

/// List the grant rows naming a building.
///
/// - **URL:** `/api/1/Buildings/<building_id>/Access`
/// - **Method:** `GET`
/// - **Authorization:** companyAdministrator
#[get("/1/Buildings/<building_id>/Access")]
pub async fn list_building_access(
    db: DbConn,
    building_id: i32,
    _admin: AdministratorUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.run(move |conn| list_access_for_building(conn, building_id))
        .await
        .map(value_list)
        .map_err(|e| store_error("listing grants", e))
}

/// Substances present in a building, including those flagged for every
/// building.
///
/// - **URL:** `/api/1/Buildings/<building_id>/Substances`
/// - **Method:** `GET`
#[get("/1/Buildings/<building_id>/Substances")]
pub async fn list_building_substances(
    db: DbConn,
    building_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.run(move |conn| {
        load_visible_building(conn, &auth_user.user, building_id)?;
        resolve_substances_for_building(conn, building_id)
            .map(value_list)
            .map_err(|e| store_error("resolving substances", e))
    })
    .await
}

/// Deviations reported against a building, newest first.
///
/// - **URL:** `/api/1/Buildings/<building_id>/Deviations`
/// - **Method:** `GET`
#[get("/1/Buildings/<building_id>/Deviations")]
pub async fn list_building_deviations(
    db: DbConn,
    building_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.run(move |conn| {
        load_visible_building(conn, &auth_user.user, building_id)?;
        list_deviations_for_buildings(conn, &[building_id])
            .map(value_list)
            .map_err(|e| store_error("listing deviations", e))
    })
    .await
}

/// Fire inspections of a building, most recent first.
///
/// - **URL:** `/api/1/Buildings/<building_id>/FireInspections`
/// - **Method:** `GET`
#[get("/1/Buildings/<building_id>/FireInspections")]
pub async fn list_building_fire_inspections(
    db: DbConn,
    building_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.run(move |conn| {
        load_visible_building(conn, &auth_user.user, building_id)?;
        list_fire_inspections_for_building(conn, building_id)
            .map(value_list)
            .map_err(|e| store_error("listing fire inspections", e))
    })
    .await
}

/// Maintenance schedules of a building, by next due date.
///
/// - **URL:** `/api/1/Buildings/<building_id>/MaintenanceSchedules`
/// - **Method:** `GET`
#[get("/1/Buildings/<building_id>/MaintenanceSchedules")]
pub async fn list_building_maintenance_schedules(
    db: DbConn,
    building_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.run(move |conn| {
        load_visible_building(conn, &auth_user.user, building_id)?;
        list_maintenance_schedules_for_building(conn, building_id)
            .map(value_list)
            .map_err(|e| store_error("listing maintenance schedules", e))
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_building,
        list_buildings,
        get_building_endpoint,
        update_building_endpoint,
        delete_building_endpoint,
        grant_building_access,
        revoke_building_access,
        list_building_access,
        list_building_substances,
        list_building_deviations,
        list_building_fire_inspections,
        list_building_maintenance_schedules
    ]
}
