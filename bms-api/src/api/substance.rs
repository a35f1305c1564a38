//! API endpoints for the hazardous substance catalog and its building
//! associations.
//!
//! # Authorization Rules
//! - Any authenticated user can read the catalog
//! - Staff (building workers and administrators) maintain the catalog
//! - Staff with access to a building can associate substances with it
//! - Only administrators can associate a substance with every building

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{
    ApiError, forbidden, not_found, require_building_access, require_non_blank,
    require_non_blank_if_set, require_target_building, store_error, value_list,
};
use crate::DbConn;
use crate::logged_json::LoggedJson;
use crate::models::{BuildingSubstance, Substance, SubstanceInput, SubstanceUpdate};
use crate::orm::substance::{
    delete_substance, get_substance, insert_substance, list_all_substances, update_substance,
};
use crate::resolver::{assign_substance, find_substance_assignment, unassign_substance};
use crate::session_guards::{AuthenticatedUser, StaffUser};

/// Request payload for associating a substance with a building
#[derive(Debug, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct AssignSubstanceRequest {
    pub building_id: i32,
    /// When set, the substance is present in every building and
    /// `building_id` is only recorded.
    #[serde(default)]
    pub is_for_all_buildings: bool,
}

/// Create Substance endpoint.
///
/// - **URL:** `/api/1/Substances`
/// - **Method:** `POST`
/// - **Authorization:** staff
///
/// # Request Format
///
/// ```json
/// { "name": "Acetone", "description": "Solvent", "files": ["sds/acetone.pdf"] }
/// ```
#[post("/1/Substances", data = "<new_substance>")]
pub async fn create_substance(
    db: DbConn,
    new_substance: LoggedJson<SubstanceInput>,
    staff: StaffUser,
) -> Result<status::Created<Json<Substance>>, ApiError> {
    let input = new_substance.into_inner();
    require_non_blank("name", &input.name)?;

    db.run(move |conn| insert_substance(conn, input, staff.user.id))
        .await
        .map(|substance| {
            status::Created::new(format!("/api/1/Substances/{}", substance.id))
                .body(Json(substance))
        })
        .map_err(|e| store_error("creating substance", e))
}

/// List Substances endpoint.
///
/// - **URL:** `/api/1/Substances`
/// - **Method:** `GET`
#[get("/1/Substances")]
pub async fn list_substances(
    db: DbConn,
    _auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.run(list_all_substances)
        .await
        .map(value_list)
        .map_err(|e| store_error("listing substances", e))
}

/// Get Substance endpoint.
///
/// - **URL:** `/api/1/Substances/<substance_id>`
/// - **Method:** `GET`
#[get("/1/Substances/<substance_id>")]
pub async fn get_substance_endpoint(
    db: DbConn,
    substance_id: i32,
    _auth_user: AuthenticatedUser,
) -> Result<Json<Substance>, ApiError> {
    match db.run(move |conn| get_substance(conn, substance_id)).await {
        Ok(Some(substance)) => Ok(Json(substance)),
        Ok(None) => Err(not_found("Substance", substance_id)),
        Err(e) => Err(store_error("fetching substance", e)),
    }
}

/// Update Substance endpoint.
///
/// - **URL:** `/api/1/Substances/<substance_id>`
/// - **Method:** `PUT`
/// - **Authorization:** staff
#[put("/1/Substances/<substance_id>", data = "<changes>")]
pub async fn update_substance_endpoint(
    db: DbConn,
    substance_id: i32,
    changes: LoggedJson<SubstanceUpdate>,
    _staff: StaffUser,
) -> Result<Json<Substance>, ApiError> {
    let changes = changes.into_inner();
    require_non_blank_if_set("name", changes.name.as_deref())?;

    db.run(move |conn| update_substance(conn, substance_id, changes))
        .await
        .map(Json)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => not_found("Substance", substance_id),
            other => store_error("updating substance", other),
        })
}

/// Delete Substance endpoint.
///
/// - **URL:** `/api/1/Substances/<substance_id>`
/// - **Method:** `DELETE`
/// - **Authorization:** staff
///
/// Building associations of the substance are left in place.
#[delete("/1/Substances/<substance_id>")]
pub async fn delete_substance_endpoint(
    db: DbConn,
    substance_id: i32,
    _staff: StaffUser,
) -> Result<Status, ApiError> {
    match db.run(move |conn| delete_substance(conn, substance_id)).await {
        Ok(0) => Err(not_found("Substance", substance_id)),
        Ok(_) => Ok(Status::NoContent),
        Err(e) => Err(store_error("deleting substance", e)),
    }
}

/// Associate a substance with a building or with every building.
///
/// - **URL:** `/api/1/Substances/<substance_id>/Buildings`
/// - **Method:** `POST`
/// - **Authorization:** staff with access to the building; administrators
///   only when `is_for_all_buildings` is set
///
/// Existing associations are not checked; repeating the call adds a row.
#[post("/1/Substances/<substance_id>/Buildings", data = "<request>")]
pub async fn assign_substance_endpoint(
    db: DbConn,
    substance_id: i32,
    request: LoggedJson<AssignSubstanceRequest>,
    staff: StaffUser,
) -> Result<status::Created<Json<BuildingSubstance>>, ApiError> {
    let request = request.into_inner();
    if request.is_for_all_buildings && !staff.user.role.is_administrator() {
        return Err(forbidden(
            "Forbidden: only administrators can assign a substance to all buildings",
        ));
    }

    db.run(move |conn| {
        match get_substance(conn, substance_id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(not_found("Substance", substance_id)),
            Err(e) => return Err(store_error("fetching substance", e)),
        }
        if !request.is_for_all_buildings {
            require_target_building(conn, &staff.user, request.building_id)?;
        }
        assign_substance(
            conn,
            request.building_id,
            substance_id,
            request.is_for_all_buildings,
            staff.user.id,
        )
        .map(|row| {
            status::Created::new(format!("/api/1/Substances/{}/Buildings", substance_id))
                .body(Json(row))
        })
        .map_err(|e| store_error("assigning substance", e))
    })
    .await
}

/// Remove one association of a substance with a building.
///
/// - **URL:** `/api/1/Substances/<substance_id>/Buildings/<building_id>`
/// - **Method:** `DELETE`
/// - **Authorization:** staff with access to the building; administrators
///   only when the row to remove applies to all buildings
///
/// Returns 204 whether or not an association matched.
#[delete("/1/Substances/<substance_id>/Buildings/<building_id>")]
pub async fn unassign_substance_endpoint(
    db: DbConn,
    substance_id: i32,
    building_id: i32,
    staff: StaffUser,
) -> Result<Status, ApiError> {
    db.run(move |conn| {
        require_building_access(conn, &staff.user, building_id)?;
        match find_substance_assignment(conn, building_id, substance_id) {
            Ok(Some(row)) if row.is_for_all_buildings && !staff.user.role.is_administrator() => {
                return Err(forbidden(
                    "Forbidden: only administrators can remove a substance from all buildings",
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(store_error("fetching substance assignment", e)),
        }
        unassign_substance(conn, building_id, substance_id)
            .map(|_| Status::NoContent)
            .map_err(|e| store_error("unassigning substance", e))
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_substance,
        list_substances,
        get_substance_endpoint,
        update_substance_endpoint,
        delete_substance_endpoint,
        assign_substance_endpoint,
        unassign_substance_endpoint
    ]
}
