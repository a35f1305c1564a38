//! API endpoints for deviation reports.
//!
//! # Authorization Rules
//! - Anyone with access to a building can report a deviation against it
//! - The reporter, or staff with access to the building, can update it
//! - The reporter or an administrator can delete it
//! - Listings only include deviations of buildings visible to the caller

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;

use super::{
    ApiError, api_error, forbidden, not_found, require_building_access, require_non_blank,
    require_non_blank_if_set, require_target_building, store_error, value_list,
};
use crate::DbConn;
use crate::access::{can_view_building, visible_deviations};
use crate::logged_json::LoggedJson;
use crate::models::{
    Deviation, DeviationFilter, DeviationInput, DeviationPriority, DeviationStatus,
    DeviationUpdate,
};
use crate::orm::deviation::{delete_deviation, get_deviation, insert_deviation, update_deviation};
use crate::orm::user::get_user;
use crate::session_guards::AuthenticatedUser;

fn parse_param<T: std::str::FromStr<Err = String>>(
    raw: Option<&str>,
) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| api_error(Status::BadRequest, e)),
        None => Ok(None),
    }
}

/// Create Deviation endpoint.
///
/// - **URL:** `/api/1/Deviations`
/// - **Method:** `POST`
/// - **Authorization:** access to the target building
///
/// # Request Format
///
/// ```json
/// {
///   "title": "Emergency light out",
///   "description": "Stairwell B, level 3",
///   "building_id": 1,
///   "priority": "high",
///   "images": []
/// }
/// ```
///
/// The deviation starts in the `open` state.
#[post("/1/Deviations", data = "<new_deviation>")]
pub async fn create_deviation(
    db: DbConn,
    new_deviation: LoggedJson<DeviationInput>,
    auth_user: AuthenticatedUser,
) -> Result<status::Created<Json<Deviation>>, ApiError> {
    let input = new_deviation.into_inner();
    require_non_blank("title", &input.title)?;
    require_non_blank("description", &input.description)?;

    db.run(move |conn| {
        require_target_building(conn, &auth_user.user, input.building_id)?;
        insert_deviation(conn, input, auth_user.user.id)
            .map(|deviation| {
                status::Created::new(format!("/api/1/Deviations/{}", deviation.id))
                    .body(Json(deviation))
            })
            .map_err(|e| store_error("creating deviation", e))
    })
    .await
}

/// List Deviations endpoint.
///
/// - **URL:** `/api/1/Deviations?status=<status>&priority=<priority>&search=<text>&building_id=<id>`
/// - **Method:** `GET`
///
/// All query parameters are optional. `search` matches the title
/// case-insensitively.
#[get("/1/Deviations?<status>&<priority>&<search>&<building_id>")]
pub async fn list_deviations(
    db: DbConn,
    status: Option<&str>,
    priority: Option<&str>,
    search: Option<String>,
    building_id: Option<i32>,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = DeviationFilter {
        status: parse_param::<DeviationStatus>(status)?,
        priority: parse_param::<DeviationPriority>(priority)?,
        search,
        building_id,
    };

    db.run(move |conn| visible_deviations(conn, &auth_user.user))
        .await
        .map(|deviations| {
            value_list(
                deviations
                    .into_iter()
                    .filter(|d| filter.matches(d))
                    .collect(),
            )
        })
        .map_err(|e| store_error("listing deviations", e))
}

/// Get Deviation endpoint.
///
/// - **URL:** `/api/1/Deviations/<deviation_id>`
/// - **Method:** `GET`
/// - **Authorization:** access to the deviation's building
#[get("/1/Deviations/<deviation_id>")]
pub async fn get_deviation_endpoint(
    db: DbConn,
    deviation_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<Deviation>, ApiError> {
    db.run(move |conn| {
        let deviation = match get_deviation(conn, deviation_id) {
            Ok(Some(d)) => d,
            Ok(None) => return Err(not_found("Deviation", deviation_id)),
            Err(e) => return Err(store_error("fetching deviation", e)),
        };
        require_building_access(conn, &auth_user.user, deviation.building_id)?;
        Ok(Json(deviation))
    })
    .await
}

/// Update Deviation endpoint.
///
/// - **URL:** `/api/1/Deviations/<deviation_id>`
/// - **Method:** `PUT`
/// - **Authorization:** the reporter, or staff with access to the building
///
/// # Request Format
///
/// ```json
/// { "status": "resolved", "resolved_by": 4 }
/// ```
///
/// `resolved_at` is stamped, and `resolved_by` stored, only when the update
/// sets `status` to `resolved` and includes `resolved_by`. An unknown
/// `resolved_by` is rejected with 400.
#[put("/1/Deviations/<deviation_id>", data = "<changes>")]
pub async fn update_deviation_endpoint(
    db: DbConn,
    deviation_id: i32,
    changes: LoggedJson<DeviationUpdate>,
    auth_user: AuthenticatedUser,
) -> Result<Json<Deviation>, ApiError> {
    let changes = changes.into_inner();
    require_non_blank_if_set("title", changes.title.as_deref())?;
    require_non_blank_if_set("description", changes.description.as_deref())?;

    db.run(move |conn| {
        let existing = match get_deviation(conn, deviation_id) {
            Ok(Some(d)) => d,
            Ok(None) => return Err(not_found("Deviation", deviation_id)),
            Err(e) => return Err(store_error("fetching deviation", e)),
        };

        let allowed = existing.created_by == auth_user.user.id
            || (auth_user.is_staff()
                && can_view_building(conn, &auth_user.user, existing.building_id)
                    .map_err(|e| store_error("checking building access", e))?);
        if !allowed {
            return Err(forbidden(
                "Forbidden: only the reporter or building staff can update this deviation",
            ));
        }

        if let Some(resolver) = changes.resolved_by {
            match get_user(conn, resolver) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return Err(api_error(
                        Status::BadRequest,
                        format!("User with ID {} does not exist", resolver),
                    ));
                }
                Err(e) => return Err(store_error("fetching resolver", e)),
            }
        }

        update_deviation(conn, deviation_id, changes)
            .map(Json)
            .map_err(|e| store_error("updating deviation", e))
    })
    .await
}

/// Delete Deviation endpoint.
///
/// - **URL:** `/api/1/Deviations/<deviation_id>`
/// - **Method:** `DELETE`
/// - **Authorization:** the reporter or a companyAdministrator
#[delete("/1/Deviations/<deviation_id>")]
pub async fn delete_deviation_endpoint(
    db: DbConn,
    deviation_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Status, ApiError> {
    db.run(move |conn| {
        let existing = match get_deviation(conn, deviation_id) {
            Ok(Some(d)) => d,
            Ok(None) => return Err(not_found("Deviation", deviation_id)),
            Err(e) => return Err(store_error("fetching deviation", e)),
        };
        if existing.created_by != auth_user.user.id && !auth_user.is_administrator() {
            return Err(forbidden(
                "Forbidden: only the reporter or an administrator can delete this deviation",
            ));
        }
        delete_deviation(conn, deviation_id)
            .map(|_| Status::NoContent)
            .map_err(|e| store_error("deleting deviation", e))
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_deviation,
        list_deviations,
        get_deviation_endpoint,
        update_deviation_endpoint,
        delete_deviation_endpoint
    ]
}
