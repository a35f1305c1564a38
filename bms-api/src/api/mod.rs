//! HTTP surface mounted under `/api`.
//!
//! Handlers share the error shape and helpers defined here. Lists are
//! returned as `{"value": [...]}`.

use diesel::SqliteConnection;
use rocket::Route;
use rocket::http::Status;
use rocket::response;
use rocket::serde::json::Json;
use serde::Serialize;
use ts_rs::TS;

use crate::access::can_view_building;
use crate::models::User;
use crate::orm::building::get_building;

pub mod building;
pub mod dashboard;
pub mod deviation;
pub mod fire_inspection;
pub mod login;
pub mod maintenance_schedule;
pub mod status;
pub mod substance;
pub mod user;

/// Error body returned by every handler failure.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = response::status::Custom<Json<ErrorResponse>>;

pub(crate) fn api_error(status: Status, message: impl Into<String>) -> ApiError {
    response::status::Custom(
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn forbidden(message: impl Into<String>) -> ApiError {
    api_error(Status::Forbidden, message)
}

pub(crate) fn not_found(what: &str, id: i32) -> ApiError {
    api_error(Status::NotFound, format!("{} {} not found", what, id))
}

/// Logs a store failure and maps it to a response.
///
/// `NotFound` raised by an update becomes 404; anything else is a 500 with
/// a generic message.
pub(crate) fn store_error(action: &str, e: diesel::result::Error) -> ApiError {
    match e {
        diesel::result::Error::NotFound => {
            api_error(Status::NotFound, format!("Not found while {}", action))
        }
        other => {
            error!("Database error while {}: {:?}", action, other);
            api_error(
                Status::InternalServerError,
                format!("Internal server error while {}", action),
            )
        }
    }
}

/// Rejects blank required strings with 400.
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(api_error(
            Status::BadRequest,
            format!("{} must not be empty", field),
        ));
    }
    Ok(())
}

/// Like [`require_non_blank`] for optional patch fields.
pub(crate) fn require_non_blank_if_set(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(v) => require_non_blank(field, v),
        None => Ok(()),
    }
}

/// Fails with 403 unless `user` may see `building_id`.
pub(crate) fn require_building_access(
    conn: &mut SqliteConnection,
    user: &User,
    building_id: i32,
) -> Result<(), ApiError> {
    match can_view_building(conn, user, building_id) {
        Ok(true) => Ok(()),
        Ok(false) => Err(forbidden("Forbidden: no access to this building")),
        Err(e) => Err(store_error("checking building access", e)),
    }
}

/// Checks that a building named in a request body exists (400 otherwise)
/// and that `user` may see it (403 otherwise).
pub(crate) fn require_target_building(
    conn: &mut SqliteConnection,
    user: &User,
    building_id: i32,
) -> Result<(), ApiError> {
    match get_building(conn, building_id) {
        Ok(Some(_)) => require_building_access(conn, user, building_id),
        Ok(None) => Err(api_error(
            Status::BadRequest,
            format!("Building with ID {} does not exist", building_id),
        )),
        Err(e) => Err(store_error("validating building", e)),
    }
}

/// Wraps a list in the `{"value": [...]}` envelope.
pub(crate) fn value_list<T: Serialize>(items: Vec<T>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "value": items }))
}

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(building::routes());
    routes.extend(dashboard::routes());
    routes.extend(deviation::routes());
    routes.extend(fire_inspection::routes());
    routes.extend(login::routes());
    routes.extend(maintenance_schedule::routes());
    routes.extend(status::routes());
    routes.extend(substance::routes());
    routes.extend(user::routes());
    routes
}
