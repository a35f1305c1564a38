//! API endpoints for user management.
//!
//! # Authorization Rules
//! - Administrators can list, read, update and delete any user
//! - Any user can read and update their own profile, except for the role
//! - Grants and resolved buildings are visible to the user and administrators

use rocket::Route;
use rocket::http::Status;
use rocket::serde::json::Json;

use super::{
    ApiError, forbidden, not_found, require_non_blank_if_set, store_error, value_list,
};
use crate::DbConn;
use crate::logged_json::LoggedJson;
use crate::models::{User, UserUpdate};
use crate::orm::user::{delete_user, get_user, list_all_users, update_user};
use crate::resolver::{list_access_for_user, resolve_buildings_for_user};
use crate::session_guards::{AdministratorUser, AuthenticatedUser};

fn require_self_or_admin(auth_user: &AuthenticatedUser, user_id: i32) -> Result<(), ApiError> {
    if auth_user.is_administrator() || auth_user.user.id == user_id {
        Ok(())
    } else {
        Err(forbidden("Forbidden: can only access your own account"))
    }
}

/// List Users endpoint.
///
/// - **URL:** `/api/1/Users`
/// - **Method:** `GET`
/// - **Authorization:** companyAdministrator
#[get("/1/Users")]
pub async fn list_users(
    db: DbConn,
    _admin: AdministratorUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    db.run(list_all_users)
        .await
        .map(value_list)
        .map_err(|e| store_error("listing users", e))
}

/// Get User endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>`
/// - **Method:** `GET`
/// - **Authorization:** the user themself or a companyAdministrator
#[get("/1/Users/<user_id>")]
pub async fn get_user_endpoint(
    db: DbConn,
    user_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<User>, ApiError> {
    require_self_or_admin(&auth_user, user_id)?;
    match db.run(move |conn| get_user(conn, user_id)).await {
        Ok(Some(user)) => Ok(Json(user)),
        Ok(None) => Err(not_found("User", user_id)),
        Err(e) => Err(store_error("fetching user", e)),
    }
}

/// Update User endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>`
/// - **Method:** `PUT`
/// - **Authorization:** the user themself (profile fields only) or a
///   companyAdministrator (including `role`)
///
/// # Request Format
///
/// ```json
/// { "first_name": "Jane", "phone_number": "+47 555 0100", "role": "buildingWorker" }
/// ```
#[put("/1/Users/<user_id>", data = "<changes>")]
pub async fn update_user_endpoint(
    db: DbConn,
    user_id: i32,
    changes: LoggedJson<UserUpdate>,
    auth_user: AuthenticatedUser,
) -> Result<Json<User>, ApiError> {
    require_self_or_admin(&auth_user, user_id)?;
    let changes = changes.into_inner();
    if changes.role.is_some() && !auth_user.is_administrator() {
        return Err(forbidden("Forbidden: only administrators can change roles"));
    }
    require_non_blank_if_set("email", changes.email.as_deref())?;

    db.run(move |conn| update_user(conn, user_id, changes))
        .await
        .map(Json)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => not_found("User", user_id),
            other => store_error("updating user", other),
        })
}

/// Delete User endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>`
/// - **Method:** `DELETE`
/// - **Authorization:** companyAdministrator
///
/// Sessions of the user are removed with it. Buildings, grants and reports
/// referencing the user are kept.
#[delete("/1/Users/<user_id>")]
pub async fn delete_user_endpoint(
    db: DbConn,
    user_id: i32,
    _admin: AdministratorUser,
) -> Result<Status, ApiError> {
    match db.run(move |conn| delete_user(conn, user_id)).await {
        Ok(0) => Err(not_found("User", user_id)),
        Ok(_) => Ok(Status::NoContent),
        Err(e) => Err(store_error("deleting user", e)),
    }
}

/// Buildings resolved from the user's grants, in grant order.
///
/// - **URL:** `/api/1/Users/<user_id>/Buildings`
/// - **Method:** `GET`
#[get("/1/Users/<user_id>/Buildings")]
pub async fn list_user_buildings(
    db: DbConn,
    user_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_self_or_admin(&auth_user, user_id)?;
    db.run(move |conn| resolve_buildings_for_user(conn, user_id))
        .await
        .map(value_list)
        .map_err(|e| store_error("resolving buildings", e))
}

/// Raw grant rows held by the user.
///
/// - **URL:** `/api/1/Users/<user_id>/Access`
/// - **Method:** `GET`
#[get("/1/Users/<user_id>/Access")]
pub async fn list_user_access(
    db: DbConn,
    user_id: i32,
    auth_user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_self_or_admin(&auth_user, user_id)?;
    db.run(move |conn| list_access_for_user(conn, user_id))
        .await
        .map(value_list)
        .map_err(|e| store_error("listing grants", e))
}

pub fn routes() -> Vec<Route> {
    routes![
        list_users,
        get_user_endpoint,
        update_user_endpoint,
        delete_user_endpoint,
        list_user_buildings,
        list_user_access
    ]
}
