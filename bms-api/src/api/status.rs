//! Unauthenticated health check.

use rocket::{Route, serde::json::Json};
use serde::Serialize;
use ts_rs::TS;

use crate::built_info;

#[derive(Serialize, TS)]
#[ts(export)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub built: &'static str,
    pub git_commit: Option<&'static str>,
}

/// Health Status endpoint.
///
/// - **URL:** `/api/1/status`
/// - **Method:** `GET`
/// - **Purpose:** Returns the health status of the application
/// - **Authentication:** None required
///
/// Always returns "running" along with the build that is serving.
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// {
///   "status": "running",
///   "version": "0.1.0",
///   "built": "Fri, 15 Aug 2025 18:13:43 +0000",
///   "git_commit": "cd51275141a2e7d49737aa7dd4e8ff7c9a804d67"
/// }
/// ```
///
/// # Returns
/// A JSON response containing the application's health status
#[rocket::get("/1/status")]
pub fn health_status() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        built: built_info::BUILT_TIME_UTC,
        git_commit: built_info::GIT_COMMIT_HASH,
    })
}

pub fn routes() -> Vec<Route> {
    routes![health_status]
}
