//! Summary counts for the caller's landing page.

use rocket::Route;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ApiError, store_error};
use crate::DbConn;
use crate::access::{visible_buildings, visible_deviations};
use crate::models::{Deviation, DeviationPriority, DeviationStatus};
use crate::session_guards::AuthenticatedUser;

#[derive(Debug, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub building_count: usize,
    /// Deviations whose status is `open`
    pub open_deviation_count: usize,
    /// Deviations with `critical` priority, whatever their status
    pub critical_deviation_count: usize,
}

impl DashboardSummary {
    pub fn from_visible(building_count: usize, deviations: &[Deviation]) -> Self {
        DashboardSummary {
            building_count,
            open_deviation_count: deviations
                .iter()
                .filter(|d| d.status == DeviationStatus::Open)
                .count(),
            critical_deviation_count: deviations
                .iter()
                .filter(|d| d.priority == DeviationPriority::Critical)
                .count(),
        }
    }
}

/// Dashboard endpoint.
///
/// - **URL:** `/api/1/Dashboard`
/// - **Method:** `GET`
///
/// Counts cover only the buildings and deviations visible to the caller.
#[get("/1/Dashboard")]
pub async fn dashboard(
    db: DbConn,
    auth_user: AuthenticatedUser,
) -> Result<Json<DashboardSummary>, ApiError> {
    db.run(move |conn| {
        let buildings = visible_buildings(conn, &auth_user.user)?;
        let deviations = visible_deviations(conn, &auth_user.user)?;
        Ok(DashboardSummary::from_visible(buildings.len(), &deviations))
    })
    .await
    .map(Json)
    .map_err(|e| store_error("building dashboard", e))
}

pub fn routes() -> Vec<Route> {
    routes![dashboard]
}
