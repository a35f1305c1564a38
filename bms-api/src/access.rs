//! Capability checks applied before any building-scoped read or write.
//!
//! Company administrators see everything. Every other role is limited to the
//! buildings named by its grants.

use std::collections::HashSet;

use diesel::prelude::*;

use crate::models::{Building, Deviation, User};
use crate::orm::building::list_all_buildings;
use crate::orm::deviation::{list_all_deviations, list_deviations_for_buildings};
use crate::resolver::resolve_buildings_for_user;

/// Whether `user` may see building `building`.
pub fn can_view_building(
    conn: &mut SqliteConnection,
    user: &User,
    building: i32,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::building_access::dsl::*;

    if user.role.is_administrator() {
        return Ok(true);
    }
    diesel::select(diesel::dsl::exists(
        building_access
            .filter(user_id.eq(user.id))
            .filter(building_id.eq(building)),
    ))
    .get_result(conn)
}

/// Buildings visible to `user`, each listed once.
pub fn visible_buildings(
    conn: &mut SqliteConnection,
    user: &User,
) -> Result<Vec<Building>, diesel::result::Error> {
    if user.role.is_administrator() {
        return list_all_buildings(conn);
    }
    let mut seen = HashSet::new();
    let mut buildings = resolve_buildings_for_user(conn, user.id)?;
    buildings.retain(|b| seen.insert(b.id));
    Ok(buildings)
}

/// Ids of the buildings visible to `user`, or `None` when every building is.
pub fn visible_building_ids(
    conn: &mut SqliteConnection,
    user: &User,
) -> Result<Option<Vec<i32>>, diesel::result::Error> {
    if user.role.is_administrator() {
        return Ok(None);
    }
    Ok(Some(
        visible_buildings(conn, user)?
            .into_iter()
            .map(|b| b.id)
            .collect(),
    ))
}

/// Deviations reported against buildings visible to `user`, newest first.
pub fn visible_deviations(
    conn: &mut SqliteConnection,
    user: &User,
) -> Result<Vec<Deviation>, diesel::result::Error> {
    match visible_building_ids(conn, user)? {
        None => list_all_deviations(conn),
        Some(ids) => list_deviations_for_buildings(conn, &ids),
    }
}
