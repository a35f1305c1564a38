//! Resolution of grant and association rows into effective visibility sets.
//!
//! A user sees the buildings named by their `building_access` rows. A
//! building carries the substances associated with it directly plus every
//! substance associated with all buildings. Rows pointing at buildings or
//! substances that no longer exist are skipped, as are point lookups that
//! fail; neither is reported to the caller.

use chrono::Utc;
use diesel::prelude::*;

use crate::models::{
    Building, BuildingAccess, BuildingSubstance, NewBuildingAccess, NewBuildingSubstance,
    Substance,
};
use crate::orm::building::get_building;
use crate::orm::last_insert_rowid;
use crate::orm::substance::get_substance;

/// Point lookup that treats a failed read the same as a missing row.
fn lookup_or_skip<T>(
    kind: &str,
    id: i32,
    found: Result<Option<T>, diesel::result::Error>,
) -> Option<T> {
    match found {
        Ok(row) => row,
        Err(e) => {
            warn!("Skipping {} {} after lookup failure: {:?}", kind, id, e);
            None
        }
    }
}

/// Raw grant rows held by a user, oldest first.
pub fn list_access_for_user(
    conn: &mut SqliteConnection,
    user: i32,
) -> Result<Vec<BuildingAccess>, diesel::result::Error> {
    use crate::schema::building_access::dsl::*;
    building_access
        .filter(user_id.eq(user))
        .order(id.asc())
        .select(BuildingAccess::as_select())
        .load(conn)
}

/// Raw grant rows naming a building, oldest first.
pub fn list_access_for_building(
    conn: &mut SqliteConnection,
    building: i32,
) -> Result<Vec<BuildingAccess>, diesel::result::Error> {
    use crate::schema::building_access::dsl::*;
    building_access
        .filter(building_id.eq(building))
        .order(id.asc())
        .select(BuildingAccess::as_select())
        .load(conn)
}

/// Buildings a user has been granted, in grant order.
///
/// A user without grants, or an unknown user id, yields an empty list.
/// Repeated grants for the same building yield repeated entries.
pub fn resolve_buildings_for_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Vec<Building>, diesel::result::Error> {
    let grants = list_access_for_user(conn, user_id)?;
    Ok(grants
        .into_iter()
        .filter_map(|grant| {
            let found = get_building(conn, grant.building_id);
            lookup_or_skip("building", grant.building_id, found)
        })
        .collect())
}

/// Substances present in a building.
///
/// Rows carrying this building id come first, followed by every row flagged
/// for all buildings. Nothing is deduplicated: a substance matched by both
/// scans appears once per matching row, including a global row whose own
/// building id is this building.
pub fn resolve_substances_for_building(
    conn: &mut SqliteConnection,
    building: i32,
) -> Result<Vec<Substance>, diesel::result::Error> {
    use crate::schema::building_substances::dsl::*;

    let specific: Vec<i32> = building_substances
        .filter(building_id.eq(building))
        .order(id.asc())
        .select(substance_id)
        .load(conn)?;
    let global: Vec<i32> = building_substances
        .filter(is_for_all_buildings.eq(true))
        .order(id.asc())
        .select(substance_id)
        .load(conn)?;

    Ok(specific
        .into_iter()
        .chain(global)
        .filter_map(|sid| {
            let found = get_substance(conn, sid);
            lookup_or_skip("substance", sid, found)
        })
        .collect())
}

/// Records a grant. Existing grants for the same pair are not checked.
pub fn grant_access(
    conn: &mut SqliteConnection,
    user: i32,
    building: i32,
    granter: i32,
) -> Result<BuildingAccess, diesel::result::Error> {
    use crate::schema::building_access::dsl::*;

    let new_grant = NewBuildingAccess {
        user_id: user,
        building_id: building,
        granted_by: granter,
        granted_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(building_access)
        .values(&new_grant)
        .execute(conn)?;

    let last_id = last_insert_rowid(conn)?;
    building_access
        .filter(id.eq(last_id))
        .select(BuildingAccess::as_select())
        .first(conn)
}

/// Removes one grant for the pair, the oldest if several exist.
///
/// # Returns
/// * `Ok(1)` - A grant was removed
/// * `Ok(0)` - No grant matched
pub fn revoke_access(
    conn: &mut SqliteConnection,
    user: i32,
    building: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::building_access::dsl::*;

    let first_match: Option<i32> = building_access
        .filter(user_id.eq(user))
        .filter(building_id.eq(building))
        .order(id.asc())
        .select(id)
        .first(conn)
        .optional()?;

    match first_match {
        Some(grant_id) => diesel::delete(building_access.filter(id.eq(grant_id))).execute(conn),
        None => Ok(0),
    }
}

/// Associates a substance with a building, or with every building when
/// `for_all_buildings` is set. Existing associations are not checked.
pub fn assign_substance(
    conn: &mut SqliteConnection,
    building: i32,
    substance: i32,
    for_all_buildings: bool,
    adder: i32,
) -> Result<BuildingSubstance, diesel::result::Error> {
    use crate::schema::building_substances::dsl::*;

    let new_row = NewBuildingSubstance {
        building_id: building,
        substance_id: substance,
        is_for_all_buildings: for_all_buildings,
        added_by: adder,
        added_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(building_substances)
        .values(&new_row)
        .execute(conn)?;

    let last_id = last_insert_rowid(conn)?;
    building_substances
        .filter(id.eq(last_id))
        .select(BuildingSubstance::as_select())
        .first(conn)
}

/// The association row `unassign_substance` would remove for the pair: the
/// oldest one, if any.
pub fn find_substance_assignment(
    conn: &mut SqliteConnection,
    building: i32,
    substance: i32,
) -> Result<Option<BuildingSubstance>, diesel::result::Error> {
    use crate::schema::building_substances::dsl::*;

    building_substances
        .filter(building_id.eq(building))
        .filter(substance_id.eq(substance))
        .order(id.asc())
        .select(BuildingSubstance::as_select())
        .first(conn)
        .optional()
}

/// Removes one association row for the pair, the oldest if several exist.
pub fn unassign_substance(
    conn: &mut SqliteConnection,
    building: i32,
    substance: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::building_substances::dsl::*;

    match find_substance_assignment(conn, building, substance)? {
        Some(row) => diesel::delete(building_substances.filter(id.eq(row.id))).execute(conn),
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildingInput, SubstanceInput, UserRole};
    use crate::orm::building::{delete_building, insert_building};
    use crate::orm::substance::{delete_substance, insert_substance};
    use crate::orm::testing::{insert_test_user, setup_test_db};

    fn building(conn: &mut SqliteConnection, name: &str, creator: i32) -> Building {
        insert_building(
            conn,
            BuildingInput {
                name: name.to_string(),
                description: None,
                image_url: None,
            },
            creator,
        )
        .unwrap()
    }

    fn substance(conn: &mut SqliteConnection, name: &str, creator: i32) -> Substance {
        insert_substance(
            conn,
            SubstanceInput {
                name: name.to_string(),
                description: None,
                files: Vec::new(),
            },
            creator,
        )
        .unwrap()
    }

    fn ids<T, F: Fn(&T) -> i32>(items: &[T], key: F) -> Vec<i32> {
        items.iter().map(key).collect()
    }

    #[test]
    fn test_user_without_grants_sees_nothing() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let occupant = insert_test_user(&mut conn, "idp|occupant", UserRole::Occupant);
        building(&mut conn, "Unshared", admin.id);

        assert!(resolve_buildings_for_user(&mut conn, occupant.id).unwrap().is_empty());
        assert!(resolve_buildings_for_user(&mut conn, 12345).unwrap().is_empty());
    }

    #[test]
    fn test_grants_resolve_in_grant_order() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let occupant = insert_test_user(&mut conn, "idp|occupant", UserRole::Occupant);
        let b1 = building(&mut conn, "B1", admin.id);
        let b2 = building(&mut conn, "B2", admin.id);
        building(&mut conn, "B3", admin.id);

        grant_access(&mut conn, occupant.id, b2.id, admin.id).unwrap();
        grant_access(&mut conn, occupant.id, b1.id, admin.id).unwrap();

        let visible = resolve_buildings_for_user(&mut conn, occupant.id).unwrap();
        assert_eq!(ids(&visible, |b| b.id), vec![b2.id, b1.id]);
    }

    #[test]
    fn test_orphaned_grant_is_skipped() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let occupant = insert_test_user(&mut conn, "idp|occupant", UserRole::Occupant);
        let kept = building(&mut conn, "Kept", admin.id);
        let removed = building(&mut conn, "Removed", admin.id);
        grant_access(&mut conn, occupant.id, kept.id, admin.id).unwrap();
        grant_access(&mut conn, occupant.id, removed.id, admin.id).unwrap();

        delete_building(&mut conn, removed.id).unwrap();

        // The grant row outlives the building
        assert_eq!(list_access_for_user(&mut conn, occupant.id).unwrap().len(), 2);
        let visible = resolve_buildings_for_user(&mut conn, occupant.id).unwrap();
        assert_eq!(ids(&visible, |b| b.id), vec![kept.id]);
    }

    #[test]
    fn test_duplicate_grants_revoke_one_at_a_time() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let occupant = insert_test_user(&mut conn, "idp|occupant", UserRole::Occupant);
        let b1 = building(&mut conn, "B1", admin.id);

        let first = grant_access(&mut conn, occupant.id, b1.id, admin.id).unwrap();
        let second = grant_access(&mut conn, occupant.id, b1.id, admin.id).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(resolve_buildings_for_user(&mut conn, occupant.id).unwrap().len(), 2);

        assert_eq!(revoke_access(&mut conn, occupant.id, b1.id).unwrap(), 1);
        let remaining = list_access_for_building(&mut conn, b1.id).unwrap();
        assert_eq!(ids(&remaining, |g| g.id), vec![second.id]);

        assert_eq!(revoke_access(&mut conn, occupant.id, b1.id).unwrap(), 1);
        assert_eq!(revoke_access(&mut conn, occupant.id, b1.id).unwrap(), 0);
        assert!(list_access_for_user(&mut conn, occupant.id).unwrap().is_empty());
    }

    #[test]
    fn test_revoke_only_touches_matching_building() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let occupant = insert_test_user(&mut conn, "idp|occupant", UserRole::Occupant);
        let b1 = building(&mut conn, "B1", admin.id);
        let b2 = building(&mut conn, "B2", admin.id);
        grant_access(&mut conn, occupant.id, b1.id, admin.id).unwrap();

        assert_eq!(revoke_access(&mut conn, occupant.id, b2.id).unwrap(), 0);
        assert_eq!(list_access_for_user(&mut conn, occupant.id).unwrap().len(), 1);
    }

    #[test]
    fn test_global_substance_appears_under_every_building() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let b1 = building(&mut conn, "B1", admin.id);
        let b2 = building(&mut conn, "B2", admin.id);
        let diesel_fuel = substance(&mut conn, "Diesel", admin.id);
        let acetone = substance(&mut conn, "Acetone", admin.id);

        assign_substance(&mut conn, b2.id, diesel_fuel.id, true, admin.id).unwrap();
        assign_substance(&mut conn, b2.id, acetone.id, false, admin.id).unwrap();

        let in_b1 = resolve_substances_for_building(&mut conn, b1.id).unwrap();
        assert_eq!(ids(&in_b1, |s| s.id), vec![diesel_fuel.id]);

        // The global row also matches the building scan for its own building
        let in_b2 = resolve_substances_for_building(&mut conn, b2.id).unwrap();
        assert_eq!(
            ids(&in_b2, |s| s.id),
            vec![diesel_fuel.id, acetone.id, diesel_fuel.id]
        );

        // Buildings that do not exist still see global substances
        let nowhere = resolve_substances_for_building(&mut conn, 999).unwrap();
        assert_eq!(ids(&nowhere, |s| s.id), vec![diesel_fuel.id]);
    }

    #[test]
    fn test_substance_both_specific_and_global_is_listed_twice() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let b1 = building(&mut conn, "B1", admin.id);
        let b2 = building(&mut conn, "B2", admin.id);
        let bleach = substance(&mut conn, "Bleach", admin.id);

        assign_substance(&mut conn, b1.id, bleach.id, false, admin.id).unwrap();
        assign_substance(&mut conn, b2.id, bleach.id, true, admin.id).unwrap();

        let in_b1 = resolve_substances_for_building(&mut conn, b1.id).unwrap();
        assert_eq!(ids(&in_b1, |s| s.id), vec![bleach.id, bleach.id]);
    }

    #[test]
    fn test_deleted_substance_is_dropped_and_unassign_removes_one_row() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let b1 = building(&mut conn, "B1", admin.id);
        let gone = substance(&mut conn, "Gone", admin.id);
        let kept = substance(&mut conn, "Kept", admin.id);
        assign_substance(&mut conn, b1.id, gone.id, false, admin.id).unwrap();
        assign_substance(&mut conn, b1.id, kept.id, false, admin.id).unwrap();
        assign_substance(&mut conn, b1.id, kept.id, false, admin.id).unwrap();

        delete_substance(&mut conn, gone.id).unwrap();
        let in_b1 = resolve_substances_for_building(&mut conn, b1.id).unwrap();
        assert_eq!(ids(&in_b1, |s| s.id), vec![kept.id, kept.id]);

        assert_eq!(unassign_substance(&mut conn, b1.id, kept.id).unwrap(), 1);
        let in_b1 = resolve_substances_for_building(&mut conn, b1.id).unwrap();
        assert_eq!(ids(&in_b1, |s| s.id), vec![kept.id]);

        assert_eq!(unassign_substance(&mut conn, b1.id, 999).unwrap(), 0);
    }

    #[test]
    fn test_find_substance_assignment_returns_oldest_row() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let b1 = building(&mut conn, "B1", admin.id);
        let fuel = substance(&mut conn, "Fuel", admin.id);

        assert!(find_substance_assignment(&mut conn, b1.id, fuel.id).unwrap().is_none());

        let global = assign_substance(&mut conn, b1.id, fuel.id, true, admin.id).unwrap();
        assign_substance(&mut conn, b1.id, fuel.id, false, admin.id).unwrap();

        let found = find_substance_assignment(&mut conn, b1.id, fuel.id).unwrap().unwrap();
        assert_eq!(found.id, global.id);
        assert!(found.is_for_all_buildings);

        unassign_substance(&mut conn, b1.id, fuel.id).unwrap();
        let found = find_substance_assignment(&mut conn, b1.id, fuel.id).unwrap().unwrap();
        assert!(!found.is_for_all_buildings);
    }
}
