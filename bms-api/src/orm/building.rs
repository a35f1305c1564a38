use chrono::Utc;
use diesel::prelude::*;

use super::db::last_insert_rowid;
use crate::models::{Building, BuildingChangeset, BuildingInput, BuildingUpdate, NewBuilding};

/// Inserts a new building created by `creator_id`.
pub fn insert_building(
    conn: &mut SqliteConnection,
    input: BuildingInput,
    creator_id: i32,
) -> Result<Building, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;

    let now = Utc::now().naive_utc();
    let new_building = NewBuilding {
        name: input.name,
        description: input.description,
        image_url: input.image_url,
        created_by: creator_id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(buildings)
        .values(&new_building)
        .execute(conn)?;

    let last_id = last_insert_rowid(conn)?;
    buildings
        .filter(id.eq(last_id))
        .select(Building::as_select())
        .first(conn)
}

/// Gets a single building by ID.
pub fn get_building(
    conn: &mut SqliteConnection,
    building_id: i32,
) -> Result<Option<Building>, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;
    buildings
        .filter(id.eq(building_id))
        .select(Building::as_select())
        .first(conn)
        .optional()
}

/// Returns all buildings in ascending order by id.
pub fn list_all_buildings(
    conn: &mut SqliteConnection,
) -> Result<Vec<Building>, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;
    buildings
        .order(id.asc())
        .select(Building::as_select())
        .load(conn)
}

/// Applies a partial update to a building and stamps `updated_at`.
///
/// # Returns
/// * `Ok(Building)` - Updated building
/// * `Err(diesel::result::Error::NotFound)` - No building with that id
pub fn update_building(
    conn: &mut SqliteConnection,
    building_id: i32,
    changes: BuildingUpdate,
) -> Result<Building, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;

    let changeset = BuildingChangeset {
        name: changes.name,
        description: changes.description,
        image_url: changes.image_url,
        updated_at: Utc::now().naive_utc(),
    };

    let affected = diesel::update(buildings.filter(id.eq(building_id)))
        .set(&changeset)
        .execute(conn)?;
    if affected == 0 {
        return Err(diesel::result::Error::NotFound);
    }

    buildings
        .filter(id.eq(building_id))
        .select(Building::as_select())
        .first(conn)
}

/// Deletes a building by ID.
///
/// Grants, substance associations, deviations, inspections and schedules
/// that reference the building are left in place.
///
/// # Returns
/// * `Ok(usize)` - Number of rows deleted (0 or 1)
pub fn delete_building(
    conn: &mut SqliteConnection,
    building_id: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;
    diesel::delete(buildings.filter(id.eq(building_id))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviationInput, DeviationPriority, SubstanceInput, UserRole};
    use crate::orm::deviation::{insert_deviation, list_deviations_for_buildings};
    use crate::orm::substance::insert_substance;
    use crate::orm::testing::{insert_test_user, setup_test_db};
    use crate::resolver::assign_substance;
    use crate::schema::building_substances;

    fn input(name: &str) -> BuildingInput {
        BuildingInput {
            name: name.to_string(),
            description: Some("Office block".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn test_insert_and_get_building() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);

        let building = insert_building(&mut conn, input("Harbour House"), admin.id).unwrap();
        assert_eq!(building.name, "Harbour House");
        assert_eq!(building.created_by, admin.id);

        let fetched = get_building(&mut conn, building.id).unwrap();
        assert_eq!(fetched, Some(building));
        assert!(get_building(&mut conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_list_buildings_in_id_order() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);

        let first = insert_building(&mut conn, input("North"), admin.id).unwrap();
        let second = insert_building(&mut conn, input("South"), admin.id).unwrap();

        let all = list_all_buildings(&mut conn).unwrap();
        assert_eq!(all.iter().map(|b| b.id).collect::<Vec<_>>(), vec![first.id, second.id]);
    }

    #[test]
    fn test_update_building() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let building = insert_building(&mut conn, input("Old Name"), admin.id).unwrap();

        let updated = update_building(
            &mut conn,
            building.id,
            BuildingUpdate {
                name: Some("New Name".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.description, building.description);
        assert!(updated.updated_at >= building.updated_at);

        let missing = update_building(&mut conn, 999, BuildingUpdate::default());
        assert!(matches!(missing, Err(diesel::result::Error::NotFound)));
    }

    #[test]
    fn test_delete_building_is_unconditional() {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "idp|admin", UserRole::CompanyAdministrator);
        let building = insert_building(&mut conn, input("Doomed"), admin.id).unwrap();
        let leak = DeviationInput {
            title: "Leak".to_string(),
            description: "Water on the floor".to_string(),
            building_id: building.id,
            priority: DeviationPriority::Low,
            images: vec![],
        };
        insert_deviation(&mut conn, leak, admin.id).unwrap();
        let solvent = SubstanceInput {
            name: "Solvent".to_string(),
            description: None,
            files: Vec::new(),
        };
        let solvent = insert_substance(&mut conn, solvent, admin.id).unwrap();
        assign_substance(&mut conn, building.id, solvent.id, false, admin.id).unwrap();

        assert_eq!(delete_building(&mut conn, building.id).unwrap(), 1);
        assert!(get_building(&mut conn, building.id).unwrap().is_none());
        assert_eq!(delete_building(&mut conn, building.id).unwrap(), 0);

        // Dependent rows are left in place.
        let deviations = list_deviations_for_buildings(&mut conn, &[building.id]).unwrap();
        assert_eq!(deviations.len(), 1);
        let associations = building_substances::table
            .filter(building_substances::building_id.eq(building.id))
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        assert_eq!(associations, 1);
    }
}
