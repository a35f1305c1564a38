use chrono::Utc;
use diesel::prelude::*;

use super::db::{decode_error, encode_error, last_insert_rowid};
use crate::models::json_column::encode_list;
use crate::models::{
    Deviation, DeviationChangeset, DeviationDb, DeviationInput, DeviationStatus, DeviationUpdate,
    NewDeviation,
};

fn to_api(rows: Vec<DeviationDb>) -> Result<Vec<Deviation>, diesel::result::Error> {
    rows.into_iter()
        .map(|row| row.to_api_model().map_err(decode_error))
        .collect()
}

/// Inserts a new deviation in the `open` state.
pub fn insert_deviation(
    conn: &mut SqliteConnection,
    input: DeviationInput,
    creator_id: i32,
) -> Result<Deviation, diesel::result::Error> {
    use crate::schema::deviations::dsl::*;

    let now = Utc::now().naive_utc();
    let new_deviation = NewDeviation {
        title: input.title,
        description: input.description,
        building_id: input.building_id,
        created_by: creator_id,
        status: DeviationStatus::Open,
        priority: input.priority,
        images: Some(encode_list(&input.images).map_err(encode_error)?),
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(deviations)
        .values(&new_deviation)
        .execute(conn)?;

    let last_id = last_insert_rowid(conn)?;
    get_deviation(conn, last_id)?.ok_or(diesel::result::Error::NotFound)
}

/// Gets a single deviation by ID.
pub fn get_deviation(
    conn: &mut SqliteConnection,
    deviation_id: i32,
) -> Result<Option<Deviation>, diesel::result::Error> {
    use crate::schema::deviations::dsl::*;
    deviations
        .filter(id.eq(deviation_id))
        .select(DeviationDb::as_select())
        .first::<DeviationDb>(conn)
        .optional()?
        .map(|row| row.to_api_model().map_err(decode_error))
        .transpose()
}

/// Returns every deviation, newest first.
pub fn list_all_deviations(
    conn: &mut SqliteConnection,
) -> Result<Vec<Deviation>, diesel::result::Error> {
    use crate::schema::deviations::dsl::*;
    let rows = deviations
        .order(id.desc())
        .select(DeviationDb::as_select())
        .load(conn)?;
    to_api(rows)
}

/// Returns the deviations reported against any of `building_ids`, newest
/// first.
pub fn list_deviations_for_buildings(
    conn: &mut SqliteConnection,
    building_ids: &[i32],
) -> Result<Vec<Deviation>, diesel::result::Error> {
    use crate::schema::deviations::dsl::*;
    if building_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = deviations
        .filter(building_id.eq_any(building_ids))
        .order(id.desc())
        .select(DeviationDb::as_select())
        .load(conn)?;
    to_api(rows)
}

/// Applies a partial update to a deviation and stamps `updated_at`.
///
/// `resolved_at` and `resolved_by` are written only when the update moves
/// the deviation to `resolved` and names who resolved it. Any other update
/// leaves them as they were.
///
/// # Returns
/// * `Ok(Deviation)` - Updated deviation
/// * `Err(diesel::result::Error::NotFound)` - No deviation with that id
pub fn update_deviation(
    conn: &mut SqliteConnection,
    deviation_id: i32,
    changes: DeviationUpdate,
) -> Result<Deviation, diesel::result::Error> {
    use crate::schema::deviations::dsl::*;

    let now = Utc::now().naive_utc();
    let (stamp_at, stamp_by) = match (changes.status, changes.resolved_by) {
        (Some(DeviationStatus::Resolved), Some(resolver)) => (Some(now), Some(resolver)),
        _ => (None, None),
    };
    let encoded_images = changes
        .images
        .as_deref()
        .map(encode_list)
        .transpose()
        .map_err(encode_error)?;

    let changeset = DeviationChangeset {
        title: changes.title,
        description: changes.description,
        status: changes.status,
        priority: changes.priority,
        images: encoded_images,
        resolved_at: stamp_at,
        resolved_by: stamp_by,
        updated_at: now,
    };

    let affected = diesel::update(deviations.filter(id.eq(deviation_id)))
        .set(&changeset)
        .execute(conn)?;
    if affected == 0 {
        return Err(diesel::result::Error::NotFound);
    }

    get_deviation(conn, deviation_id)?.ok_or(diesel::result::Error::NotFound)
}

/// Deletes a deviation by ID.
///
/// # Returns
/// * `Ok(usize)` - Number of rows deleted (0 or 1)
pub fn delete_deviation(
    conn: &mut SqliteConnection,
    deviation_id: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::deviations::dsl::*;
    diesel::delete(deviations.filter(id.eq(deviation_id))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviationPriority, UserRole};
    use crate::orm::testing::{insert_test_user, setup_test_db};

    fn input(building: i32, priority: DeviationPriority) -> DeviationInput {
        DeviationInput {
            title: "Cracked fire door".to_string(),
            description: "Door on level 2 does not close".to_string(),
            building_id: building,
            priority,
            images: vec!["https://img.example.com/door.jpg".to_string()],
        }
    }

    #[test]
    fn test_insert_deviation_starts_open() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "idp|reporter", UserRole::Occupant);

        let deviation = insert_deviation(&mut conn, input(1, DeviationPriority::High), user.id).unwrap();
        assert_eq!(deviation.status, DeviationStatus::Open);
        assert_eq!(deviation.created_by, user.id);
        assert_eq!(deviation.images, vec!["https://img.example.com/door.jpg".to_string()]);
        assert!(deviation.resolved_at.is_none());
        assert!(deviation.resolved_by.is_none());
    }

    #[test]
    fn test_resolving_with_resolver_stamps_both_fields() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "idp|worker", UserRole::BuildingWorker);
        let deviation = insert_deviation(&mut conn, input(1, DeviationPriority::Low), user.id).unwrap();

        let resolved = update_deviation(
            &mut conn,
            deviation.id,
            DeviationUpdate {
                status: Some(DeviationStatus::Resolved),
                resolved_by: Some(user.id),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(resolved.status, DeviationStatus::Resolved);
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.resolved_by, Some(user.id));
    }

    #[test]
    fn test_other_status_changes_never_stamp_resolution() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "idp|worker", UserRole::BuildingWorker);
        let deviation = insert_deviation(&mut conn, input(1, DeviationPriority::Low), user.id).unwrap();

        for status in [DeviationStatus::InProgress, DeviationStatus::Closed, DeviationStatus::Open] {
            let updated = update_deviation(
                &mut conn,
                deviation.id,
                DeviationUpdate {
                    status: Some(status),
                    resolved_by: Some(user.id),
                    ..Default::default()
                },
            )
            .unwrap();
            assert_eq!(updated.status, status);
            assert!(updated.resolved_at.is_none());
            assert!(updated.resolved_by.is_none());
        }

        // Resolved without naming a resolver
        let updated = update_deviation(
            &mut conn,
            deviation.id,
            DeviationUpdate {
                status: Some(DeviationStatus::Resolved),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.status, DeviationStatus::Resolved);
        assert!(updated.resolved_at.is_none());
    }

    #[test]
    fn test_reopening_keeps_previous_resolution() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "idp|worker", UserRole::BuildingWorker);
        let deviation = insert_deviation(&mut conn, input(1, DeviationPriority::Low), user.id).unwrap();

        let resolved = update_deviation(
            &mut conn,
            deviation.id,
            DeviationUpdate {
                status: Some(DeviationStatus::Resolved),
                resolved_by: Some(user.id),
                ..Default::default()
            },
        )
        .unwrap();
        let reopened = update_deviation(
            &mut conn,
            deviation.id,
            DeviationUpdate {
                status: Some(DeviationStatus::Open),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(reopened.resolved_at, resolved.resolved_at);
        assert_eq!(reopened.resolved_by, resolved.resolved_by);
    }

    #[test]
    fn test_list_for_buildings_filters_by_building() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "idp|reporter", UserRole::Occupant);
        let in_one = insert_deviation(&mut conn, input(1, DeviationPriority::Critical), user.id).unwrap();
        insert_deviation(&mut conn, input(2, DeviationPriority::Low), user.id).unwrap();

        let listed = list_deviations_for_buildings(&mut conn, &[1]).unwrap();
        assert_eq!(listed, vec![in_one]);
        assert!(list_deviations_for_buildings(&mut conn, &[]).unwrap().is_empty());
        assert_eq!(list_all_deviations(&mut conn).unwrap().len(), 2);
    }

    #[test]
    fn test_update_and_delete_missing_deviation() {
        let mut conn = setup_test_db();
        let result = update_deviation(&mut conn, 77, DeviationUpdate::default());
        assert!(matches!(result, Err(diesel::result::Error::NotFound)));
        assert_eq!(delete_deviation(&mut conn, 77).unwrap(), 0);
    }
}
