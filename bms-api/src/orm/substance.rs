use chrono::Utc;
use diesel::prelude::*;

use super::db::{decode_error, encode_error, last_insert_rowid};
use crate::models::json_column::encode_list;
use crate::models::{
    NewSubstance, Substance, SubstanceChangeset, SubstanceDb, SubstanceInput, SubstanceUpdate,
};

/// Inserts a new catalog substance.
pub fn insert_substance(
    conn: &mut SqliteConnection,
    input: SubstanceInput,
    creator_id: i32,
) -> Result<Substance, diesel::result::Error> {
    use crate::schema::substances::dsl::*;

    let now = Utc::now().naive_utc();
    let new_substance = NewSubstance {
        name: input.name,
        description: input.description,
        files: Some(encode_list(&input.files).map_err(encode_error)?),
        created_by: creator_id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(substances)
        .values(&new_substance)
        .execute(conn)?;

    let last_id = last_insert_rowid(conn)?;
    get_substance(conn, last_id)?.ok_or(diesel::result::Error::NotFound)
}

/// Gets a single substance by ID.
pub fn get_substance(
    conn: &mut SqliteConnection,
    substance_id: i32,
) -> Result<Option<Substance>, diesel::result::Error> {
    use crate::schema::substances::dsl::*;
    substances
        .filter(id.eq(substance_id))
        .select(SubstanceDb::as_select())
        .first::<SubstanceDb>(conn)
        .optional()?
        .map(|row| row.to_api_model().map_err(decode_error))
        .transpose()
}

/// Returns the full substance catalog ordered by name.
pub fn list_all_substances(
    conn: &mut SqliteConnection,
) -> Result<Vec<Substance>, diesel::result::Error> {
    use crate::schema::substances::dsl::*;
    substances
        .order((name.asc(), id.asc()))
        .select(SubstanceDb::as_select())
        .load::<SubstanceDb>(conn)?
        .into_iter()
        .map(|row| row.to_api_model().map_err(decode_error))
        .collect()
}

/// Applies a partial update to a substance and stamps `updated_at`.
///
/// # Returns
/// * `Ok(Substance)` - Updated substance
/// * `Err(diesel::result::Error::NotFound)` - No substance with that id
pub fn update_substance(
    conn: &mut SqliteConnection,
    substance_id: i32,
    changes: SubstanceUpdate,
) -> Result<Substance, diesel::result::Error> {
    use crate::schema::substances::dsl::*;

    let encoded_files = changes
        .files
        .as_deref()
        .map(encode_list)
        .transpose()
        .map_err(encode_error)?;
    let changeset = SubstanceChangeset {
        name: changes.name,
        description: changes.description,
        files: encoded_files,
        updated_at: Utc::now().naive_utc(),
    };

    let affected = diesel::update(substances.filter(id.eq(substance_id)))
        .set(&changeset)
        .execute(conn)?;
    if affected == 0 {
        return Err(diesel::result::Error::NotFound);
    }

    get_substance(conn, substance_id)?.ok_or(diesel::result::Error::NotFound)
}

/// Deletes a substance by ID. Its building associations are left in place.
///
/// # Returns
/// * `Ok(usize)` - Number of rows deleted (0 or 1)
pub fn delete_substance(
    conn: &mut SqliteConnection,
    substance_id: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::substances::dsl::*;
    diesel::delete(substances.filter(id.eq(substance_id))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::orm::testing::{insert_test_user, setup_test_db};

    fn input(substance_name: &str) -> SubstanceInput {
        SubstanceInput {
            name: substance_name.to_string(),
            description: None,
            files: vec!["sds/acetone.pdf".to_string()],
        }
    }

    #[test]
    fn test_insert_and_list_substances() {
        let mut conn = setup_test_db();
        let worker = insert_test_user(&mut conn, "idp|worker", UserRole::BuildingWorker);

        let toluene = insert_substance(&mut conn, input("Toluene"), worker.id).unwrap();
        let acetone = insert_substance(&mut conn, input("Acetone"), worker.id).unwrap();
        assert_eq!(acetone.files, vec!["sds/acetone.pdf".to_string()]);

        let catalog = list_all_substances(&mut conn).unwrap();
        assert_eq!(catalog, vec![acetone, toluene]);
    }

    #[test]
    fn test_update_substance_files() {
        let mut conn = setup_test_db();
        let worker = insert_test_user(&mut conn, "idp|worker", UserRole::BuildingWorker);
        let substance = insert_substance(&mut conn, input("Ammonia"), worker.id).unwrap();

        let updated = update_substance(
            &mut conn,
            substance.id,
            SubstanceUpdate {
                files: Some(Vec::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(updated.files.is_empty());
        assert_eq!(updated.name, "Ammonia");
    }

    #[test]
    fn test_delete_substance() {
        let mut conn = setup_test_db();
        let worker = insert_test_user(&mut conn, "idp|worker", UserRole::BuildingWorker);
        let substance = insert_substance(&mut conn, input("Chlorine"), worker.id).unwrap();

        assert_eq!(delete_substance(&mut conn, substance.id).unwrap(), 1);
        assert!(get_substance(&mut conn, substance.id).unwrap().is_none());
        let missing = update_substance(&mut conn, substance.id, SubstanceUpdate::default());
        assert!(matches!(missing, Err(diesel::result::Error::NotFound)));
    }
}
