use chrono::Utc;
use diesel::prelude::*;

use super::db::{decode_error, encode_error, last_insert_rowid};
use crate::models::json_column::encode_list;
use crate::models::{
    FireInspection, FireInspectionChangeset, FireInspectionDb, FireInspectionInput,
    FireInspectionUpdate, InspectionStatus, NewFireInspection,
};

/// Records a new inspection performed by `inspector`.
///
/// The status defaults to `pending` when the input leaves it unset.
pub fn insert_fire_inspection(
    conn: &mut SqliteConnection,
    input: FireInspectionInput,
    inspector: i32,
) -> Result<FireInspection, diesel::result::Error> {
    use crate::schema::fire_inspections::dsl::*;

    let now = Utc::now().naive_utc();
    let new_inspection = NewFireInspection {
        building_id: input.building_id,
        inspector_id: inspector,
        inspection_date: input.inspection_date,
        status: input.status.unwrap_or(InspectionStatus::Pending),
        notes: input.notes,
        findings: Some(encode_list(&input.findings).map_err(encode_error)?),
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(fire_inspections)
        .values(&new_inspection)
        .execute(conn)?;

    let last_id = last_insert_rowid(conn)?;
    get_fire_inspection(conn, last_id)?.ok_or(diesel::result::Error::NotFound)
}

pub fn get_fire_inspection(
    conn: &mut SqliteConnection,
    inspection_id: i32,
) -> Result<Option<FireInspection>, diesel::result::Error> {
    use crate::schema::fire_inspections::dsl::*;
    fire_inspections
        .filter(id.eq(inspection_id))
        .select(FireInspectionDb::as_select())
        .first::<FireInspectionDb>(conn)
        .optional()?
        .map(|row| row.to_api_model().map_err(decode_error))
        .transpose()
}

/// Inspections of one building, most recent inspection date first.
pub fn list_fire_inspections_for_building(
    conn: &mut SqliteConnection,
    building: i32,
) -> Result<Vec<FireInspection>, diesel::result::Error> {
    use crate::schema::fire_inspections::dsl::*;
    fire_inspections
        .filter(building_id.eq(building))
        .order((inspection_date.desc(), id.desc()))
        .select(FireInspectionDb::as_select())
        .load::<FireInspectionDb>(conn)?
        .into_iter()
        .map(|row| row.to_api_model().map_err(decode_error))
        .collect()
}

/// Applies a partial update to an inspection and stamps `updated_at`.
pub fn update_fire_inspection(
    conn: &mut SqliteConnection,
    inspection_id: i32,
    changes: FireInspectionUpdate,
) -> Result<FireInspection, diesel::result::Error> {
    use crate::schema::fire_inspections::dsl::*;

    let encoded_findings = changes
        .findings
        .as_deref()
        .map(encode_list)
        .transpose()
        .map_err(encode_error)?;
    let changeset = FireInspectionChangeset {
        inspection_date: changes.inspection_date,
        status: changes.status,
        notes: changes.notes,
        findings: encoded_findings,
        updated_at: Utc::now().naive_utc(),
    };

    let affected = diesel::update(fire_inspections.filter(id.eq(inspection_id)))
        .set(&changeset)
        .execute(conn)?;
    if affected == 0 {
        return Err(diesel::result::Error::NotFound);
    }

    get_fire_inspection(conn, inspection_id)?.ok_or(diesel::result::Error::NotFound)
}

pub fn delete_fire_inspection(
    conn: &mut SqliteConnection,
    inspection_id: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::fire_inspections::dsl::*;
    diesel::delete(fire_inspections.filter(id.eq(inspection_id))).execute(conn)
}
