use chrono::NaiveDateTime;
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::json_column::decode_list;
use crate::schema::{building_substances, substances};

/// Database model for hazardous substances
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = substances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SubstanceDb {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub files: Option<String>,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = substances)]
pub struct NewSubstance {
    pub name: String,
    pub description: Option<String>,
    pub files: Option<String>,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = substances)]
pub struct SubstanceChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub files: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// A catalog entry for a hazardous substance with its safety documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Substance {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub files: Vec<String>,
    pub created_by: i32,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct SubstanceInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct SubstanceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub files: Option<Vec<String>>,
}

/// Association of a substance with a building, or with every building when
/// `is_for_all_buildings` is set (in which case `building_id` is ignored by
/// readers).
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = building_substances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct BuildingSubstance {
    pub id: i32,
    pub building_id: i32,
    pub substance_id: i32,
    pub is_for_all_buildings: bool,
    pub added_by: i32,
    #[ts(type = "string")]
    pub added_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = building_substances)]
pub struct NewBuildingSubstance {
    pub building_id: i32,
    pub substance_id: i32,
    pub is_for_all_buildings: bool,
    pub added_by: i32,
    pub added_at: NaiveDateTime,
}

impl SubstanceDb {
    pub fn to_api_model(self) -> Result<Substance, String> {
        let files = decode_list(self.files.as_deref())?;
        Ok(Substance {
            id: self.id,
            name: self.name,
            description: self.description,
            files,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
