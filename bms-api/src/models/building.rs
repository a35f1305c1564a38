use chrono::NaiveDateTime;
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::{building_access, buildings};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[diesel(table_name = buildings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Building {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_by: i32,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = buildings)]
pub struct NewBuilding {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// For API inputs and validation
#[derive(Deserialize, Serialize, Clone, Debug, TS)]
#[ts(export)]
pub struct BuildingInput {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Deserialize, Serialize, Default, Clone, Debug, TS)]
#[ts(export)]
pub struct BuildingUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = buildings)]
pub struct BuildingChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// An explicit grant giving a user visibility into a building.
///
/// Grants are not unique per (user, building); repeated grants produce
/// repeated rows.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = building_access)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct BuildingAccess {
    pub id: i32,
    pub user_id: i32,
    pub building_id: i32,
    pub granted_by: i32,
    #[ts(type = "string")]
    pub granted_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = building_access)]
pub struct NewBuildingAccess {
    pub user_id: i32,
    pub building_id: i32,
    pub granted_by: i32,
    pub granted_at: NaiveDateTime,
}
