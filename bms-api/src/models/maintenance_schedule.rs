use chrono::NaiveDateTime;
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::maintenance_schedules;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    diesel::expression::AsExpression,
    diesel::deserialize::FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

sql_text_enum!(MaintenanceFrequency {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Quarterly => "quarterly",
    Yearly => "yearly",
});

/// A recurring maintenance task for a building.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[diesel(table_name = maintenance_schedules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct MaintenanceSchedule {
    pub id: i32,
    pub building_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub frequency: MaintenanceFrequency,
    #[ts(type = "string")]
    pub next_due_date: NaiveDateTime,
    pub assigned_to: Option<i32>,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = maintenance_schedules)]
pub struct NewMaintenanceSchedule {
    pub building_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub frequency: MaintenanceFrequency,
    pub next_due_date: NaiveDateTime,
    pub assigned_to: Option<i32>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct MaintenanceScheduleInput {
    pub building_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub frequency: MaintenanceFrequency,
    #[ts(type = "string")]
    pub next_due_date: NaiveDateTime,
    pub assigned_to: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS, AsChangeset)]
#[diesel(table_name = maintenance_schedules)]
#[ts(export)]
pub struct MaintenanceScheduleUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<MaintenanceFrequency>,
    #[ts(type = "string | null")]
    pub next_due_date: Option<NaiveDateTime>,
    pub assigned_to: Option<i32>,
    pub is_active: Option<bool>,
}
