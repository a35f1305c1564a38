use chrono::NaiveDateTime;
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::json_column::decode_list;
use crate::schema::fire_inspections;

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
pub enum InspectionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

sql_text_enum!(InspectionStatus {
    Pending => "pending",
    InProgress => "in_progress",
    Completed => "completed",
    Failed => "failed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Low,
    Medium,
    High,
}

/// A single observation recorded during an inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Finding {
    pub category: String,
    pub description: String,
    pub severity: FindingSeverity,
    pub action_required: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = fire_inspections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FireInspectionDb {
    pub id: i32,
    pub building_id: i32,
    pub inspector_id: i32,
    pub inspection_date: NaiveDateTime,
    pub status: InspectionStatus,
    pub notes: Option<String>,
    pub findings: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = fire_inspections)]
pub struct NewFireInspection {
    pub building_id: i32,
    pub inspector_id: i32,
    pub inspection_date: NaiveDateTime,
    pub status: InspectionStatus,
    pub notes: Option<String>,
    pub findings: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = fire_inspections)]
pub struct FireInspectionChangeset {
    pub inspection_date: Option<NaiveDateTime>,
    pub status: Option<InspectionStatus>,
    pub notes: Option<String>,
    pub findings: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FireInspection {
    pub id: i32,
    pub building_id: i32,
    pub inspector_id: i32,
    #[ts(type = "string")]
    pub inspection_date: NaiveDateTime,
    pub status: InspectionStatus,
    pub notes: Option<String>,
    pub findings: Vec<Finding>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct FireInspectionInput {
    pub building_id: i32,
    #[ts(type = "string")]
    pub inspection_date: NaiveDateTime,
    pub status: Option<InspectionStatus>,
    pub notes: Option<String>,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct FireInspectionUpdate {
    #[ts(type = "string | null")]
    pub inspection_date: Option<NaiveDateTime>,
    pub status: Option<InspectionStatus>,
    pub notes: Option<String>,
    pub findings: Option<Vec<Finding>>,
}

impl FireInspectionDb {
    pub fn to_api_model(self) -> Result<FireInspection, String> {
        let findings = decode_list(self.findings.as_deref())?;
        Ok(FireInspection {
            id: self.id,
            building_id: self.building_id,
            inspector_id: self.inspector_id,
            inspection_date: self.inspection_date,
            status: self.status,
            notes: self.notes,
            findings,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
