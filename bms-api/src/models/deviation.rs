use chrono::NaiveDateTime;
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::json_column::decode_list;
use crate::schema::deviations;

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
pub enum DeviationStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

sql_text_enum!(DeviationStatus {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

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
pub enum DeviationPriority {
    Low,
    Medium,
    High,
    Critical,
}

sql_text_enum!(DeviationPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

/// Database model for deviation reports
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = deviations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DeviationDb {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub building_id: i32,
    pub created_by: i32,
    pub status: DeviationStatus,
    pub priority: DeviationPriority,
    pub images: Option<String>,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = deviations)]
pub struct NewDeviation {
    pub title: String,
    pub description: String,
    pub building_id: i32,
    pub created_by: i32,
    pub status: DeviationStatus,
    pub priority: DeviationPriority,
    pub images: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Only set fields are written; `resolved_at`/`resolved_by` are never cleared.
#[derive(AsChangeset)]
#[diesel(table_name = deviations)]
pub struct DeviationChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<DeviationStatus>,
    pub priority: Option<DeviationPriority>,
    pub images: Option<String>,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<i32>,
    pub updated_at: NaiveDateTime,
}

// ============================================================================
// API Models (exported to TypeScript)
// ============================================================================

/// A reported deviation (defect, hazard, or non-conformance) in a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Deviation {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub building_id: i32,
    pub created_by: i32,
    pub status: DeviationStatus,
    pub priority: DeviationPriority,
    pub images: Vec<String>,
    #[ts(type = "string | null")]
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<i32>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct DeviationInput {
    pub title: String,
    pub description: String,
    pub building_id: i32,
    pub priority: DeviationPriority,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial update. `resolved_by` only takes effect together with
/// `status: resolved`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct DeviationUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<DeviationStatus>,
    pub priority: Option<DeviationPriority>,
    pub images: Option<Vec<String>>,
    pub resolved_by: Option<i32>,
}

/// Optional predicates for deviation listings.
#[derive(Debug, Clone, Default)]
pub struct DeviationFilter {
    pub status: Option<DeviationStatus>,
    pub priority: Option<DeviationPriority>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub building_id: Option<i32>,
}

impl DeviationFilter {
    pub fn matches(&self, deviation: &Deviation) -> bool {
        if let Some(status) = self.status
            && deviation.status != status
        {
            return false;
        }
        if let Some(priority) = self.priority
            && deviation.priority != priority
        {
            return false;
        }
        if let Some(building_id) = self.building_id
            && deviation.building_id != building_id
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => deviation
                .title
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        }
    }
}

// Conversion from database model to API model
impl DeviationDb {
    pub fn to_api_model(self) -> Result<Deviation, String> {
        let images = decode_list(self.images.as_deref())?;
        Ok(Deviation {
            id: self.id,
            title: self.title,
            description: self.description,
            building_id: self.building_id,
            created_by: self.created_by,
            status: self.status,
            priority: self.priority,
            images,
            resolved_at: self.resolved_at,
            resolved_by: self.resolved_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
