use chrono::NaiveDateTime;
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::users;

/// The sole authorization axis of a user.
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
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    Occupant,
    BuildingWorker,
    CompanyAdministrator,
}

sql_text_enum!(UserRole {
    Occupant => "occupant",
    BuildingWorker => "buildingWorker",
    CompanyAdministrator => "companyAdministrator",
});

impl UserRole {
    /// Company administrators bypass building access checks.
    pub fn is_administrator(&self) -> bool {
        matches!(self, UserRole::CompanyAdministrator)
    }

    /// Building workers and administrators maintain catalogs and inspections.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::BuildingWorker | UserRole::CompanyAdministrator)
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct User {
    pub id: i32,
    /// Subject id issued by the identity provider. Unique.
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// For API inputs and provisioning
#[derive(Deserialize, Serialize, Clone, Debug, TS)]
#[ts(export)]
pub struct UserInput {
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
}

/// Partial update of a user; `None` fields are left untouched.
#[derive(Deserialize, Serialize, Default, Clone, Debug, TS)]
#[ts(export)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub phone_number: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangeset {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub phone_number: Option<String>,
    pub updated_at: NaiveDateTime,
}
