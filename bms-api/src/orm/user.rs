use chrono::Utc;
use diesel::prelude::*;

use super::db::last_insert_rowid;
use crate::models::{NewUser, User, UserChangeset, UserInput, UserRole, UserUpdate};

/// Inserts a new user and returns the stored row.
pub fn insert_user(
    conn: &mut SqliteConnection,
    new_user: UserInput,
) -> Result<User, diesel::result::Error> {
    use crate::schema::users::dsl::*;

    let now = Utc::now().naive_utc();
    let insertable_user = NewUser {
        external_id: new_user.external_id,
        email: new_user.email,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        role: new_user.role,
        phone_number: new_user.phone_number,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(users)
        .values(&insertable_user)
        .execute(conn)?;

    let last_id = last_insert_rowid(conn)?;
    users.filter(id.eq(last_id)).select(User::as_select()).first(conn)
}

/// Returns all users in ascending order by id.
pub fn list_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users.order(id.asc()).select(User::as_select()).load(conn)
}

/// Gets a single user by ID.
pub fn get_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users
        .filter(id.eq(user_id))
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// Gets a single user by the identity provider's subject id.
pub fn get_user_by_external_id(
    conn: &mut SqliteConnection,
    subject: &str,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users
        .filter(external_id.eq(subject))
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// First-login provisioning: returns the user with this external id,
/// creating it from `profile` if absent. An existing user is returned
/// unchanged.
///
/// # Returns
/// * `Ok((User, true))` - The user was created by this call
/// * `Ok((User, false))` - The user already existed
pub fn find_or_create_user(
    conn: &mut SqliteConnection,
    profile: UserInput,
) -> Result<(User, bool), diesel::result::Error> {
    conn.transaction(|conn| {
        if let Some(existing) = get_user_by_external_id(conn, &profile.external_id)? {
            return Ok((existing, false));
        }
        insert_user(conn, profile).map(|user| (user, true))
    })
}

/// Applies a partial update to a user and stamps `updated_at`.
///
/// # Returns
/// * `Ok(User)` - Updated user object
/// * `Err(diesel::result::Error::NotFound)` - No user with that id
pub fn update_user(
    conn: &mut SqliteConnection,
    user_id: i32,
    changes: UserUpdate,
) -> Result<User, diesel::result::Error> {
    use crate::schema::users::dsl::*;

    let changeset = UserChangeset {
        email: changes.email,
        first_name: changes.first_name,
        last_name: changes.last_name,
        role: changes.role,
        phone_number: changes.phone_number,
        updated_at: Utc::now().naive_utc(),
    };

    let affected = diesel::update(users.filter(id.eq(user_id)))
        .set(&changeset)
        .execute(conn)?;
    if affected == 0 {
        return Err(diesel::result::Error::NotFound);
    }

    users.filter(id.eq(user_id)).select(User::as_select()).first(conn)
}

/// Sets a user's role.
pub fn set_user_role(
    conn: &mut SqliteConnection,
    user_id: i32,
    new_role: UserRole,
) -> Result<User, diesel::result::Error> {
    update_user(
        conn,
        user_id,
        UserUpdate {
            role: Some(new_role),
            ..Default::default()
        },
    )
}

/// Deletes a user by ID.
///
/// Sessions are removed by the foreign key cascade. Buildings, grants and
/// deviations referencing the user are left in place.
///
/// # Returns
/// * `Ok(usize)` - Number of rows deleted (0 or 1)
pub fn delete_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    diesel::delete(users.filter(id.eq(user_id))).execute(conn)
}
