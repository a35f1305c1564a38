//! Database operations for identity-provider login and session management.
//!
//! Users are never created with passwords. The identity provider vouches for
//! a subject id, and the first login with an unknown subject provisions an
//! occupant account for it.

use chrono::Utc;
use diesel::prelude::*;
use rocket::http::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::models::{NewSession, User, UserInput, UserRole};
use crate::orm::user::find_or_create_user;
use crate::schema::{sessions, users};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Profile asserted by the identity provider at login.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, ts_rs::TS)]
#[ts(export)]
pub struct IdentityClaims {
    pub external_id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl IdentityClaims {
    /// Profile used when the subject logs in for the first time.
    pub fn into_occupant_profile(self) -> UserInput {
        UserInput {
            external_id: self.external_id,
            email: self.email,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            role: UserRole::Occupant,
            phone_number: self.phone_number,
        }
    }
}

/// Generates a new UUID-based session token.
fn generate_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Creates a new session for `user_id` and returns its token.
pub fn create_and_store_session(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<String, diesel::result::Error> {
    let session_token = generate_session_token();
    let new_session = NewSession {
        id: session_token.clone(),
        user_id,
        created_at: Utc::now().naive_utc(),
        expires_at: None,
        revoked: false,
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(session_token)
}

/// Resolves a session token to its user.
///
/// Revoked and expired sessions resolve to `None`, as do sessions whose
/// user no longer exists.
pub fn find_user_for_session(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<Option<User>, diesel::result::Error> {
    sessions::table
        .inner_join(users::table)
        .filter(sessions::id.eq(session_token))
        .filter(sessions::revoked.eq(false))
        .filter(
            sessions::expires_at
                .is_null()
                .or(sessions::expires_at.gt(Utc::now().naive_utc())),
        )
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// Provisions the user named by `claims` if needed and opens a session.
///
/// # Returns
/// * `Ok((User, token, created))` - The logged-in user, the new session
///   token, and whether the user was created by this login
pub fn login_with_claims(
    conn: &mut SqliteConnection,
    claims: IdentityClaims,
) -> Result<(User, String, bool), diesel::result::Error> {
    let (user, created) = find_or_create_user(conn, claims.into_occupant_profile())?;
    let token = create_and_store_session(conn, user.id)?;
    Ok((user, token, created))
}

/// Sets the session cookie in the response.
///
/// The cookie is HTTP-only with SameSite=Lax. It is marked secure outside
/// of unit tests.
pub fn set_session_cookie(cookies: &CookieJar<'_>, session_token: &str) {
    let secure_flag = !cfg!(test);
    let cookie = Cookie::build((SESSION_COOKIE, session_token.to_string()))
        .http_only(true)
        .secure(secure_flag)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    cookies.add(cookie);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::setup_test_db;

    fn claims(subject: &str) -> IdentityClaims {
        IdentityClaims {
            external_id: subject.to_string(),
            email: "new.person@example.com".to_string(),
            first_name: Some("New".to_string()),
            last_name: None,
            phone_number: None,
        }
    }

    #[test]
    fn test_first_login_provisions_occupant() {
        let mut conn = setup_test_db();

        let (user, token, created) = login_with_claims(&mut conn, claims("idp|new")).unwrap();
        assert!(created);
        assert_eq!(user.role, UserRole::Occupant);
        assert_eq!(user.first_name, "New");
        assert_eq!(user.last_name, "");

        let resolved = find_user_for_session(&mut conn, &token).unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(user.id));
    }

    #[test]
    fn test_second_login_reuses_user_with_fresh_session() {
        let mut conn = setup_test_db();

        let (first, first_token, _) = login_with_claims(&mut conn, claims("idp|again")).unwrap();
        let (second, second_token, created) =
            login_with_claims(&mut conn, claims("idp|again")).unwrap();

        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_ne!(first_token, second_token);
    }

    #[test]
    fn test_unknown_and_revoked_sessions_resolve_to_none() {
        let mut conn = setup_test_db();
        let (_, token, _) = login_with_claims(&mut conn, claims("idp|revoked")).unwrap();

        assert!(find_user_for_session(&mut conn, "no-such-token").unwrap().is_none());

        crate::orm::logout::revoke_session(&mut conn, &token).unwrap();
        assert!(find_user_for_session(&mut conn, &token).unwrap().is_none());
    }

    #[test]
    fn test_sessions_removed_with_user() {
        let mut conn = setup_test_db();
        let (user, token, _) = login_with_claims(&mut conn, claims("idp|gone")).unwrap();

        crate::orm::user::delete_user(&mut conn, user.id).unwrap();

        let remaining: i64 = sessions::table
            .filter(sessions::id.eq(&token))
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
