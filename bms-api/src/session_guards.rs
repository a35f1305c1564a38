//! Session-based authentication guards for Rocket routes.
//!
//! This module provides request guards that validate the session cookie and
//! expose the logged-in user to route handlers, along with guards that also
//! check the user's role.
//!
//! ## Basic Authentication
//!
//! ```rust,ignore
//! use rocket::get;
//! use bms_api::session_guards::AuthenticatedUser;
//!
//! #[get("/profile")]
//! fn get_profile(user: AuthenticatedUser) -> String {
//!     format!("Hello, {}!", user.user.email)
//! }
//! ```
//!
//! ## Role-Based Guards
//!
//! ```rust,ignore
//! use rocket::get;
//! use bms_api::session_guards::{AdministratorUser, StaffUser};
//!
//! #[get("/admin")]
//! fn admin_only(user: AdministratorUser) -> String {
//!     format!("Admin access for {}", user.user.email)
//! }
//!
//! #[get("/catalog")]
//! fn staff_only(user: StaffUser) -> String {
//!     format!("Staff access for {}", user.user.email)
//! }
//! ```

use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::DbConn;
use crate::models::{User, UserRole};
use crate::orm::login::{SESSION_COOKIE, find_user_for_session};

/// A request guard for routes that require an authenticated user.
///
/// The guard reads the `session` cookie, looks up a non-revoked, unexpired
/// session, and loads the user it belongs to.
///
/// # Returns
///
/// - `Outcome::Success(AuthenticatedUser)` if authentication succeeds
/// - `Outcome::Error(Status::Unauthorized)` if the cookie is missing or the
///   session does not resolve to a user
/// - `Outcome::Error(Status::InternalServerError)` if no database connection
///   is available
#[derive(Debug)]
pub struct AuthenticatedUser {
    /// The authenticated user from the database
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let session_id = match request.cookies().get(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        match db
            .run(move |conn| find_user_for_session(conn, &session_id))
            .await
        {
            Ok(Some(user)) => Outcome::Success(AuthenticatedUser { user }),
            Ok(None) => Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error finding session: {:?}", e);
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

impl AuthenticatedUser {
    pub fn role(&self) -> UserRole {
        self.user.role
    }

    /// Helper method to check if the user has exactly the given role
    pub fn has_role(&self, role: UserRole) -> bool {
        self.user.role == role
    }

    /// Company administrators bypass building access checks.
    pub fn is_administrator(&self) -> bool {
        self.user.role.is_administrator()
    }

    /// Building workers and company administrators.
    pub fn is_staff(&self) -> bool {
        self.user.role.is_staff()
    }
}

/// Macro to create role-specific request guards
macro_rules! create_role_guard {
    ($name:ident, $check:expr) => {
        #[derive(Debug)]
        pub struct $name {
            pub user: User,
        }

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = ();

            async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
                let auth_user = match AuthenticatedUser::from_request(request).await {
                    Outcome::Success(user) => user,
                    Outcome::Error(e) => return Outcome::Error(e),
                    Outcome::Forward(f) => return Outcome::Forward(f),
                };

                let check: fn(&UserRole) -> bool = $check;
                if check(&auth_user.user.role) {
                    Outcome::Success($name {
                        user: auth_user.user,
                    })
                } else {
                    Outcome::Error((Status::Forbidden, ()))
                }
            }
        }

        impl From<$name> for AuthenticatedUser {
            fn from(guard: $name) -> Self {
                AuthenticatedUser { user: guard.user }
            }
        }
    };
}

// A request guard that requires the companyAdministrator role.
//
// - `Outcome::Error(Status::Forbidden)` if the user is authenticated but is
//   not an administrator
// - `Outcome::Error(Status::Unauthorized)` if the user is not authenticated
create_role_guard!(AdministratorUser, UserRole::is_administrator);

// A request guard that requires the buildingWorker or companyAdministrator role.
create_role_guard!(StaffUser, UserRole::is_staff);
