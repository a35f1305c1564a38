//! API endpoints for login, logout and the current user.
//!
//! Login is performed by the identity-provider bridge on behalf of a user:
//! it presents the shared key in `X-Identity-Provider-Key` together with the
//! subject id and profile it has verified. First login provisions an
//! occupant account.

use rocket::http::{Cookie, CookieJar, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::json::Json;
use rocket::{Route, State};

use super::{ApiError, api_error, require_non_blank, store_error};
use crate::DbConn;
use crate::config::AppConfig;
use crate::logged_json::LoggedJson;
use crate::models::User;
use crate::orm::login::{IdentityClaims, SESSION_COOKIE, login_with_claims, set_session_cookie};
use crate::orm::logout::revoke_session;
use crate::session_guards::AuthenticatedUser;

pub const IDENTITY_KEY_HEADER: &str = "X-Identity-Provider-Key";

/// The identity-provider key presented with a request, if any.
pub struct PresentedIdentityKey(Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PresentedIdentityKey {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(PresentedIdentityKey(
            request
                .headers()
                .get_one(IDENTITY_KEY_HEADER)
                .map(str::to_string),
        ))
    }
}

/// Login endpoint.
///
/// - **URL:** `/api/1/login`
/// - **Method:** `POST`
/// - **Authentication:** `X-Identity-Provider-Key` header
///
/// # Request Format
///
/// ```json
/// {
///   "external_id": "idp|5f0c1e",
///   "email": "jane@example.com",
///   "first_name": "Jane",
///   "last_name": "Doe",
///   "phone_number": null
/// }
/// ```
///
/// # Response
///
/// **Success (HTTP 200 OK):** the user, with a `session` cookie set.
///
/// **Failure:** 400 for a blank `external_id`, 401 for a missing or wrong key.
#[post("/1/login", data = "<claims>")]
pub async fn login(
    db: DbConn,
    cookies: &CookieJar<'_>,
    config: &State<AppConfig>,
    key: PresentedIdentityKey,
    claims: LoggedJson<IdentityClaims>,
) -> Result<Json<User>, ApiError> {
    if !config.accepts_identity_key(key.0.as_deref()) {
        warn!("Rejected login: identity provider key missing or wrong");
        return Err(api_error(Status::Unauthorized, "Invalid identity provider key"));
    }
    let claims = claims.into_inner();
    require_non_blank("external_id", &claims.external_id)?;

    let (user, token, created) = db
        .run(move |conn| login_with_claims(conn, claims))
        .await
        .map_err(|e| store_error("logging in", e))?;

    if created {
        info!("Provisioned new occupant '{}' (id {})", user.external_id, user.id);
    }
    set_session_cookie(cookies, &token);
    Ok(Json(user))
}

/// Logout endpoint.
///
/// - **URL:** `/api/1/logout`
/// - **Method:** `POST`
///
/// Revokes the session named by the cookie and removes the cookie. Always
/// returns 200, with or without a valid session.
#[post("/1/logout")]
pub async fn logout(db: DbConn, cookies: &CookieJar<'_>) -> Status {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let session_id = cookie.value().to_string();
        if let Err(e) = db.run(move |conn| revoke_session(conn, &session_id)).await {
            error!("Failed to revoke session: {:?}", e);
        }
    }
    cookies.remove(Cookie::from(SESSION_COOKIE));
    Status::Ok
}

/// Current user endpoint.
///
/// - **URL:** `/api/1/me`
/// - **Method:** `GET`
/// - **Authentication:** Required
#[get("/1/me")]
pub async fn me(auth_user: AuthenticatedUser) -> Json<User> {
    Json(auth_user.user)
}

pub fn routes() -> Vec<Route> {
    routes![login, logout, me]
}
