//! Helpers shared by the HTTP integration tests.

#![allow(dead_code)]

use rocket::http::{ContentType, Cookie, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{Value, json};

use bms_api::models::{Building, User, UserRole};
use bms_api::orm::testing::{TEST_IDENTITY_PROVIDER_KEY, test_rocket};

/// Subject id of the administrator provisioned at ignition.
pub const ADMIN_SUBJECT: &str = "bootstrap-admin";

/// Client that does not carry cookies between requests, so each test can
/// act as several users.
pub async fn client() -> Client {
    Client::untracked(test_rocket())
        .await
        .expect("valid rocket instance")
}

/// Logs in through the identity-provider endpoint and returns the user and
/// its session cookie.
pub async fn login(client: &Client, subject: &str) -> (User, Cookie<'static>) {
    let response = client
        .post("/api/1/login")
        .header(ContentType::JSON)
        .header(Header::new("X-Identity-Provider-Key", TEST_IDENTITY_PROVIDER_KEY))
        .body(
            json!({
                "external_id": subject,
                "email": format!("{}@example.com", subject.replace('|', ".")),
                "first_name": "Test",
                "last_name": "User"
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let cookie = response
        .cookies()
        .get("session")
        .expect("Session cookie should be set")
        .clone()
        .into_owned();
    let user: User = response.into_json().await.expect("valid user JSON");
    (user, cookie)
}

pub async fn login_admin(client: &Client) -> (User, Cookie<'static>) {
    login(client, ADMIN_SUBJECT).await
}

/// Logs in `subject` and has the administrator give it `role`.
pub async fn login_as(
    client: &Client,
    admin_cookie: &Cookie<'static>,
    subject: &str,
    role: UserRole,
) -> (User, Cookie<'static>) {
    let (user, cookie) = login(client, subject).await;
    if role == UserRole::Occupant {
        return (user, cookie);
    }

    let url = format!("/api/1/Users/{}", user.id);
    let response = client
        .put(&url)
        .cookie(admin_cookie.clone())
        .json(&json!({ "role": role }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let user: User = response.into_json().await.expect("valid user JSON");
    assert_eq!(user.role, role);
    (user, cookie)
}

pub async fn create_building(client: &Client, admin_cookie: &Cookie<'static>, name: &str) -> Building {
    let response = client
        .post("/api/1/Buildings")
        .cookie(admin_cookie.clone())
        .json(&json!({ "name": name, "description": null, "image_url": null }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    response.into_json().await.expect("valid building JSON")
}

pub async fn grant(client: &Client, admin_cookie: &Cookie<'static>, user_id: i32, building_id: i32) {
    let url = format!("/api/1/Buildings/{}/Access", building_id);
    let response = client
        .post(&url)
        .cookie(admin_cookie.clone())
        .json(&json!({ "user_id": user_id }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
}

/// GETs a `{"value": [...]}` listing and returns the array.
pub async fn get_list(client: &Client, cookie: &Cookie<'static>, uri: &str) -> Vec<Value> {
    let response = client.get(uri).cookie(cookie.clone()).dispatch().await;
    assert_eq!(response.status(), Status::Ok, "GET {}", uri);
    let body: Value = response.into_json().await.expect("valid JSON");
    body["value"].as_array().expect("value array").clone()
}

pub fn ids(items: &[Value]) -> Vec<i64> {
    items.iter().map(|v| v["id"].as_i64().expect("id")).collect()
}
