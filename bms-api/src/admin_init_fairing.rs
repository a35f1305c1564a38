use diesel::prelude::*;
use dotenvy::dotenv;
use rocket::fairing::AdHoc;

use crate::models::{User, UserInput, UserRole};
use crate::orm::DbConn;
use crate::orm::user::{get_user_by_external_id, insert_user, set_user_role};

/// Ensure the bootstrap administrator exists.
///
/// The account is keyed on the identity-provider subject in
/// BMS_DEFAULT_ADMIN_EXTERNAL_ID and created with the email in
/// BMS_DEFAULT_EMAIL. An existing account with a lesser role is promoted.
pub fn admin_init_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Admin User Initialization", |rocket| async {
        dotenv().ok();

        let conn = match DbConn::get_one(&rocket).await {
            Some(conn) => conn,
            None => {
                error!("[admin-init] ERROR: Could not get DB connection.");
                return Err(rocket);
            }
        };

        let subject = get_admin_external_id();
        let admin_email = get_admin_email();
        match conn
            .run(move |c| ensure_admin_user(c, &subject, &admin_email))
            .await
        {
            Ok(_) => Ok(rocket),
            Err(e) => {
                error!("[admin-init] FATAL: Admin user creation failed: {:?}", e);
                Err(rocket)
            }
        }
    })
}

fn get_admin_external_id() -> String {
    std::env::var("BMS_DEFAULT_ADMIN_EXTERNAL_ID").unwrap_or_else(|_| "bootstrap-admin".to_string())
}

fn get_admin_email() -> String {
    std::env::var("BMS_DEFAULT_EMAIL").unwrap_or_else(|_| "superadmin@example.com".to_string())
}

/// Creates or promotes the administrator with the given subject id.
pub fn ensure_admin_user(
    c: &mut SqliteConnection,
    subject: &str,
    admin_email: &str,
) -> Result<User, diesel::result::Error> {
    match get_user_by_external_id(c, subject)? {
        Some(user) if user.role.is_administrator() => {
            info!("[admin-init] Admin user '{}' already exists", subject);
            Ok(user)
        }
        Some(user) => {
            info!(
                "[admin-init] Promoting '{}' from {} to {}",
                subject,
                user.role,
                UserRole::CompanyAdministrator
            );
            set_user_role(c, user.id, UserRole::CompanyAdministrator)
        }
        None => {
            let user = insert_user(
                c,
                UserInput {
                    external_id: subject.to_string(),
                    email: admin_email.to_string(),
                    first_name: "Admin".to_string(),
                    last_name: String::new(),
                    role: UserRole::CompanyAdministrator,
                    phone_number: None,
                },
            )?;
            info!("[admin-init] Created admin user: '{}'", subject);
            Ok(user)
        }
    }
}
