use diesel::{prelude::*, sqlite::SqliteConnection};
use dotenvy::dotenv;
use regex::Regex;

use bms_api::admin_init_fairing::ensure_admin_user;
use bms_api::orm::{run_pending_migrations, set_foreign_keys};

pub fn establish_connection() -> Result<SqliteConnection, Box<dyn std::error::Error>> {
    dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let mut conn = SqliteConnection::establish(&database_url)?;
    set_foreign_keys(&mut conn);
    run_pending_migrations(&mut conn);
    Ok(conn)
}

/// Subject id recorded for changes made from this CLI by `username`.
pub fn operator_subject(username: &str) -> String {
    format!("cli:{}", username)
}

/// Get or create the administrator that stands for the current system user.
/// Grants and buildings created from the CLI are attributed to it.
pub fn get_or_create_operator_user(
    conn: &mut SqliteConnection,
) -> Result<i32, Box<dyn std::error::Error>> {
    let username = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "admin".to_string());
    operator_user_id(conn, &username)
}

pub fn operator_user_id(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<i32, Box<dyn std::error::Error>> {
    let subject = operator_subject(username);
    let email = format!("{}@localhost", username);
    let user = ensure_admin_user(conn, &subject, &email)?;
    Ok(user.id)
}

/// Builds a predicate for `ls`/`rm` search terms: a regex by default, or a
/// plain substring match with `fixed_string`.
pub fn search_matcher(
    term: &str,
    fixed_string: bool,
) -> Result<Box<dyn Fn(&str) -> bool>, Box<dyn std::error::Error>> {
    if fixed_string {
        let term = term.to_string();
        Ok(Box::new(move |candidate: &str| candidate.contains(&term)))
    } else {
        let regex = Regex::new(term)
            .map_err(|e| format!("Invalid regex pattern '{}': {}", term, e))?;
        Ok(Box::new(move |candidate: &str| regex.is_match(candidate)))
    }
}
