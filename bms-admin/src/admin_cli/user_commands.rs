use clap::Subcommand;
use diesel::sqlite::SqliteConnection;

use bms_api::models::{User, UserRole};
use bms_api::orm::user::{get_user, list_all_users, set_user_role};

use super::utils::search_matcher;

#[derive(Subcommand)]
pub enum UserAction {
    #[command(about = "List users, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term matched against email (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
    },
    #[command(about = "Change the role of a user")]
    SetRole {
        #[arg(short, long, help = "User ID")]
        id: i32,
        #[arg(
            short,
            long,
            help = "New role: occupant, buildingWorker or companyAdministrator"
        )]
        role: String,
    },
}

pub fn handle_user_command_with_conn(
    conn: &mut SqliteConnection,
    action: UserAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserAction::Ls {
            search_term,
            fixed_string,
        } => {
            let users = list_users_impl(conn, search_term.as_deref(), fixed_string)?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("Users:");
                for user in users {
                    println!(
                        "  ID: {}, Email: {}, Name: {} {}, Role: {}, Subject: {}",
                        user.id,
                        user.email,
                        user.first_name,
                        user.last_name,
                        user.role,
                        user.external_id
                    );
                }
            }
        }
        UserAction::SetRole { id, role } => {
            let user = set_role_impl(conn, id, &role)?;
            println!("User {} ({}) is now {}", user.id, user.email, user.role);
        }
    }
    Ok(())
}

pub fn list_users_impl(
    conn: &mut SqliteConnection,
    search_term: Option<&str>,
    fixed_string: bool,
) -> Result<Vec<User>, Box<dyn std::error::Error>> {
    let users = list_all_users(conn)?;
    match search_term {
        Some(term) => {
            let matches = search_matcher(term, fixed_string)?;
            Ok(users.into_iter().filter(|u| matches(&u.email)).collect())
        }
        None => Ok(users),
    }
}

pub fn set_role_impl(
    conn: &mut SqliteConnection,
    user_id: i32,
    role_name: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    let role = role_name.parse::<UserRole>()?;
    if get_user(conn, user_id)?.is_none() {
        return Err(format!("User with ID {} does not exist", user_id).into());
    }
    Ok(set_user_role(conn, user_id, role)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bms_api::orm::testing::{insert_test_user, setup_test_db};

    #[test]
    fn test_list_users_with_filters() {
        let mut conn = setup_test_db();
        insert_test_user(&mut conn, "idp|anna", UserRole::Occupant);
        insert_test_user(&mut conn, "idp|bert", UserRole::BuildingWorker);

        let all = list_users_impl(&mut conn, None, false).unwrap();
        assert_eq!(all.len(), 2);

        let regex = list_users_impl(&mut conn, Some("^idp\\.b"), false).unwrap();
        assert_eq!(regex.len(), 1);
        assert_eq!(regex[0].external_id, "idp|bert");

        let fixed = list_users_impl(&mut conn, Some("anna@"), true).unwrap();
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].external_id, "idp|anna");

        assert!(list_users_impl(&mut conn, Some("[bad"), false).is_err());
    }

    #[test]
    fn test_set_role() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "idp|carl", UserRole::Occupant);

        let updated = set_role_impl(&mut conn, user.id, "buildingWorker").unwrap();
        assert_eq!(updated.role, UserRole::BuildingWorker);

        assert!(set_role_impl(&mut conn, user.id, "janitor").is_err());
        assert!(set_role_impl(&mut conn, 9999, "occupant").is_err());
    }

    #[test]
    fn test_handle_user_command_with_conn_set_role() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "idp|dora", UserRole::Occupant);

        let action = UserAction::SetRole {
            id: user.id,
            role: "companyAdministrator".to_string(),
        };
        handle_user_command_with_conn(&mut conn, action).unwrap();

        let user = get_user(&mut conn, user.id).unwrap().unwrap();
        assert_eq!(user.role, UserRole::CompanyAdministrator);
    }
}
