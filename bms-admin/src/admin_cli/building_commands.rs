use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use std::io::{self, Write};

use bms_api::models::{Building, BuildingInput};
use bms_api::orm::building::{delete_building, insert_building, list_all_buildings};

use super::utils::search_matcher;

#[derive(Subcommand)]
pub enum BuildingAction {
    #[command(about = "List buildings, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term matched against the name (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
    },
    #[command(about = "Add a new building")]
    Add {
        #[arg(short, long, help = "Building name")]
        name: String,
        #[arg(short, long, help = "Building description")]
        description: Option<String>,
    },
    #[command(about = "Remove buildings matching search term")]
    Rm {
        #[arg(
            help = "Search term to match buildings for removal (regex by default, use -F for fixed string)"
        )]
        search_term: String,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
}

pub fn handle_building_command_with_conn(
    conn: &mut SqliteConnection,
    action: BuildingAction,
    operator_id: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        BuildingAction::Ls {
            search_term,
            fixed_string,
        } => {
            let buildings = list_buildings_impl(conn, search_term.as_deref(), fixed_string)?;
            if buildings.is_empty() {
                println!("No buildings found.");
            } else {
                println!("Buildings:");
                for building in buildings {
                    println!(
                        "  ID: {}, Name: {}, Description: {}, Created: {}",
                        building.id,
                        building.name,
                        building.description.as_deref().unwrap_or("-"),
                        building.created_at
                    );
                }
            }
        }
        BuildingAction::Add { name, description } => {
            let building = add_building_impl(conn, &name, description, operator_id)?;
            println!("Building created successfully!");
            println!("ID: {}", building.id);
            println!("Name: {}", building.name);
        }
        BuildingAction::Rm {
            search_term,
            fixed_string,
            yes,
        } => {
            remove_buildings_impl(conn, &search_term, fixed_string, yes)?;
        }
    }
    Ok(())
}

pub fn list_buildings_impl(
    conn: &mut SqliteConnection,
    search_term: Option<&str>,
    fixed_string: bool,
) -> Result<Vec<Building>, Box<dyn std::error::Error>> {
    let buildings = list_all_buildings(conn)?;
    match search_term {
        Some(term) => {
            let matches = search_matcher(term, fixed_string)?;
            Ok(buildings.into_iter().filter(|b| matches(&b.name)).collect())
        }
        None => Ok(buildings),
    }
}

pub fn add_building_impl(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<String>,
    operator_id: i32,
) -> Result<Building, Box<dyn std::error::Error>> {
    if name.trim().is_empty() {
        return Err("Building name must not be blank".into());
    }
    let input = BuildingInput {
        name: name.to_string(),
        description,
        image_url: None,
    };
    Ok(insert_building(conn, input, operator_id)?)
}

/// Deletes matching buildings and returns how many were removed. Grants,
/// substance associations and reports naming them are left in place.
pub fn remove_buildings_impl(
    conn: &mut SqliteConnection,
    search_term: &str,
    fixed_string: bool,
    yes: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    let matching = list_buildings_impl(conn, Some(search_term), fixed_string)?;

    if matching.is_empty() {
        println!("No buildings found matching the search term.");
        return Ok(0);
    }

    println!(
        "Found {} building(s) matching the search term:",
        matching.len()
    );
    for building in &matching {
        println!("  ID: {}, Name: {}", building.id, building.name);
    }

    if !yes {
        print!(
            "Are you sure you want to delete these {} building(s)? [y/N]: ",
            matching.len()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input != "y" && input != "yes" {
            println!("Operation cancelled.");
            return Ok(0);
        }
    }

    let mut deleted_count = 0;
    let mut errors = Vec::new();

    for building in matching {
        match delete_building(conn, building.id) {
            Ok(rows) if rows > 0 => {
                deleted_count += 1;
                println!("Deleted building: {} (ID: {})", building.name, building.id);
            }
            Ok(_) => {}
            Err(e) => errors.push(format!(
                "Failed to delete building {} (ID: {}): {}",
                building.name, building.id, e
            )),
        }
    }

    println!("Successfully deleted {} building(s).", deleted_count);

    if !errors.is_empty() {
        println!("Errors encountered:");
        for error in errors {
            println!("  {}", error);
        }
        return Err("Some deletions failed".into());
    }

    Ok(deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin_cli::utils::operator_user_id;
    use bms_api::orm::building::get_building;
    use bms_api::orm::testing::setup_test_db;
    use bms_api::resolver::{grant_access, list_access_for_building};

    #[test]
    fn test_add_and_list_buildings() {
        let mut conn = setup_test_db();
        let operator = operator_user_id(&mut conn, "tester").unwrap();

        let north = add_building_impl(&mut conn, "North Wing", None, operator).unwrap();
        add_building_impl(
            &mut conn,
            "South Wing",
            Some("Loading docks".to_string()),
            operator,
        )
        .unwrap();
        assert_eq!(north.created_by, operator);

        assert_eq!(list_buildings_impl(&mut conn, None, false).unwrap().len(), 2);
        let north_only = list_buildings_impl(&mut conn, Some("^North"), false).unwrap();
        assert_eq!(north_only.len(), 1);
        assert_eq!(north_only[0].id, north.id);

        assert!(add_building_impl(&mut conn, "  ", None, operator).is_err());
    }

    #[test]
    fn test_remove_buildings_keeps_grants() {
        let mut conn = setup_test_db();
        let operator = operator_user_id(&mut conn, "tester").unwrap();
        let depot = add_building_impl(&mut conn, "Depot", None, operator).unwrap();
        let office = add_building_impl(&mut conn, "Office", None, operator).unwrap();
        grant_access(&mut conn, operator, depot.id, operator).unwrap();

        let removed = remove_buildings_impl(&mut conn, "Depot", true, true).unwrap();
        assert_eq!(removed, 1);
        assert!(get_building(&mut conn, depot.id).unwrap().is_none());
        assert!(get_building(&mut conn, office.id).unwrap().is_some());
        assert_eq!(list_access_for_building(&mut conn, depot.id).unwrap().len(), 1);

        assert_eq!(remove_buildings_impl(&mut conn, "Nowhere", true, true).unwrap(), 0);
    }
}
