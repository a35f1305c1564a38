use clap::Subcommand;
use diesel::sqlite::SqliteConnection;

use bms_api::models::{Building, BuildingAccess};
use bms_api::orm::building::get_building;
use bms_api::orm::user::get_user;
use bms_api::resolver::{grant_access, resolve_buildings_for_user, revoke_access};

#[derive(Subcommand)]
pub enum AccessAction {
    #[command(about = "Grant a user access to a building")]
    Grant {
        #[arg(short, long, help = "User ID")]
        user: i32,
        #[arg(short, long, help = "Building ID")]
        building: i32,
    },
    #[command(about = "Revoke one grant of a user for a building")]
    Revoke {
        #[arg(short, long, help = "User ID")]
        user: i32,
        #[arg(short, long, help = "Building ID")]
        building: i32,
    },
    #[command(about = "List the buildings a user can access")]
    Ls {
        #[arg(short, long, help = "User ID")]
        user: i32,
    },
}

pub fn handle_access_command_with_conn(
    conn: &mut SqliteConnection,
    action: AccessAction,
    operator_id: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AccessAction::Grant { user, building } => {
            let grant = grant_impl(conn, user, building, operator_id)?;
            println!(
                "Granted user {} access to building {} (grant ID: {})",
                grant.user_id, grant.building_id, grant.id
            );
        }
        AccessAction::Revoke { user, building } => {
            if revoke_impl(conn, user, building)? {
                println!("Revoked one grant of user {} for building {}", user, building);
            } else {
                println!("User {} holds no grant for building {}", user, building);
            }
        }
        AccessAction::Ls { user } => {
            let buildings = list_access_impl(conn, user)?;
            if buildings.is_empty() {
                println!("User {} has access to no buildings.", user);
            } else {
                println!("Buildings accessible to user {}:", user);
                for building in buildings {
                    println!("  ID: {}, Name: {}", building.id, building.name);
                }
            }
        }
    }
    Ok(())
}

/// Adds a grant after checking that both the user and the building exist.
pub fn grant_impl(
    conn: &mut SqliteConnection,
    user_id: i32,
    building_id: i32,
    operator_id: i32,
) -> Result<BuildingAccess, Box<dyn std::error::Error>> {
    if get_user(conn, user_id)?.is_none() {
        return Err(format!("User with ID {} does not exist", user_id).into());
    }
    if get_building(conn, building_id)?.is_none() {
        return Err(format!("Building with ID {} does not exist", building_id).into());
    }
    Ok(grant_access(conn, user_id, building_id, operator_id)?)
}

pub fn revoke_impl(
    conn: &mut SqliteConnection,
    user_id: i32,
    building_id: i32,
) -> Result<bool, Box<dyn std::error::Error>> {
    Ok(revoke_access(conn, user_id, building_id)? > 0)
}

pub fn list_access_impl(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Vec<Building>, Box<dyn std::error::Error>> {
    if get_user(conn, user_id)?.is_none() {
        return Err(format!("User with ID {} does not exist", user_id).into());
    }
    Ok(resolve_buildings_for_user(conn, user_id)?)
}
