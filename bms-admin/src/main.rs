/*!
 * BMS Administrative CLI Utility
 *
 * Command-line management of a bms-api SQLite database: users and their
 * roles, buildings, and building access grants. All database work goes
 * through the `bms_api::orm` and `bms_api::resolver` functions so the CLI
 * sees the same rules as the HTTP API.
 *
 * Run with --help for the available commands.
 */

mod admin_cli;

use clap::{Parser, Subcommand};

use admin_cli::access_commands::{AccessAction, handle_access_command_with_conn};
use admin_cli::building_commands::{BuildingAction, handle_building_command_with_conn};
use admin_cli::user_commands::{UserAction, handle_user_command_with_conn};
use admin_cli::utils::{establish_connection, get_or_create_operator_user};

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[command(name = "bms-admin")]
#[command(about = "Administrative CLI for BMS database management")]
#[command(version)]
struct Cli {
    /// Show extended version information
    #[arg(long, action = clap::ArgAction::SetTrue)]
    version_info: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    Building {
        #[command(subcommand)]
        action: BuildingAction,
    },
    Access {
        #[command(subcommand)]
        action: AccessAction,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.version_info {
        println!("bms-admin {}", built_info::PKG_VERSION);
        println!("Built: {}", built_info::BUILT_TIME_UTC);
        if let Some(commit) = built_info::GIT_COMMIT_HASH {
            println!("Git commit: {}", commit);
        }
        return Ok(());
    }

    let Some(command) = cli.command else {
        return Err("No command given. Run with --help for usage.".into());
    };

    let mut conn = establish_connection()?;
    match command {
        Commands::User { action } => handle_user_command_with_conn(&mut conn, action)?,
        Commands::Building { action } => {
            let operator_id = get_or_create_operator_user(&mut conn)?;
            handle_building_command_with_conn(&mut conn, action, operator_id)?
        }
        Commands::Access { action } => {
            let operator_id = get_or_create_operator_user(&mut conn)?;
            handle_access_command_with_conn(&mut conn, action, operator_id)?
        }
    }

    Ok(())
}
