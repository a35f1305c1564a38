pub mod access_commands;
pub mod building_commands;
pub mod user_commands;
pub mod utils;
