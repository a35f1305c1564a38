pub mod building;
mod db;
pub mod deviation;
pub mod fire_inspection;
pub mod login;
pub mod logout;
pub mod maintenance_schedule;
pub mod substance;
pub mod testing;
pub mod user;

pub use db::*;
