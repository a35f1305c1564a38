#[macro_use]
mod sql_enum;

pub mod building;
pub mod deviation;
pub mod fire_inspection;
pub mod json_column;
pub mod maintenance_schedule;
pub mod session;
pub mod substance;
pub mod user;

// Re-export models for easier access
pub use building::*;
pub use deviation::*;
pub use fire_inspection::*;
pub use maintenance_schedule::*;
pub use session::*;
pub use substance::*;
pub use user::*;
