pub mod config;
pub mod error;

pub use self::config::Settings;
pub use self::error::{DashboardError, DashboardResult};
