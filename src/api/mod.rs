// HTTP surface: the dashboard page and its JSON endpoints

pub mod server;
pub mod state;

pub use server::{routes, DashboardServer, INDEX_HTML};
pub use state::AppState;
