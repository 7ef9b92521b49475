pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Config;
pub use state::AppState;
