pub mod app;
pub mod assistant;
pub mod config;
pub mod coordinator;
pub mod datasource;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod layout;
pub mod models;
pub mod notices;
pub mod render;
pub mod selection;
pub mod series;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use coordinator::{DashboardView, SharedView};
pub use state::AppState;
