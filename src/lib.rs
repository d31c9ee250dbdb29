pub mod app;
pub mod config;
pub mod document;
pub mod errors;
pub mod handlers;
pub mod journey;
pub mod models;
pub mod projector;
pub mod selection;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use journey::JourneyStore;
pub use projector::ViewProjector;
pub use state::AppState;
