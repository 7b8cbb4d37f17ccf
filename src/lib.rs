pub mod app;
pub mod auth;
pub mod bookings;
pub mod cars;
pub mod config;
pub mod error;
pub mod extractors;
pub mod images;
pub mod mailer;
pub mod state;
pub mod storage;
pub mod travel;

pub use app::build_app;
pub use state::AppState;
