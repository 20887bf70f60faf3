//! Save Backup Server Library
//!
//! Tracks game save directories, archives them on demand and records a
//! checksum of each backed-up directory.

pub mod config;
pub mod error;
pub mod fs;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;
