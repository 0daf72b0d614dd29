//! Engineering college recommender.
//!
//! Ranks colleges a candidate qualifies for from a cutoff table, describes
//! historical admissions per college, and predicts a likely college with an
//! offline-trained classifier. See [`data`] for the table layer, [`predict`]
//! for inference and [`server`] for the HTTP surface.

pub mod config;
pub mod data;
pub mod error;
pub mod predict;
pub mod profile;
pub mod server;
pub mod state;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
