//! HTTP server, upload engine and admission control for depot.

pub mod admission;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod routes;
pub mod state;

pub use admission::AdmissionController;
pub use engine::UploadEngine;
pub use error::{ApiError, ApiResult};
pub use locks::UploadLocks;
pub use routes::create_router;
pub use state::AppState;
