//! HTTP boundary: one multipart upload endpoint in front of the
//! statement pipeline, with an explicit start/stop lifecycle so a host
//! process can embed the server.

pub mod lifecycle;
pub mod routes;
pub mod state;
pub mod upload;

pub use lifecycle::ServerHandle;
pub use routes::{create_router, MAX_UPLOAD_BYTES};
pub use state::{AppState, Settings};
