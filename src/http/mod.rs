//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID for logs and responses)
//!     → handlers.rs (multipart upload → job → worker, or file retrieval)
//!     → response.rs (JSON verdict) / crate::error (JSON error)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::PhotoResult;
pub use server::{AppState, HttpServer};
