//! Background Removal API library
//!
//! Modules:
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `pipeline`: Upload validation, resizing, compositing, and PNG encoding.
//! - `session`: Shared inference session lifecycle and the ONNX backend.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `AppError`,
//! `SessionManager`, and the `RemovalSession` seam.
pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use session::{RemovalSession, SessionManager};
