//! Shared inference session: the trait seam, the singleton manager, and the
//! ONNX Runtime-backed implementation.
pub mod manager;
pub mod onnx;

pub use manager::{SessionFactory, SessionManager};
pub use onnx::OnnxSession;

use image::{DynamicImage, RgbaImage};

use crate::error::AppResult;

/// A loaded, warmed-up background-removal model.
///
/// Implementations return the input image with background pixels rendered
/// transparent. The trait is the seam that lets tests substitute a stub for
/// the real inference runtime.
pub trait RemovalSession: Send + Sync {
    fn remove(&self, image: &DynamicImage) -> AppResult<RgbaImage>;
}
