//! Lifecycle of the single shared inference session.
//!
//! Model load is expensive, so it happens at most once per process. The
//! session lives in a `OnceLock`, so once it is ready every fetch is a
//! lock-free read plus an `Arc` clone. The mutex only serializes the
//! check-create-warm-up sequence, so concurrent first requests trigger
//! exactly one construction. A failed initialization is not terminal; any
//! later call retries it.
use std::sync::{Arc, Mutex, OnceLock};

use image::{DynamicImage, Rgb, RgbImage};

use super::RemovalSession;
use crate::error::AppResult;

/// Builds a session on demand. Injected so tests can count or fail
/// constructions.
pub type SessionFactory = Box<dyn Fn() -> AppResult<Arc<dyn RemovalSession>> + Send + Sync>;

pub struct SessionManager {
    slot: OnceLock<Arc<dyn RemovalSession>>,
    init: Mutex<()>,
    factory: SessionFactory,
}

impl SessionManager {
    pub fn new(factory: SessionFactory) -> Self {
        SessionManager {
            slot: OnceLock::new(),
            init: Mutex::new(()),
            factory,
        }
    }

    /// Readiness without side effects, for the health endpoint.
    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Initialize the session if it is not already, returning readiness.
    ///
    /// The critical section covers construction plus a warm-up inference on a
    /// small synthetic image, so lazy loading inside the runtime is forced
    /// before the session becomes visible to requests.
    pub fn ensure_ready(&self) -> bool {
        if self.is_ready() {
            return true;
        }
        let _guard = self.init.lock().unwrap_or_else(|e| e.into_inner());
        // Another worker may have finished while we waited on the lock.
        if self.is_ready() {
            return true;
        }
        tracing::info!("Initializing inference session");
        let session = match (self.factory)() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Session initialization failed: {}", e.message());
                return false;
            }
        };
        let probe = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 255, 255])));
        if let Err(e) = session.remove(&probe) {
            tracing::warn!("Session warm-up failed: {}", e.message());
            return false;
        }
        // Only reachable under the init lock, so the slot is still empty.
        let _ = self.slot.set(session);
        tracing::info!("Inference session ready");
        true
    }

    /// The shared session, initializing it first if needed. After the first
    /// success this is a plain atomic read.
    pub fn get_session(&self) -> Option<Arc<dyn RemovalSession>> {
        if let Some(session) = self.slot.get() {
            return Some(session.clone());
        }
        if !self.ensure_ready() {
            return None;
        }
        self.slot.get().cloned()
    }
}
