// src/workflow/loading.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared in-flight request counter behind the UI's loading indicator.
#[derive(Debug, Clone, Default)]
pub struct LoadingState(Arc<AtomicUsize>);

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }

    /// Marks one request in flight until the guard drops, including when
    /// the calling future is abandoned mid-request.
    pub fn begin(&self) -> LoadingGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(self.0.clone())
    }
}

#[derive(Debug)]
pub struct LoadingGuard(Arc<AtomicUsize>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
