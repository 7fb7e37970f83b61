//! Process-wide detection runtime.
//!
//! The runtime is created lazily on first use and memoized for the lifetime of
//! the process. Threads that race on first use block inside
//! [`OnceLock::get_or_init`] until initialization finishes, so a submission is
//! deferred rather than failed while the runtime comes up. Once initialized
//! it is only read.
//!
//! With the `rayon` feature the runtime owns the thread pool that row-parallel
//! detectors run on. If the pool cannot be created, detection falls back to
//! the calling thread.

use crate::trace::trace_event;
#[cfg(feature = "rayon")]
use crate::trace::trace_warn;
use std::sync::OnceLock;

static RUNTIME: OnceLock<DetectorRuntime> = OnceLock::new();

/// Shared execution resources for detectors.
#[derive(Debug)]
pub struct DetectorRuntime {
    #[cfg(feature = "rayon")]
    pool: Option<rayon::ThreadPool>,
    threads: usize,
}

impl DetectorRuntime {
    #[cfg(feature = "rayon")]
    fn init() -> Self {
        let built = rayon::ThreadPoolBuilder::new()
            .thread_name(|idx| format!("magsnap-detect-{idx}"))
            .build();
        let pool = match built {
            Ok(pool) => Some(pool),
            Err(err) => {
                let reason = err.to_string();
                trace_warn!("runtime_pool_unavailable", reason = reason.as_str());
                None
            }
        };
        let threads = pool.as_ref().map_or(1, |p| p.current_num_threads());
        trace_event!("runtime_initialized", threads = threads);
        Self { pool, threads }
    }

    #[cfg(not(feature = "rayon"))]
    fn init() -> Self {
        trace_event!("runtime_initialized", threads = 1usize);
        Self { threads: 1 }
    }

    /// Number of threads detection work may be spread over.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs `op` inside the runtime (on the pool when one exists).
    #[cfg(feature = "rayon")]
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Runs `op` inside the runtime.
    #[cfg(not(feature = "rayon"))]
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        op()
    }
}

/// Returns the process-wide runtime, initializing it on first call.
pub fn runtime() -> &'static DetectorRuntime {
    RUNTIME.get_or_init(DetectorRuntime::init)
}

/// True once [`runtime`] has completed initialization.
pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::{is_initialized, runtime};

    #[test]
    fn runtime_is_memoized() {
        let first = runtime() as *const _;
        let second = runtime() as *const _;
        assert_eq!(first, second);
        assert!(is_initialized());
        assert!(runtime().threads() >= 1);
    }

    #[test]
    fn install_returns_closure_value() {
        assert_eq!(runtime().install(|| 6 * 7), 42);
    }
}
