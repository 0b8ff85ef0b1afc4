//! Lazily initialized compute service sharing one engine between callers.
//!
//! ```
//! use gpviz::{EngineConfig, GpService};
//!
//! let service = GpService::new(EngineConfig::default());
//! assert!(!service.is_ready());
//! service.engine().expect("engine initialization");
//! assert!(service.is_ready());
//! ```
use crate::engine::{Engine, EngineConfig};
use crate::errors::Result;
use log::info;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lazily initialized [`Engine`] shared by concurrent callers.
///
/// The engine is built on first use only: concurrent first callers wait for a single
/// initialization and all observe the same engine. A failed initialization leaves
/// the service uninitialized so that a later call may retry.
#[derive(Debug)]
pub struct GpService {
    config: EngineConfig,
    engine: OnceCell<Engine>,
    initializations: AtomicUsize,
}

impl GpService {
    /// Service which builds its engine with `config` on first use
    pub fn new(config: EngineConfig) -> Self {
        GpService {
            config,
            engine: OnceCell::new(),
            initializations: AtomicUsize::new(0),
        }
    }

    /// The engine, initialized on first call
    pub fn engine(&self) -> Result<&Engine> {
        self.engine.get_or_try_init(|| {
            self.initializations.fetch_add(1, Ordering::SeqCst);
            info!("Initializing GP engine");
            Engine::new(self.config.clone())
        })
    }

    /// Whether the engine is initialized
    pub fn is_ready(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Number of initialization attempts
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}

impl Default for GpService {
    fn default() -> Self {
        GpService::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_lazy_init() {
        let service = GpService::default();
        assert!(!service.is_ready());
        let first = service.engine().unwrap() as *const Engine;
        let second = service.engine().unwrap() as *const Engine;
        assert!(service.is_ready());
        assert_eq!(first, second);
        assert_eq!(service.initializations(), 1);
    }

    #[test]
    fn test_single_flight_init() {
        let service = Arc::new(GpService::default());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (service, barrier) = (Arc::clone(&service), Arc::clone(&barrier));
                std::thread::spawn(move || {
                    barrier.wait();
                    service.engine().map(|e| e as *const Engine as usize).unwrap()
                })
            })
            .collect();
        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(service.initializations(), 1);
    }

    #[test]
    fn test_failed_init_is_retried() {
        let service = GpService::new(EngineConfig::default().jitter(f64::NAN));
        assert!(service.engine().is_err());
        assert!(service.engine().is_err());
        assert!(!service.is_ready());
        assert_eq!(service.initializations(), 2);
    }
}
