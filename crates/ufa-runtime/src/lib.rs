//! # UFA Runtime
//!
//! Standalone host for the UFA chaincode.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + `UFA_*` environment)
//! 2. Open the store: file-backed when `UFA_STORE_PATH` is set (taking the
//!    store lock), in-memory otherwise
//! 3. Run the one-time setup if the master index is absent
//! 4. Serve line-delimited JSON commands until end of input or Ctrl+C
//!
//! ## Modules
//!
//! - `config` - environment overlay
//! - `session` - request/response protocol
//! - `store_lock` - single-writer guard for file-backed stores

pub mod config;
pub mod session;
pub mod store_lock;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use ufa_chaincode::adapters::{
    CommandDispatcher, FileBackedStateStore, InMemoryStateStore, SystemClock,
};
use ufa_chaincode::ports::StateAccessor;
use ufa_chaincode::service::UfaChaincodeService;

pub use config::RuntimeConfig;
pub use store_lock::{LockError, StoreLock};

/// Service type hosted by the runtime.
pub type HostedService = UfaChaincodeService<Arc<dyn StateAccessor>, SystemClock>;

/// A booted chaincode ready to serve commands.
pub struct UfaRuntime {
    dispatcher: CommandDispatcher<HostedService>,
    // Held for the runtime's lifetime; released on drop.
    lock: Option<StoreLock>,
}

impl UfaRuntime {
    /// Open the configured store and make sure the master index exists.
    pub fn open(config: &RuntimeConfig) -> Result<Self> {
        let (state, lock) = match &config.store_path {
            Some(path) => {
                let lock = StoreLock::acquire(path)
                    .with_context(|| format!("locking store {}", path.display()))?;
                let store = FileBackedStateStore::open(path)
                    .with_context(|| format!("opening store {}", path.display()))?;
                info!(path = %path.display(), "Using file-backed store");
                let state: Arc<dyn StateAccessor> = Arc::new(store);
                (state, Some(lock))
            }
            None => {
                info!("Using in-memory store");
                let state: Arc<dyn StateAccessor> = Arc::new(InMemoryStateStore::new());
                (state, None)
            }
        };

        let service = UfaChaincodeService::new(state, SystemClock, config.service.clone());
        if service.is_initialized().context("checking master index")? {
            info!("Master index present, skipping setup");
        } else {
            service.initialize().context("initializing master index")?;
        }

        Ok(Self {
            dispatcher: CommandDispatcher::new(service),
            lock,
        })
    }

    /// Dispatcher over the hosted service.
    pub fn dispatcher(&self) -> &CommandDispatcher<HostedService> {
        &self.dispatcher
    }

    /// Store lock, when a file-backed store is in use.
    pub fn lock(&self) -> Option<&StoreLock> {
        self.lock.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ufa_chaincode::ports::UfaChaincodeApi;

    const AGREEMENT: &str = r#"{"netCharge":"500","chargeTolerance":"2"}"#;

    #[test]
    fn test_in_memory_runtime_is_initialized() {
        let runtime = UfaRuntime::open(&RuntimeConfig::default()).unwrap();

        assert!(runtime.lock().is_none());
        assert!(runtime.dispatcher().api().is_initialized().unwrap());
    }

    #[test]
    fn test_reopen_keeps_existing_agreements() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            store_path: Some(dir.path().join("state.bin")),
            ..RuntimeConfig::default()
        };

        {
            let runtime = UfaRuntime::open(&config).unwrap();
            assert!(runtime.lock().is_some());
            runtime
                .dispatcher()
                .api()
                .create_ufa("UFA-1", "SELLER", AGREEMENT)
                .unwrap();
        }

        let runtime = UfaRuntime::open(&config).unwrap();
        let all = runtime.dispatcher().api().get_all_ufa("SELLER").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].field("netCharge"), Some("500"));
    }

    #[test]
    fn test_second_runtime_on_same_store_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            store_path: Some(dir.path().join("state.bin")),
            ..RuntimeConfig::default()
        };

        let _first = UfaRuntime::open(&config).unwrap();
        let err = UfaRuntime::open(&config).err().unwrap();

        assert!(err.downcast_ref::<LockError>().is_some());
    }
}
