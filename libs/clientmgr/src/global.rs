//! Process-wide registry cell.
//!
//! Only binaries should reach for this; libraries take a `&ClientRegistry` parameter.

use std::sync::{Arc, OnceLock};

use clientmgr_transport::{DialOptions, Logger};

use crate::contract::RpcClient;
use crate::error::RegistryError;
use crate::registry::ClientRegistry;

static GLOBAL: OnceLock<Arc<ClientRegistry>> = OnceLock::new();

/// Creates the global registry if none exists yet and returns it.
///
/// The first caller wins; later calls return the existing registry and ignore `logger`.
pub fn init_global(logger: Logger) -> Arc<ClientRegistry> {
    init_global_with_options(logger, DialOptions::default())
}

/// [`init_global`] with explicit dial options.
pub fn init_global_with_options(logger: Logger, options: DialOptions) -> Arc<ClientRegistry> {
    Arc::clone(GLOBAL.get_or_init(|| {
        tracing::debug!(parent: logger.span(), "global client registry initialized");
        Arc::new(ClientRegistry::with_options(logger, options))
    }))
}

/// The global registry.
///
/// # Errors
/// Returns [`RegistryError::NotInitialized`] before [`init_global`] has run.
pub fn global_registry() -> Result<Arc<ClientRegistry>, RegistryError> {
    GLOBAL.get().cloned().ok_or(RegistryError::NotInitialized)
}

/// Client `name` from the global registry, downcast to `C`.
///
/// # Errors
/// Returns [`RegistryError::NotInitialized`], [`RegistryError::NotFound`] or
/// [`RegistryError::TypeMismatch`].
pub fn get_typed_client<C: RpcClient>(name: &str) -> Result<Arc<C>, RegistryError> {
    global_registry()?.get_typed::<C>(name)
}
