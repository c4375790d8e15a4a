use std::sync::Arc;

use clientmgr::{ClientRegistry, RegistryError, get_typed_client};

use crate::client::StatusClient;

/// Status client registered under `name` in `registry`.
///
/// # Errors
/// [`RegistryError::NotFound`], or [`RegistryError::TypeMismatch`] when `name` holds a
/// different kind of client.
pub fn get_status_client(
    registry: &ClientRegistry,
    name: &str,
) -> Result<Arc<StatusClient>, RegistryError> {
    registry.get_typed::<StatusClient>(name)
}

/// Status client registered under `name` in the global registry.
///
/// # Errors
/// [`RegistryError::NotInitialized`] before the global registry exists, otherwise as
/// [`get_status_client`].
pub fn global_status_client(name: &str) -> Result<Arc<StatusClient>, RegistryError> {
    get_typed_client::<StatusClient>(name)
}
