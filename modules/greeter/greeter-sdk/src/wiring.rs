use std::sync::Arc;

use clientmgr::{ClientRegistry, RegistryError, get_typed_client};

use crate::client::GreeterClient;

/// Greeter client registered under `name` in `registry`.
///
/// # Errors
/// [`RegistryError::NotFound`] or [`RegistryError::TypeMismatch`].
pub fn get_greeter_client(
    registry: &ClientRegistry,
    name: &str,
) -> Result<Arc<GreeterClient>, RegistryError> {
    registry.get_typed::<GreeterClient>(name)
}

/// Greeter client registered under `name` in the global registry.
///
/// # Errors
/// [`RegistryError::NotInitialized`], [`RegistryError::NotFound`] or
/// [`RegistryError::TypeMismatch`].
pub fn global_greeter_client(name: &str) -> Result<Arc<GreeterClient>, RegistryError> {
    get_typed_client::<GreeterClient>(name)
}
