// Secrets module.
// Memoizing secret provider over pluggable secret stores.

pub mod provider;
pub mod store;

pub use provider::SecretProvider;
pub use store::{EnvSecretStore, ExtensionSecretStore, SecretStore};
