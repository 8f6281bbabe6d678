// Memoizing secret provider.
// Fetches each named secret at most once for the lifetime of the provider.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::Result;

use super::store::SecretStore;

/// Secret accessor shared by every invocation in a warm execution environment.
///
/// Values are never refreshed: a rotated secret is picked up only when the
/// process is recycled.
pub struct SecretProvider {
    store: Arc<dyn SecretStore>,
    memo: Mutex<HashMap<String, String>>,
}

impl fmt::Debug for SecretProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretProvider")
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

impl SecretProvider {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Get a secret by name, calling the store only on the first request.
    ///
    /// Store failures propagate unchanged and are not memoized.
    pub async fn get_secret(&self, name: &str) -> Result<String> {
        // Held across the fetch so concurrent callers never double-fetch.
        let mut memo = self.memo.lock().await;

        if let Some(value) = memo.get(name) {
            debug!(secret = name, "Returning memoized secret");
            return Ok(value.clone());
        }

        let value = self.store.fetch_secret(name).await.map_err(|e| {
            error!(secret = name, "Failed to retrieve secret: {e}");
            e
        })?;

        memo.insert(name.to_string(), value.clone());
        Ok(value)
    }
}
