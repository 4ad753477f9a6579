use std::sync::Arc;

use adcast_model::ModelBundle;
use tokio::sync::RwLock;

/// The live model bundle, shared by every request.
///
/// Readers take a cheap `Arc` clone and release the lock before predicting, so
/// a reload never waits on in-flight predictions and a request never sees a
/// schema from one run paired with models from another.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    current: Arc<RwLock<Arc<ModelBundle>>>,
}

impl ModelRegistry {
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(bundle))),
        }
    }

    pub async fn current(&self) -> Arc<ModelBundle> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the bundle whole; returns the one it replaced.
    pub async fn swap(&self, bundle: ModelBundle) -> Arc<ModelBundle> {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, Arc::new(bundle))
    }
}
