//! Live editing state: the workspace, its debounced persistence, presets
//! and lazily loaded resources.

pub mod catalog;
pub mod debounce;
pub mod loader;
pub mod workspace;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::storage::{KeyValueStore, StorageError, STORAGE_KEY};

pub use catalog::PresetCatalog;
pub use debounce::Debouncer;
pub use workspace::{Snapshot, Workspace, WorkspaceError};

pub type SharedWorkspace = Arc<RwLock<Workspace>>;

/// Writes the workspace blob after edits settle.
pub struct Persister {
    store: Arc<dyn KeyValueStore>,
    debouncer: Debouncer,
}

impl Persister {
    pub fn new(store: Arc<dyn KeyValueStore>, idle: Duration) -> Self {
        Self {
            store,
            debouncer: Debouncer::new(idle),
        }
    }

    /// Persists the workspace once no further edit arrives within the idle window.
    /// The blob is taken when the write fires, so it always reflects the latest state.
    pub fn schedule(&self, workspace: &SharedWorkspace) {
        let store = Arc::clone(&self.store);
        let workspace = Arc::clone(workspace);
        self.debouncer.call(move || async move {
            if let Err(e) = write(store.as_ref(), &*workspace.read().await).await {
                error!("persisting workspace failed: {e}");
            }
        });
    }

    /// Performs a scheduled write right away. Does nothing when none is pending.
    pub async fn flush(&self, workspace: &Workspace) -> Result<(), StorageError> {
        if !self.debouncer.cancel() {
            return Ok(());
        }
        write(self.store.as_ref(), workspace).await
    }

    /// Drops a scheduled write without persisting.
    pub fn cancel(&self) -> bool {
        self.debouncer.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

async fn write(store: &dyn KeyValueStore, workspace: &Workspace) -> Result<(), StorageError> {
    let blob = workspace.to_blob()?;
    store.set(STORAGE_KEY, &blob).await?;
    debug!(bytes = blob.len(), "workspace persisted");
    Ok(())
}
