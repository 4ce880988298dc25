use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::backup::BackupService;
use crate::config::Config;
use crate::editor::{Persister, PresetCatalog, SharedWorkspace, Workspace};
use crate::export::{BoxRasterizer, DirectorySink, ExportPipeline, HtmlPrintHost, PrintController};
use crate::notify::{SharedReporter, TracingReporter};
use crate::storage::{KeyValueStore, StorageError};
use crate::templates::RenderBoundary;
use crate::validation::FormValidator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub workspace: SharedWorkspace,
    pub persister: Arc<Persister>,
    pub presets: Arc<PresetCatalog>,
    /// One failure boundary per previewed document.
    pub boundaries: Arc<Mutex<HashMap<String, RenderBoundary>>>,
    /// Profile form state per document, so touched fields persist across requests.
    pub validators: Arc<Mutex<HashMap<String, FormValidator>>>,
    pub exporter: Arc<ExportPipeline>,
    pub printer: Arc<PrintController>,
    pub backup: Arc<BackupService>,
    pub reporter: SharedReporter,
}

impl AppState {
    /// Wires every service around `store` and loads the persisted workspace.
    pub async fn build(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let reporter: SharedReporter = Arc::new(TracingReporter);
        let sink = Arc::new(DirectorySink::new(&config.export_dir));
        let workspace = Workspace::load(store.as_ref()).await?;

        Ok(AppState {
            workspace: Arc::new(RwLock::new(workspace)),
            persister: Arc::new(Persister::new(Arc::clone(&store), config.persist_debounce)),
            presets: Arc::new(PresetCatalog::new(config.presets_path.clone())),
            boundaries: Arc::new(Mutex::new(HashMap::new())),
            validators: Arc::new(Mutex::new(HashMap::new())),
            exporter: Arc::new(ExportPipeline::new(
                Arc::new(BoxRasterizer),
                sink.clone(),
                Arc::clone(&reporter),
            )),
            printer: Arc::new(PrintController::new(
                Arc::new(HtmlPrintHost::new(&config.export_dir)),
                Arc::clone(&reporter),
            )),
            backup: Arc::new(BackupService::new(
                Arc::clone(&store),
                sink,
                Arc::clone(&reporter),
            )),
            store,
            reporter,
        })
    }

    /// Schedules a debounced write of the workspace.
    pub fn persist(&self) {
        self.persister.schedule(&self.workspace);
    }

    /// Re-reads the workspace from the store, discarding in-memory sessions.
    pub async fn reload(&self) -> Result<(), StorageError> {
        self.persister.cancel();
        let fresh = Workspace::load(self.store.as_ref()).await?;
        *self.workspace.write().await = fresh;
        self.boundaries.lock().await.clear();
        self.validators.lock().await.clear();
        Ok(())
    }
}
