use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::editor::loader::load_with_retry;
use crate::models::presets::{builtin_presets, Preset};

#[derive(Debug, Clone, Serialize)]
pub struct PresetInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Built-in presets plus an optional external preset table.
///
/// The external table is read on first use. A load that exhausts its retries
/// is not cached, so the next request tries again.
pub struct PresetCatalog {
    builtin: Vec<Preset>,
    external_path: Option<PathBuf>,
    external: OnceCell<Vec<Preset>>,
}

impl PresetCatalog {
    pub fn new(external_path: Option<PathBuf>) -> Self {
        Self {
            builtin: builtin_presets(),
            external_path,
            external: OnceCell::new(),
        }
    }

    pub async fn all(&self) -> Vec<Preset> {
        let mut presets = self.builtin.clone();
        for preset in self.external().await {
            if presets.iter().any(|p| p.id == preset.id) {
                warn!(preset = %preset.id, "external preset shadows a built-in one, skipped");
                continue;
            }
            presets.push(preset.clone());
        }
        presets
    }

    pub async fn infos(&self) -> Vec<PresetInfo> {
        self.all()
            .await
            .into_iter()
            .map(|p| PresetInfo {
                id: p.id,
                name: p.name,
                description: p.description,
            })
            .collect()
    }

    pub async fn find(&self, id: &str) -> Option<Preset> {
        if let Some(preset) = self.builtin.iter().find(|p| p.id == id) {
            return Some(preset.clone());
        }
        self.external().await.iter().find(|p| p.id == id).cloned()
    }

    async fn external(&self) -> &[Preset] {
        let Some(path) = &self.external_path else {
            return &[];
        };
        let loaded = self
            .external
            .get_or_try_init(|| load_with_retry("presets", || read_presets(path.clone())))
            .await;
        match loaded {
            Ok(presets) => presets.as_slice(),
            Err(e) => {
                warn!("{e}");
                &[]
            }
        }
    }
}

async fn read_presets(path: PathBuf) -> Result<Vec<Preset>, String> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| format!("{}: {e}", path.display()))?;
    let presets: Vec<Preset> = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    let valid: Vec<Preset> = presets
        .into_iter()
        .filter(|p| match p.data.check() {
            Ok(()) => true,
            Err(e) => {
                warn!(preset = %p.id, "invalid preset skipped: {e}");
                false
            }
        })
        .collect();
    info!(count = valid.len(), path = %path.display(), "external presets loaded");
    Ok(valid)
}
