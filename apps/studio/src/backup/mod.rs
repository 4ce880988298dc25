//! Whole-state backup and restore.
//!
//! A backup file is the persisted blob byte for byte. Import validates the
//! shape first and stores the original text untouched, so nothing is ever
//! re-serialized on the way through.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::export::ArtifactSink;
use crate::notify::{ReportKind, SharedReporter};
use crate::storage::{KeyValueStore, ONBOARDED_KEY, STORAGE_KEY};

const NO_DATA: &str = "没有可备份的数据";
const BACKUP_FAILED: &str = "备份失败，请重试";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// The exported JSON, for callers that stream it back out.
    #[serde(skip)]
    pub contents: Option<String>,
}

impl BackupResult {
    fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            path: None,
            filename: None,
            contents: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { reload_required: bool },
    InvalidJson(String),
    InvalidStructure(String),
    ReadFailed(String),
    SaveFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success: bool,
    pub message: String,
    pub reload_required: bool,
}

impl ImportOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportOutcome::Imported { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            ImportOutcome::Imported { .. } => "数据导入成功，页面将重新加载",
            ImportOutcome::InvalidJson(_) => "文件格式错误，请选择有效的JSON备份文件",
            ImportOutcome::InvalidStructure(_) => "备份文件结构无效",
            ImportOutcome::ReadFailed(_) => "读取文件失败，请重试",
            ImportOutcome::SaveFailed(_) => "导入失败，请重试",
        }
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            success: self.is_imported(),
            message: self.message().to_string(),
            reload_required: matches!(
                self,
                ImportOutcome::Imported {
                    reload_required: true
                }
            ),
        }
    }
}

/// `简历备份_YYYY-MM-DD.json` for `date`.
pub fn backup_filename_on(date: NaiveDate) -> String {
    format!("简历备份_{}.json", date.format("%Y-%m-%d"))
}

/// Checks `{ state: { resumes: { <id>: { id, profile, modules, .. } } } }`.
pub fn validate_backup_shape(value: &Value) -> Result<(), String> {
    let state = value
        .as_object()
        .ok_or("top level is not an object")?
        .get("state")
        .and_then(Value::as_object)
        .ok_or("missing `state` object")?;
    let resumes = state
        .get("resumes")
        .and_then(Value::as_object)
        .ok_or("missing `state.resumes` object")?;

    for (key, resume) in resumes {
        let resume = resume
            .as_object()
            .ok_or_else(|| format!("resume {key:?} is not an object"))?;
        for field in ["id", "profile", "modules"] {
            if !resume.contains_key(field) {
                return Err(format!("resume {key:?} is missing `{field}`"));
            }
        }
    }
    Ok(())
}

pub struct BackupService {
    store: Arc<dyn KeyValueStore>,
    sink: Arc<dyn ArtifactSink>,
    reporter: SharedReporter,
}

impl BackupService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        sink: Arc<dyn ArtifactSink>,
        reporter: SharedReporter,
    ) -> Self {
        Self {
            store,
            sink,
            reporter,
        }
    }

    pub async fn export_backup(&self) -> BackupResult {
        self.export_backup_on(Local::now().date_naive()).await
    }

    pub async fn export_backup_on(&self, today: NaiveDate) -> BackupResult {
        let blob = match self.store.get(STORAGE_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                self.reporter.report(ReportKind::Warning, NO_DATA);
                return BackupResult::failed(NO_DATA);
            }
            Err(e) => {
                warn!("backup read failed: {e}");
                self.reporter.report(ReportKind::Error, BACKUP_FAILED);
                return BackupResult::failed(BACKUP_FAILED);
            }
        };

        let filename = backup_filename_on(today);
        let sink = Arc::clone(&self.sink);
        let name = filename.clone();
        let bytes = blob.clone().into_bytes();
        let saved = tokio::task::spawn_blocking(move || sink.save(&name, &bytes)).await;
        match saved {
            Ok(Ok(path)) => {
                info!(path = %path.display(), "backup exported");
                self.reporter.report(ReportKind::Success, "备份已导出");
                BackupResult {
                    success: true,
                    message: "备份已导出".to_string(),
                    path: Some(path),
                    filename: Some(filename),
                    contents: Some(blob),
                }
            }
            Ok(Err(e)) => {
                warn!("backup write failed: {e}");
                self.reporter.report(ReportKind::Error, BACKUP_FAILED);
                BackupResult::failed(BACKUP_FAILED)
            }
            Err(e) => {
                warn!("backup task failed: {e}");
                self.reporter.report(ReportKind::Error, BACKUP_FAILED);
                BackupResult::failed(BACKUP_FAILED)
            }
        }
    }

    /// The export could not start because pending edits failed to persist.
    pub fn export_aborted(&self, reason: &str) -> BackupResult {
        warn!("backup export aborted: {reason}");
        self.reporter.report(ReportKind::Error, BACKUP_FAILED);
        BackupResult::failed(BACKUP_FAILED)
    }

    /// The import could not start because pending edits failed to persist.
    pub fn import_aborted(&self, reason: String) -> ImportOutcome {
        self.finish(ImportOutcome::SaveFailed(reason))
    }

    pub async fn import_backup(&self, path: &Path) -> ImportOutcome {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => self.import_backup_text(text).await,
            Err(e) => {
                warn!(path = %path.display(), "backup read failed: {e}");
                self.finish(ImportOutcome::ReadFailed(e.to_string()))
            }
        }
    }

    /// Validates and stores `text` verbatim. Persisted state is untouched on failure.
    pub async fn import_backup_text(&self, text: String) -> ImportOutcome {
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => return self.finish(ImportOutcome::InvalidJson(e.to_string())),
        };
        if let Err(reason) = validate_backup_shape(&value) {
            return self.finish(ImportOutcome::InvalidStructure(reason));
        }
        match self.store.set(STORAGE_KEY, &text).await {
            Ok(()) => self.finish(ImportOutcome::Imported {
                reload_required: true,
            }),
            Err(e) => self.finish(ImportOutcome::SaveFailed(e.to_string())),
        }
    }

    /// Removes the persisted blob and the onboarding flag together.
    pub async fn clear_all_data(&self) -> BackupResult {
        match self.store.remove_all(&[STORAGE_KEY, ONBOARDED_KEY]).await {
            Ok(()) => {
                info!("all persisted data cleared");
                self.reporter.report(ReportKind::Success, "所有数据已清除");
                BackupResult {
                    success: true,
                    message: "所有数据已清除".to_string(),
                    path: None,
                    filename: None,
                    contents: None,
                }
            }
            Err(e) => {
                warn!("clearing data failed: {e}");
                self.reporter.report(ReportKind::Error, "清除数据失败，请重试");
                BackupResult::failed("清除数据失败，请重试")
            }
        }
    }

    fn finish(&self, outcome: ImportOutcome) -> ImportOutcome {
        match &outcome {
            ImportOutcome::Imported { .. } => {
                info!("backup imported");
                self.reporter.report(ReportKind::Success, outcome.message());
            }
            ImportOutcome::InvalidJson(reason) | ImportOutcome::InvalidStructure(reason) => {
                warn!("backup rejected: {reason}");
                self.reporter.report(ReportKind::Error, outcome.message());
            }
            ImportOutcome::ReadFailed(reason) | ImportOutcome::SaveFailed(reason) => {
                warn!("backup import failed: {reason}");
                self.reporter.report(ReportKind::Error, outcome.message());
            }
        }
        outcome
    }
}
