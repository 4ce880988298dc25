//! The set of open documents, each with its own undo history.
//!
//! Persisted as one blob: `{ "state": { "resumes": {..}, "currentId": .. }, "version": n }`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::history::{History, HistoryManager, HistoryStatus};
use crate::models::{ModelError, ResumeData};
use crate::storage::{KeyValueStore, StorageError, STORAGE_KEY};

pub type Snapshot = Arc<ResumeData>;

/// Membership of the workspace at one point in time.
type Catalog = BTreeMap<String, Snapshot>;

pub const COPY_SUFFIX: &str = " (副本)";

#[derive(Debug, Error, PartialEq)]
pub enum WorkspaceError {
    #[error("resume {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] ModelError),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default)]
    resumes: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedBlob {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

/// Listing entry for a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub id: String,
    pub title: String,
    pub last_modified: i64,
    pub template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureStatus {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Default)]
pub struct Workspace {
    sessions: BTreeMap<String, History<ResumeData>>,
    current_id: Option<String>,
    version: u32,
    structure: HistoryManager<Catalog>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a persisted blob. Loaded documents start with empty histories.
    pub fn from_blob(text: &str) -> Result<Self, StorageError> {
        let blob: PersistedBlob = serde_json::from_str(text)?;
        let mut workspace = Self {
            version: blob.version,
            ..Self::default()
        };
        for (key, value) in blob.state.resumes {
            let mut doc: ResumeData = match serde_json::from_value(value) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(key = %key, "skipping unreadable persisted resume: {e}");
                    continue;
                }
            };
            if doc.id != key {
                warn!(key = %key, id = %doc.id, "persisted resume id differs from its key, using key");
                doc.id = key.clone();
            }
            workspace.sessions.insert(key, History::new(Arc::new(doc)));
        }
        workspace.current_id = blob
            .state
            .current_id
            .filter(|id| workspace.sessions.contains_key(id));
        Ok(workspace)
    }

    /// Reads the persisted blob. A missing blob is an empty workspace; a
    /// malformed one is logged and also treated as empty, and left on disk.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self, StorageError> {
        let Some(text) = store.get(STORAGE_KEY).await? else {
            debug!("no persisted workspace");
            return Ok(Self::new());
        };
        match Self::from_blob(&text) {
            Ok(workspace) => {
                info!(resumes = workspace.sessions.len(), "workspace loaded");
                Ok(workspace)
            }
            Err(e) => {
                warn!("persisted workspace is malformed, starting empty: {e}");
                Ok(Self::new())
            }
        }
    }

    pub fn to_blob(&self) -> Result<String, StorageError> {
        let blob = PersistedBlob {
            state: PersistedState {
                resumes: self
                    .sessions
                    .iter()
                    .map(|(id, h)| {
                        Ok((id.clone(), serde_json::to_value(h.present().as_ref())?))
                    })
                    .collect::<Result<_, serde_json::Error>>()?,
                current_id: self.current_id.clone(),
            },
            version: self.version,
        };
        Ok(serde_json::to_string(&blob)?)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// Most recently modified first.
    pub fn list(&self) -> Vec<ResumeSummary> {
        let mut list: Vec<_> = self
            .sessions
            .values()
            .map(|h| {
                let doc = h.present();
                ResumeSummary {
                    id: doc.id.clone(),
                    title: doc.title.clone(),
                    last_modified: doc.last_modified,
                    template: doc.template.clone(),
                }
            })
            .collect();
        list.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        list
    }

    pub fn get(&self, id: &str) -> Option<&Snapshot> {
        self.sessions.get(id).map(History::present)
    }

    fn session_mut(&mut self, id: &str) -> Result<&mut History<ResumeData>, WorkspaceError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| WorkspaceError::NotFound(id.to_string()))
    }

    fn catalog(&self) -> Catalog {
        self.sessions
            .iter()
            .map(|(id, h)| (id.clone(), Arc::clone(h.present())))
            .collect()
    }

    // ── structure ───────────────────────────────────────────────────────────

    pub fn create(&mut self, doc: ResumeData) -> Result<Snapshot, WorkspaceError> {
        doc.check()?;
        self.structure.push(self.catalog());
        let id = doc.id.clone();
        let snapshot = Arc::new(doc);
        self.sessions
            .insert(id.clone(), History::new(Arc::clone(&snapshot)));
        info!(resume_id = %id, "resume created");
        self.current_id = Some(id);
        Ok(snapshot)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), WorkspaceError> {
        if !self.sessions.contains_key(id) {
            return Err(WorkspaceError::NotFound(id.to_string()));
        }
        self.structure.push(self.catalog());
        self.sessions.remove(id);
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
        }
        info!(resume_id = %id, "resume deleted");
        Ok(())
    }

    pub fn duplicate(&mut self, id: &str) -> Result<Snapshot, WorkspaceError> {
        let source = self
            .get(id)
            .ok_or_else(|| WorkspaceError::NotFound(id.to_string()))?;
        let copy = source.duplicate(format!("{}{COPY_SUFFIX}", source.title));
        self.create(copy)
    }

    /// Makes `id` the current document. Not an undoable edit.
    pub fn select(&mut self, id: &str) -> Result<(), WorkspaceError> {
        if !self.sessions.contains_key(id) {
            return Err(WorkspaceError::NotFound(id.to_string()));
        }
        self.current_id = Some(id.to_string());
        Ok(())
    }

    pub fn undo_structure(&mut self) -> bool {
        let current = self.catalog();
        match self.structure.undo(current) {
            Some(previous) => {
                self.restore_membership(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo_structure(&mut self) -> bool {
        let current = self.catalog();
        match self.structure.redo(current) {
            Some(next) => {
                self.restore_membership(next);
                true
            }
            None => false,
        }
    }

    pub fn structure_status(&self) -> StructureStatus {
        StructureStatus {
            can_undo: self.structure.can_undo(),
            can_redo: self.structure.can_redo(),
        }
    }

    /// Brings the set of documents in line with `target`. Documents present
    /// on both sides keep their live session and edits.
    fn restore_membership(&mut self, target: Catalog) {
        self.sessions.retain(|id, _| target.contains_key(id));
        for (id, snapshot) in target {
            self.sessions
                .entry(id)
                .or_insert_with(|| History::new(snapshot));
        }
        if let Some(current) = &self.current_id {
            if !self.sessions.contains_key(current) {
                self.current_id = None;
            }
        }
    }

    // ── edits ───────────────────────────────────────────────────────────────

    /// Applies `change` to the current snapshot of `id` and records the result.
    pub fn edit<F>(&mut self, id: &str, change: F) -> Result<Snapshot, WorkspaceError>
    where
        F: FnOnce(&ResumeData) -> Result<ResumeData, ModelError>,
    {
        let session = self.session_mut(id)?;
        let mut next = change(session.present().as_ref())?;
        next.id = id.to_string();
        next.check()?;
        let next = Arc::new(next);
        session.set_state(Arc::clone(&next), false);
        debug!(resume_id = %id, "resume edited");
        Ok(next)
    }

    /// Replaces the whole document. With `skip_history` the write leaves no
    /// undo checkpoint.
    pub fn replace(
        &mut self,
        id: &str,
        mut doc: ResumeData,
        skip_history: bool,
    ) -> Result<Snapshot, WorkspaceError> {
        let session = self.session_mut(id)?;
        doc.id = id.to_string();
        doc.check()?;
        let doc = Arc::new(doc);
        session.set_state(Arc::clone(&doc), skip_history);
        Ok(doc)
    }

    pub fn undo(&mut self, id: &str) -> Result<Snapshot, WorkspaceError> {
        let session = self.session_mut(id)?;
        session.undo();
        Ok(Arc::clone(session.present()))
    }

    pub fn redo(&mut self, id: &str) -> Result<Snapshot, WorkspaceError> {
        let session = self.session_mut(id)?;
        session.redo();
        Ok(Arc::clone(session.present()))
    }

    pub fn status(&self, id: &str) -> Result<HistoryStatus, WorkspaceError> {
        self.sessions
            .get(id)
            .map(History::status)
            .ok_or_else(|| WorkspaceError::NotFound(id.to_string()))
    }

    pub fn clear_history(&mut self, id: &str) -> Result<(), WorkspaceError> {
        self.session_mut(id)?.clear_history();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::presets::{blank_document, engineer_sample, student_sample};
    use crate::models::resume::{ModuleItem, SkillItem};
    use crate::models::ModuleType;
    use crate::storage::MemoryStore;

    fn workspace_with(doc: ResumeData) -> (Workspace, String) {
        let mut ws = Workspace::new();
        let id = doc.id.clone();
        ws.create(doc).unwrap();
        (ws, id)
    }

    #[test]
    fn test_blob_round_trip() {
        let (mut ws, id) = workspace_with(engineer_sample());
        ws.create(student_sample()).unwrap();
        ws.select(&id).unwrap();

        let blob = ws.to_blob().unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert!(value["state"]["resumes"][&id]["profile"].is_object());
        assert_eq!(value["state"]["currentId"], id.as_str());
        assert_eq!(value["version"], 0);

        let restored = Workspace::from_blob(&blob).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.current_id(), Some(id.as_str()));
        assert_eq!(restored.get(&id).unwrap().as_ref(), ws.get(&id).unwrap().as_ref());
        // Loading is not an undoable edit.
        assert!(!restored.status(&id).unwrap().can_undo);
    }

    #[test]
    fn test_sparse_resumes_load_and_bad_entries_are_skipped() {
        let blob = r#"{"state":{"resumes":{
            "r1":{"id":"r1","profile":{"name":"李明"},"modules":[]},
            "r2":{"id":"r2","profile":{},"modules":[]},
            "bad":{"id":"bad","profile":[],"modules":7}
        },"currentId":"r1"}}"#;
        let ws = Workspace::from_blob(blob).unwrap();
        assert_eq!(ws.len(), 2);
        assert_eq!(ws.current_id(), Some("r1"));

        let r1 = ws.get("r1").unwrap();
        assert_eq!(r1.profile.name, "李明");
        assert_eq!(r1.title, "");
        assert_eq!(r1.template, "classic");
        assert!(ws.get("r2").unwrap().profile.name.is_empty());
        assert!(ws.get("bad").is_none());
    }

    #[tokio::test]
    async fn test_malformed_blob_loads_empty_and_is_kept() {
        let store = MemoryStore::new();
        store.set(STORAGE_KEY, "{\"state\": 3}").await.unwrap();
        let ws = Workspace::load(&store).await.unwrap();
        assert!(ws.is_empty());
        assert_eq!(
            store.get(STORAGE_KEY).await.unwrap().as_deref(),
            Some("{\"state\": 3}")
        );

        let missing = Workspace::load(&MemoryStore::new()).await.unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let mut older = blank_document("旧");
        older.last_modified = 1;
        let mut newer = blank_document("新");
        newer.last_modified = 2;
        let (mut ws, _) = workspace_with(older);
        ws.create(newer).unwrap();
        let titles: Vec<_> = ws.list().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["新", "旧"]);
    }

    #[test]
    fn test_edit_undo_redo() {
        let (mut ws, id) = workspace_with(blank_document("我的简历"));
        let original = Arc::clone(ws.get(&id).unwrap());

        let edited = ws.edit(&id, |d| Ok(d.with_title("改名"))).unwrap();
        assert_eq!(edited.title, "改名");
        assert!(ws.status(&id).unwrap().can_undo);

        let undone = ws.undo(&id).unwrap();
        assert!(Arc::ptr_eq(&undone, &original));
        let redone = ws.redo(&id).unwrap();
        assert!(Arc::ptr_eq(&redone, &edited));
    }

    #[test]
    fn test_invalid_edit_is_rejected_without_history() {
        let (mut ws, id) = workspace_with(engineer_sample());
        let err = ws
            .edit(&id, |d| {
                let mut next = d.clone();
                let experience = next
                    .modules
                    .iter_mut()
                    .find(|m| m.kind == ModuleType::Experience)
                    .unwrap();
                experience.items.push(ModuleItem::Skill(SkillItem {
                    id: "s".into(),
                    name: "Rust".into(),
                }));
                Ok(next)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Invalid(ModelError::MixedContent { .. })
        ));
        assert!(!ws.status(&id).unwrap().can_undo);
    }

    #[test]
    fn test_skip_history_replace() {
        let (mut ws, id) = workspace_with(blank_document("a"));
        ws.edit(&id, |d| Ok(d.with_title("b"))).unwrap();
        ws.undo(&id).unwrap();
        let before = ws.status(&id).unwrap();

        let doc = ws.get(&id).unwrap().with_title("system");
        ws.replace(&id, doc, true).unwrap();
        assert_eq!(ws.status(&id).unwrap(), before);
        assert_eq!(ws.get(&id).unwrap().title, "system");
    }

    #[test]
    fn test_replace_keeps_path_id() {
        let (mut ws, id) = workspace_with(blank_document("a"));
        let mut doc = ws.get(&id).unwrap().as_ref().clone();
        doc.id = "other".into();
        let stored = ws.replace(&id, doc, false).unwrap();
        assert_eq!(stored.id, id);
        assert!(ws.get("other").is_none());
    }

    #[test]
    fn test_duplicate_gets_fresh_ids() {
        let (mut ws, id) = workspace_with(engineer_sample());
        let copy = ws.duplicate(&id).unwrap();
        let source = ws.get(&id).unwrap();
        assert_ne!(copy.id, source.id);
        assert!(copy.title.ends_with(COPY_SUFFIX));
        assert_ne!(copy.modules[0].id, source.modules[0].id);
        assert_eq!(ws.current_id(), Some(copy.id.as_str()));
        assert_eq!(
            ws.duplicate("nope").unwrap_err(),
            WorkspaceError::NotFound("nope".into())
        );
    }

    #[test]
    fn test_structure_undo_restores_deleted_document() {
        let (mut ws, id) = workspace_with(engineer_sample());
        ws.edit(&id, |d| Ok(d.with_title("编辑后"))).unwrap();

        ws.delete(&id).unwrap();
        assert!(ws.get(&id).is_none());
        assert_eq!(ws.current_id(), None);

        assert!(ws.undo_structure());
        assert_eq!(ws.get(&id).unwrap().title, "编辑后");

        assert!(ws.redo_structure());
        assert!(ws.get(&id).is_none());
    }

    #[test]
    fn test_structure_undo_keeps_later_edits() {
        let (mut ws, first) = workspace_with(blank_document("一"));
        let second = ws.create(blank_document("二")).unwrap().id.clone();
        ws.edit(&first, |d| Ok(d.with_title("一改"))).unwrap();

        assert!(ws.undo_structure());
        assert!(ws.get(&second).is_none());
        assert_eq!(ws.get(&first).unwrap().title, "一改");
        assert!(ws.structure_status().can_redo);
    }
}
