use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::editor::workspace::{ResumeSummary, StructureStatus};
use crate::editor::Snapshot;
use crate::errors::AppError;
use crate::history::HistoryStatus;
use crate::models::presets::blank_document;
use crate::models::resume::ModuleItem;
use crate::models::{ModuleType, Profile, ResumeData, ResumeSettings};
use crate::state::AppState;
use crate::templates::boundary::BoundaryView;
use crate::templates::{RenderBoundary, RenderError, TemplateKind};
use crate::validation::{profile_validator, profile_values};

const DEFAULT_TITLE: &str = "我的简历";

#[derive(Debug, Default, Deserialize)]
pub struct CreateResume {
    pub preset: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceQuery {
    #[serde(default)]
    pub skip_history: bool,
}

#[derive(Debug, Deserialize)]
pub struct FieldInput {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCheck {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub visible_errors: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub can_undo: bool,
    pub can_redo: bool,
    pub document: ResumeData,
}

impl HistoryResponse {
    fn new(status: HistoryStatus, document: Snapshot) -> Self {
        Self {
            can_undo: status.can_undo,
            can_redo: status.can_redo,
            document: document.as_ref().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureResponse {
    #[serde(flatten)]
    pub status: StructureStatus,
    pub changed: bool,
    pub resumes: Vec<ResumeSummary>,
}

#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    pub template: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewModule {
    #[serde(rename = "type")]
    pub kind: ModuleType,
}

#[derive(Debug, Deserialize)]
pub struct MoveTo {
    pub to: usize,
}

#[derive(Debug, Deserialize)]
pub struct TemplateChoice {
    pub template: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Documents
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes
pub async fn handle_list(State(state): State<AppState>) -> Json<Vec<ResumeSummary>> {
    Json(state.workspace.read().await.list())
}

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    body: Option<Json<CreateResume>>,
) -> Result<(StatusCode, Json<ResumeData>), AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let doc = match req.preset.as_deref() {
        Some(id) => state
            .presets
            .find(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Preset {id} not found")))?
            .instantiate(req.title.as_deref()),
        None => blank_document(req.title.as_deref().unwrap_or(DEFAULT_TITLE)),
    };
    let created = state.workspace.write().await.create(doc)?;
    state.persist();
    Ok((StatusCode::CREATED, Json(created.as_ref().clone())))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResumeData>, AppError> {
    let ws = state.workspace.read().await;
    let doc = ws
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(doc.as_ref().clone()))
}

/// PUT /api/v1/resumes/:id
pub async fn handle_replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReplaceQuery>,
    Json(doc): Json<ResumeData>,
) -> Result<Json<ResumeData>, AppError> {
    let stored = state
        .workspace
        .write()
        .await
        .replace(&id, doc, query.skip_history)?;
    state.persist();
    Ok(Json(stored.as_ref().clone()))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.workspace.write().await.delete(&id)?;
    state.boundaries.lock().await.remove(&id);
    state.validators.lock().await.remove(&id);
    state.persist();
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/duplicate
pub async fn handle_duplicate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ResumeData>), AppError> {
    let copy = state.workspace.write().await.duplicate(&id)?;
    state.persist();
    Ok((StatusCode::CREATED, Json(copy.as_ref().clone())))
}

/// POST /api/v1/resumes/:id/select
pub async fn handle_select(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.workspace.write().await.select(&id)?;
    state.persist();
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Edits
// ────────────────────────────────────────────────────────────────────────────

/// Applies `change` to a document as one undoable edit.
async fn apply_edit<F>(state: &AppState, id: &str, change: F) -> Result<Json<ResumeData>, AppError>
where
    F: FnOnce(&ResumeData) -> Result<ResumeData, crate::models::ModelError>,
{
    let next = state.workspace.write().await.edit(id, change)?;
    state.persist();
    Ok(Json(next.as_ref().clone()))
}

/// PUT /api/v1/resumes/:id/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(profile): Json<Profile>,
) -> Result<Json<ResumeData>, AppError> {
    current(&state, &id).await?;
    let report = state
        .validators
        .lock()
        .await
        .entry(id.clone())
        .or_insert_with(profile_validator)
        .validate_all(&profile_values(&profile));
    if !report.is_valid() {
        return Err(AppError::InvalidFields(report.list));
    }
    apply_edit(&state, &id, |d| Ok(d.with_profile(profile))).await
}

/// POST /api/v1/resumes/:id/profile/validate
///
/// Checks one field as the user leaves it. Errors stay hidden for fields that
/// have not been touched yet.
pub async fn handle_validate_profile_field(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<FieldInput>,
) -> Result<Json<FieldCheck>, AppError> {
    current(&state, &id).await?;
    let mut validators = state.validators.lock().await;
    let validator = validators.entry(id).or_insert_with(profile_validator);
    if !validator.has_field(&input.field) {
        return Err(AppError::Validation(format!(
            "unknown profile field '{}'",
            input.field
        )));
    }
    let error = validator.validate_one(&input.field, &input.value);
    Ok(Json(FieldCheck {
        field: input.field,
        error,
        visible_errors: validator.visible_errors(),
    }))
}

/// PUT /api/v1/resumes/:id/settings
pub async fn handle_update_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(settings): Json<ResumeSettings>,
) -> Result<Json<ResumeData>, AppError> {
    apply_edit(&state, &id, |d| Ok(d.with_settings(settings))).await
}

/// PUT /api/v1/resumes/:id/template
pub async fn handle_update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(choice): Json<TemplateChoice>,
) -> Result<Json<ResumeData>, AppError> {
    let kind = TemplateKind::from_id(&choice.template)
        .ok_or_else(|| RenderError::UnknownTemplate(choice.template.clone()))?;
    apply_edit(&state, &id, |d| Ok(d.with_template(kind.id()))).await
}

/// POST /api/v1/resumes/:id/modules
pub async fn handle_add_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NewModule>,
) -> Result<Json<ResumeData>, AppError> {
    apply_edit(&state, &id, |d| Ok(d.add_module(req.kind))).await
}

/// DELETE /api/v1/resumes/:id/modules/:module_id
pub async fn handle_remove_module(
    State(state): State<AppState>,
    Path((id, module_id)): Path<(String, String)>,
) -> Result<Json<ResumeData>, AppError> {
    apply_edit(&state, &id, |d| d.remove_module(&module_id)).await
}

/// POST /api/v1/resumes/:id/modules/:module_id/move
pub async fn handle_move_module(
    State(state): State<AppState>,
    Path((id, module_id)): Path<(String, String)>,
    Json(req): Json<MoveTo>,
) -> Result<Json<ResumeData>, AppError> {
    apply_edit(&state, &id, |d| d.move_module(&module_id, req.to)).await
}

/// POST /api/v1/resumes/:id/modules/:module_id/toggle
pub async fn handle_toggle_module(
    State(state): State<AppState>,
    Path((id, module_id)): Path<(String, String)>,
) -> Result<Json<ResumeData>, AppError> {
    apply_edit(&state, &id, |d| d.toggle_module(&module_id)).await
}

/// POST /api/v1/resumes/:id/modules/:module_id/items
///
/// An empty body adds a blank item of the module's shape; any other body must
/// be a complete item.
pub async fn handle_add_item(
    State(state): State<AppState>,
    Path((id, module_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<ResumeData>, AppError> {
    let item = if body.trim_ascii().is_empty() {
        None
    } else {
        let item: ModuleItem = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("invalid item: {e}")))?;
        Some(item)
    };
    apply_edit(&state, &id, |d| d.add_item(&module_id, item)).await
}

/// DELETE /api/v1/resumes/:id/modules/:module_id/items/:item_id
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path((id, module_id, item_id)): Path<(String, String, String)>,
) -> Result<Json<ResumeData>, AppError> {
    apply_edit(&state, &id, |d| d.remove_item(&module_id, &item_id)).await
}

/// POST /api/v1/resumes/:id/modules/:module_id/items/:item_id/move
pub async fn handle_move_item(
    State(state): State<AppState>,
    Path((id, module_id, item_id)): Path<(String, String, String)>,
    Json(req): Json<MoveTo>,
) -> Result<Json<ResumeData>, AppError> {
    apply_edit(&state, &id, |d| d.move_item(&module_id, &item_id, req.to)).await
}

// ────────────────────────────────────────────────────────────────────────────
// History
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/:id/undo
pub async fn handle_undo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let response = {
        let mut ws = state.workspace.write().await;
        let doc = ws.undo(&id)?;
        HistoryResponse::new(ws.status(&id)?, doc)
    };
    state.persist();
    Ok(Json(response))
}

/// POST /api/v1/resumes/:id/redo
pub async fn handle_redo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let response = {
        let mut ws = state.workspace.write().await;
        let doc = ws.redo(&id)?;
        HistoryResponse::new(ws.status(&id)?, doc)
    };
    state.persist();
    Ok(Json(response))
}

/// GET /api/v1/resumes/:id/history
pub async fn handle_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryStatus>, AppError> {
    Ok(Json(state.workspace.read().await.status(&id)?))
}

/// DELETE /api/v1/resumes/:id/history
pub async fn handle_clear_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryStatus>, AppError> {
    let mut ws = state.workspace.write().await;
    ws.clear_history(&id)?;
    Ok(Json(ws.status(&id)?))
}

async fn structure_response(state: &AppState, changed: bool) -> Json<StructureResponse> {
    let ws = state.workspace.read().await;
    Json(StructureResponse {
        status: ws.structure_status(),
        changed,
        resumes: ws.list(),
    })
}

/// POST /api/v1/workspace/undo
pub async fn handle_workspace_undo(State(state): State<AppState>) -> Json<StructureResponse> {
    let changed = state.workspace.write().await.undo_structure();
    if changed {
        state.persist();
    }
    structure_response(&state, changed).await
}

/// POST /api/v1/workspace/redo
pub async fn handle_workspace_redo(State(state): State<AppState>) -> Json<StructureResponse> {
    let changed = state.workspace.write().await.redo_structure();
    if changed {
        state.persist();
    }
    structure_response(&state, changed).await
}

// ────────────────────────────────────────────────────────────────────────────
// Preview
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes/:id/render?template=
pub async fn handle_render(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RenderQuery>,
) -> Result<Json<BoundaryView>, AppError> {
    let doc = current(&state, &id).await?;
    let template = query.template.unwrap_or_else(|| doc.template.clone());
    let kind = TemplateKind::from_id(&template).ok_or(RenderError::UnknownTemplate(template))?;

    let mut boundaries = state.boundaries.lock().await;
    let boundary = boundaries
        .entry(id)
        .or_insert_with(|| RenderBoundary::new(state.reporter.clone()));
    Ok(Json(boundary.render(kind, &doc)))
}

/// POST /api/v1/resumes/:id/render/retry
pub async fn handle_render_retry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BoundaryView>, AppError> {
    let mut boundaries = state.boundaries.lock().await;
    boundaries
        .get_mut(&id)
        .and_then(RenderBoundary::retry)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No preview of resume {id} to retry")))
}

pub(crate) async fn current(state: &AppState, id: &str) -> Result<Snapshot, AppError> {
    state
        .workspace
        .read()
        .await
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}
