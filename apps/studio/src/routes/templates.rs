use axum::{extract::State, Json};
use serde::Serialize;

use crate::editor::catalog::PresetInfo;
use crate::state::AppState;
use crate::templates::{TemplateInfo, TemplateKind};

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub templates: Vec<TemplateInfo>,
    pub presets: Vec<PresetInfo>,
}

/// GET /api/v1/templates
pub async fn handle_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        templates: TemplateKind::ALL.into_iter().map(TemplateKind::info).collect(),
        presets: state.presets.infos().await,
    })
}
