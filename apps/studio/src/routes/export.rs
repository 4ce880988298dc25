use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::export::{generate_export_filename, ExportResult, PrintOutcome, RasterOptions};
use crate::routes::resumes::current;
use crate::state::AppState;
use crate::templates::{render_document, Node};

#[derive(Debug, Default, Deserialize)]
pub struct PngRequest {
    pub scale: Option<f32>,
    pub filename: Option<String>,
}

async fn rendered(state: &AppState, id: &str) -> Result<(Node, crate::models::Profile), AppError> {
    let doc = current(state, id).await?;
    let tree = render_document(&doc)?;
    Ok((tree, doc.profile.clone()))
}

/// POST /api/v1/resumes/:id/export/png
pub async fn handle_export_png(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<PngRequest>>,
) -> Result<Json<ExportResult>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let (tree, profile) = rendered(&state, &id).await?;

    let mut options = RasterOptions {
        filename: req
            .filename
            .unwrap_or_else(|| generate_export_filename(&profile, "png")),
        ..Default::default()
    };
    if let Some(scale) = req.scale {
        options.scale = scale;
    }
    let resume_id = id.clone();
    options.on_progress = Some(Box::new(move |p: f32| {
        tracing::debug!(resume_id = %resume_id, progress = p, "raster export progress");
    }));

    Ok(Json(state.exporter.export_to_raster(&tree, options).await))
}

/// POST /api/v1/resumes/:id/export/print
pub async fn handle_export_print(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExportResult>, AppError> {
    let (tree, profile) = rendered(&state, &id).await?;
    let filename = generate_export_filename(&profile, "pdf");

    let result = match state.printer.print_document(&tree, &filename).await {
        PrintOutcome::Completed {
            artifact: Some(path),
        } => ExportResult::ok(format!("已生成打印文档 {filename}"), path),
        PrintOutcome::Completed { artifact: None } | PrintOutcome::Pending => ExportResult {
            success: true,
            message: "已打开打印".to_string(),
            path: None,
        },
        PrintOutcome::Suppressed => ExportResult {
            success: true,
            message: "打印正在进行中".to_string(),
            path: None,
        },
        PrintOutcome::Failed(message) => ExportResult::failed(message),
    };
    Ok(Json(result))
}

/// POST /api/v1/print/complete
///
/// The host's after-print notification.
pub async fn handle_print_complete(State(state): State<AppState>) -> Json<serde_json::Value> {
    let restored = state.printer.on_after_print();
    Json(serde_json::json!({ "restored": restored }))
}
