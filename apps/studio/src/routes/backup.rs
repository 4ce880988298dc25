use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::backup::ImportSummary;
use crate::errors::AppError;
use crate::storage::{StorageError, ONBOARDED_KEY};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub has_onboarded: bool,
}

/// GET /api/v1/backup
///
/// Success streams the blob back as an attachment; expected failures are a
/// `{success: false, message}` body.
pub async fn handle_export_backup(State(state): State<AppState>) -> Result<Response, AppError> {
    // Pending edits belong in the backup.
    if let Err(e) = flush_pending(&state).await {
        return Ok(Json(state.backup.export_aborted(&e.to_string())).into_response());
    }

    let result = state.backup.export_backup().await;
    let (Some(contents), Some(filename)) = (result.contents.clone(), result.filename.clone())
    else {
        return Ok(Json(result).into_response());
    };

    let disposition = format!(
        "attachment; filename=\"backup.json\"; filename*=UTF-8''{}",
        percent_encode(&filename)
    );
    let mut response = contents.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// POST /api/v1/backup/import
pub async fn handle_import_backup(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportSummary>, AppError> {
    if let Err(e) = flush_pending(&state).await {
        return Ok(Json(state.backup.import_aborted(e.to_string()).summary()));
    }

    let outcome = state.backup.import_backup_text(body).await;
    if outcome.is_imported() {
        state.reload().await?;
    }
    Ok(Json(outcome.summary()))
}

/// Writes edits still inside the debounce window. On failure the write is
/// scheduled again so the edits are not dropped.
async fn flush_pending(state: &AppState) -> Result<(), StorageError> {
    let flushed = state
        .persister
        .flush(&*state.workspace.read().await)
        .await;
    if let Err(e) = &flushed {
        warn!("flushing pending edits failed: {e}");
        state.persist();
    }
    flushed
}

/// DELETE /api/v1/data
pub async fn handle_clear_data(
    State(state): State<AppState>,
) -> Result<Json<crate::backup::BackupResult>, AppError> {
    state.persister.cancel();
    let result = state.backup.clear_all_data().await;
    if result.success {
        state.reload().await?;
    }
    Ok(Json(result))
}

/// GET /api/v1/onboarding
pub async fn handle_onboarding_status(
    State(state): State<AppState>,
) -> Result<Json<OnboardingStatus>, AppError> {
    let has_onboarded = state
        .store
        .get(ONBOARDED_KEY)
        .await?
        .is_some_and(|v| v == "true");
    Ok(Json(OnboardingStatus { has_onboarded }))
}

/// POST /api/v1/onboarding
pub async fn handle_complete_onboarding(
    State(state): State<AppState>,
) -> Result<Json<OnboardingStatus>, AppError> {
    state.store.set(ONBOARDED_KEY, "true").await?;
    Ok(Json(OnboardingStatus {
        has_onboarded: true,
    }))
}

/// RFC 5987 value encoding for `filename*`.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("a-b_c.json"), "a-b_c.json");
        assert_eq!(percent_encode("简"), "%E7%AE%80");
        assert_eq!(percent_encode("a b"), "a%20b");
    }
}
