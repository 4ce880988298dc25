pub mod backup;
pub mod export;
pub mod health;
pub mod resumes;
pub mod templates;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list).post(resumes::handle_create),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get)
                .put(resumes::handle_replace)
                .delete(resumes::handle_delete),
        )
        .route(
            "/api/v1/resumes/:id/duplicate",
            post(resumes::handle_duplicate),
        )
        .route("/api/v1/resumes/:id/select", post(resumes::handle_select))
        // Edits
        .route(
            "/api/v1/resumes/:id/profile",
            put(resumes::handle_update_profile),
        )
        .route(
            "/api/v1/resumes/:id/profile/validate",
            post(resumes::handle_validate_profile_field),
        )
        .route(
            "/api/v1/resumes/:id/settings",
            put(resumes::handle_update_settings),
        )
        .route(
            "/api/v1/resumes/:id/template",
            put(resumes::handle_update_template),
        )
        .route(
            "/api/v1/resumes/:id/modules",
            post(resumes::handle_add_module),
        )
        .route(
            "/api/v1/resumes/:id/modules/:module_id",
            axum::routing::delete(resumes::handle_remove_module),
        )
        .route(
            "/api/v1/resumes/:id/modules/:module_id/move",
            post(resumes::handle_move_module),
        )
        .route(
            "/api/v1/resumes/:id/modules/:module_id/toggle",
            post(resumes::handle_toggle_module),
        )
        .route(
            "/api/v1/resumes/:id/modules/:module_id/items",
            post(resumes::handle_add_item),
        )
        .route(
            "/api/v1/resumes/:id/modules/:module_id/items/:item_id",
            axum::routing::delete(resumes::handle_remove_item),
        )
        .route(
            "/api/v1/resumes/:id/modules/:module_id/items/:item_id/move",
            post(resumes::handle_move_item),
        )
        // History
        .route("/api/v1/resumes/:id/undo", post(resumes::handle_undo))
        .route("/api/v1/resumes/:id/redo", post(resumes::handle_redo))
        .route(
            "/api/v1/resumes/:id/history",
            get(resumes::handle_history).delete(resumes::handle_clear_history),
        )
        .route(
            "/api/v1/workspace/undo",
            post(resumes::handle_workspace_undo),
        )
        .route(
            "/api/v1/workspace/redo",
            post(resumes::handle_workspace_redo),
        )
        // Preview and export
        .route("/api/v1/resumes/:id/render", get(resumes::handle_render))
        .route(
            "/api/v1/resumes/:id/render/retry",
            post(resumes::handle_render_retry),
        )
        .route(
            "/api/v1/resumes/:id/export/png",
            post(export::handle_export_png),
        )
        .route(
            "/api/v1/resumes/:id/export/print",
            post(export::handle_export_print),
        )
        .route("/api/v1/print/complete", post(export::handle_print_complete))
        .route("/api/v1/templates", get(templates::handle_catalog))
        // Backup
        .route("/api/v1/backup", get(backup::handle_export_backup))
        .route("/api/v1/backup/import", post(backup::handle_import_backup))
        .route("/api/v1/data", axum::routing::delete(backup::handle_clear_data))
        .route(
            "/api/v1/onboarding",
            get(backup::handle_onboarding_status).post(backup::handle_complete_onboarding),
        )
        .with_state(state)
}
