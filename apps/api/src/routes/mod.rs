pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::cover_letters::handlers as cover_letters;
use crate::generation::handlers as generation;
use crate::jobs::handlers as jobs;
use crate::photos::handlers::{self as photos, MAX_UPLOAD_BYTES};
use crate::resume::handlers as resume;
use crate::resume_bullets::handlers as bullets;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route(
            "/api/v1/jobs/smart-apply",
            post(generation::handle_smart_apply),
        )
        // Text generation
        .route(
            "/api/v1/cover-letters/generate",
            post(generation::handle_generate_cover_letter),
        )
        .route(
            "/api/v1/resume-bullets/generate",
            post(generation::handle_generate_bullets),
        )
        .route(
            "/api/v1/resume/extract",
            post(resume::handle_extract_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Saved cover letters and bullets
        .route(
            "/api/v1/cover-letters",
            get(cover_letters::handle_list_cover_letters)
                .post(cover_letters::handle_create_cover_letter),
        )
        .route(
            "/api/v1/cover-letters/:id",
            get(cover_letters::handle_get_cover_letter)
                .patch(cover_letters::handle_update_cover_letter)
                .delete(cover_letters::handle_delete_cover_letter),
        )
        .route(
            "/api/v1/resume-bullets",
            get(bullets::handle_list_bullets)
                .post(bullets::handle_create_bullets)
                .delete(bullets::handle_delete_bullets),
        )
        .route(
            "/api/v1/resume-bullets/:id",
            get(bullets::handle_get_bullet)
                .patch(bullets::handle_update_bullet)
                .delete(bullets::handle_delete_bullet),
        )
        // Photos
        .route(
            "/api/v1/photos",
            get(photos::handle_list_photos).post(photos::handle_upload_photo).layer(
                DefaultBodyLimit::max(MAX_UPLOAD_BYTES),
            ),
        )
        .route("/api/v1/photos/:id", delete(photos::handle_delete_photo))
        .route(
            "/api/v1/photos/:id/enhance",
            post(photos::handle_enhance_photo),
        )
        .route(
            "/api/v1/photos/:id/generate",
            post(photos::handle_generate_photo),
        )
        .with_state(state)
}
