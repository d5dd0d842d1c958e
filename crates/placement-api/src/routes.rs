use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::{self, AppState};
use crate::middleware::{admin_only, company_only, require_auth, student_only};
use crate::{admin, applications, internships};

/// Full `/api` surface. Role gates run after `require_auth` has attached the
/// actor; admin capabilities are separate routes, not relaxed gates.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/reset-password", post(auth::reset_password))
        .route("/api/internships", get(internships::list_internships));

    let account_routes = Router::new().route("/api/user", get(auth::current_user));

    let student_routes = Router::new()
        .route("/api/applications", post(applications::create_application))
        .route("/api/applications/student", get(applications::student_applications))
        .route_layer(middleware::from_fn(student_only));

    let company_routes = Router::new()
        .route("/api/internships", post(internships::create_internship))
        .route("/api/internships/company", get(internships::company_internships))
        .route(
            "/api/internships/{id}",
            patch(internships::update_internship).delete(internships::delete_internship),
        )
        .route(
            "/api/applications/internship/{id}",
            get(applications::internship_applications),
        )
        .route("/api/applications/{id}/status", patch(applications::update_status))
        .route_layer(middleware::from_fn(company_only));

    let admin_routes = Router::new()
        .route("/api/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/api/admin/users/{id}",
            patch(admin::update_user).delete(admin::delete_user),
        )
        .route("/api/admin/applications", get(admin::list_applications))
        .route("/api/admin/applications/export", get(admin::export_applications))
        .route(
            "/api/admin/applications/{id}",
            axum::routing::delete(admin::delete_application),
        )
        .route(
            "/api/admin/applications/{id}/status",
            patch(admin::update_application_status),
        )
        .route("/api/admin/internships", post(admin::create_internship))
        .route(
            "/api/admin/internships/{id}",
            patch(admin::update_internship).delete(admin::delete_internship),
        )
        .route(
            "/api/admin/internships/{id}/applications",
            get(admin::internship_applications),
        )
        .route_layer(middleware::from_fn(admin_only));

    let protected_routes = Router::new()
        .merge(account_routes)
        .merge(student_routes)
        .merge(company_routes)
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
