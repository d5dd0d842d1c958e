use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use placement_db::Connection;
use placement_db::models::ApplicationRow;
use placement_db::queries;
use placement_types::api::{CreateApplicationRequest, UpdateStatusRequest};
use placement_types::{ApplicationStatus, Transition};

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ValidJson};
use crate::middleware::Actor;
use crate::ownership::{verify_application_ownership, verify_internship_ownership};
use crate::validate;
use crate::views;

/// POST /api/applications: always created `pending`, owned by the acting student.
pub async fn create_application(
    State(state): State<AppState>,
    actor: Actor,
    ValidJson(req): ValidJson<CreateApplicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resume_url = validate::required_text("resumeUrl", &req.resume_url)?;
    let internship_id = req.internship_id;

    let application = blocking(&state, move |db| {
        db.transaction(|tx| {
            if queries::internship_by_id(tx, internship_id)?.is_none() {
                return Err(ApiError::not_found("Internship"));
            }
            if queries::has_applied(tx, internship_id, actor.id)? {
                return Err(ApiError::validation(
                    "You have already applied to this internship",
                ));
            }
            Ok(queries::insert_application(tx, internship_id, actor.id, &resume_url)?)
        })
    })
    .await?;

    info!(
        "Student {} applied to internship {} (application {})",
        application.student_id, application.internship_id, application.id
    );
    Ok((StatusCode::CREATED, Json(views::application(application))))
}

/// GET /api/applications/student
pub async fn student_applications(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |db| Ok(db.get_applications_by_student(actor.id)?)).await?;
    Ok(Json(rows.into_iter().map(views::application_detail).collect::<Vec<_>>()))
}

/// GET /api/applications/internship/{id}: owner only.
pub async fn internship_applications(
    State(state): State<AppState>,
    actor: Actor,
    Path(internship_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |db| {
        db.transaction(|tx| {
            verify_internship_ownership(tx, internship_id, actor.id, "view applications for")?;
            Ok(queries::list_applications_by_internship(tx, internship_id)?)
        })
    })
    .await?;

    Ok(Json(rows.into_iter().map(views::application_detail).collect::<Vec<_>>()))
}

/// PATCH /api/applications/{id}/status: owner of the parent internship only.
pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(application_id): Path<i64>,
    ValidJson(req): ValidJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requested = parse_requested_status(&req.status)?;

    let application = blocking(&state, move |db| {
        db.transaction(|tx| {
            let application = verify_application_ownership(tx, application_id, actor.id)?;
            apply_transition(tx, application, requested)
        })
    })
    .await?;

    Ok(Json(views::application(application)))
}

/// Only the two decisions may be requested; anything else is an invalid status.
pub(crate) fn parse_requested_status(raw: &str) -> Result<ApplicationStatus, ApiError> {
    match raw.parse::<ApplicationStatus>() {
        Ok(status) if status.is_terminal() => Ok(status),
        _ => Err(ApiError::InvalidStatus("Invalid status".into())),
    }
}

pub(crate) fn apply_transition(
    conn: &Connection,
    application: ApplicationRow,
    requested: ApplicationStatus,
) -> Result<ApplicationRow, ApiError> {
    match application.status.transition_to(requested) {
        Ok(Transition::Changed(status)) => {
            let updated = queries::update_application_status(conn, application.id, status)?
                .ok_or_else(|| ApiError::not_found("Application"))?;
            info!("Application {} marked {}", updated.id, status);
            Ok(updated)
        }
        Ok(Transition::Unchanged) => Ok(application),
        Err(e) => Err(ApiError::InvalidStatus(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decisions_can_be_requested() {
        assert_eq!(parse_requested_status("accepted").unwrap(), ApplicationStatus::Accepted);
        assert_eq!(parse_requested_status("rejected").unwrap(), ApplicationStatus::Rejected);
        for raw in ["pending", "ACCEPTED", "withdrawn", ""] {
            assert!(matches!(
                parse_requested_status(raw),
                Err(ApiError::InvalidStatus(_))
            ));
        }
    }
}
