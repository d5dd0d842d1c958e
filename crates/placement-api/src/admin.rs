//! `/api/admin/*` handlers. Gated by role alone: none of these consult
//! ownership, but all of them still 404 on absent rows.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::info;

use placement_db::queries;
use placement_types::Role;
use placement_types::api::{
    AdminCreateInternshipRequest, CreateUserRequest, UpdateInternshipRequest, UpdateStatusRequest,
    UpdateUserRequest,
};

use crate::applications::{apply_transition, parse_requested_status};
use crate::auth::{Account, AppState, blocking, create_account};
use crate::error::{ApiError, ValidJson};
use crate::export::{self, EXPORT_FILENAME, XLSX_CONTENT_TYPE};
use crate::internships;
use crate::middleware::Actor;
use crate::validate;
use crate::views;

// -- Users --

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, |db| Ok(db.get_users()?)).await?;
    Ok(Json(rows.into_iter().map(views::user).collect::<Vec<_>>()))
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = create_account(
        &state,
        Account {
            username: req.username,
            password: req.password,
            role: req.role,
            name: req.name,
            email: req.email,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(views::user(user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate::optional_text("name", req.name.as_deref())?;
    let email = req.email.as_deref().map(validate::email).transpose()?;
    let role = req.role;

    let user = blocking(&state, move |db| {
        db.with_conn(|conn| {
            queries::update_user(
                conn,
                user_id,
                name.as_deref(),
                role.map(Role::as_str),
                email.as_deref(),
            )
        })?
        .ok_or_else(|| ApiError::not_found("User"))
    })
    .await?;

    Ok(Json(views::user(user)))
}

/// Internships and applications referencing the user are kept.
pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| queries::delete_user(conn, user_id))?)
    })
    .await?;

    if !deleted {
        return Err(ApiError::not_found("User"));
    }

    info!("Admin {} deleted user {}", actor.id, user_id);
    Ok(StatusCode::NO_CONTENT)
}

// -- Applications --

pub async fn list_applications(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, |db| Ok(db.get_all_applications()?)).await?;
    Ok(Json(rows.into_iter().map(views::application_detail).collect::<Vec<_>>()))
}

/// Whole table, materialized and serialized per request.
pub async fn export_applications(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = blocking(&state, |db| {
        let applications: Vec<_> = db
            .get_all_applications()?
            .into_iter()
            .map(views::application_detail)
            .collect();
        export::write_workbook(&applications).map_err(|e| ApiError::Export(e.to_string()))
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={EXPORT_FILENAME}"),
            ),
        ],
        bytes,
    ))
}

pub async fn update_application_status(
    State(state): State<AppState>,
    Path(application_id): Path<i64>,
    ValidJson(req): ValidJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requested = parse_requested_status(&req.status)?;

    let application = blocking(&state, move |db| {
        db.transaction(|tx| {
            let application = queries::application_by_id(tx, application_id)?
                .ok_or_else(|| ApiError::not_found("Application"))?;
            apply_transition(tx, application, requested)
        })
    })
    .await?;

    Ok(Json(views::application(application)))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Path(application_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| queries::delete_application(conn, application_id))?)
    })
    .await?;

    if !deleted {
        return Err(ApiError::not_found("Application"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// -- Internships --

/// The owning company must be named explicitly and must be a company account.
pub async fn create_internship(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<AdminCreateInternshipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (company_id, fields) = req.into_parts();
    let fields = validate::new_internship(fields)?;

    let internship = blocking(&state, move |db| {
        db.transaction(|tx| {
            match queries::user_by_id(tx, company_id)? {
                Some(user) if user.role == Role::Company => {}
                _ => {
                    return Err(ApiError::validation(
                        "companyId must reference an existing company",
                    ));
                }
            }
            internships::insert_listing(tx, company_id, &fields)
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(internship)))
}

pub async fn update_internship(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
    ValidJson(req): ValidJson<UpdateInternshipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = validate::internship_patch(req)?;

    let internship = blocking(&state, move |db| {
        db.transaction(|tx| internships::apply_patch(tx, internship_id, &patch))
    })
    .await?;

    Ok(Json(internship))
}

pub async fn delete_internship(
    State(state): State<AppState>,
    actor: Actor,
    Path(internship_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        db.transaction(|tx| internships::remove(tx, internship_id))
    })
    .await?;

    info!("Admin {} deleted internship {}", actor.id, internship_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn internship_applications(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |db| {
        db.transaction(|tx| {
            if queries::internship_by_id(tx, internship_id)?.is_none() {
                return Err(ApiError::not_found("Internship"));
            }
            Ok(queries::list_applications_by_internship(tx, internship_id)?)
        })
    })
    .await?;

    Ok(Json(rows.into_iter().map(views::application_detail).collect::<Vec<_>>()))
}
