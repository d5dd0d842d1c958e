use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use placement_db::Connection;
use placement_db::queries;
use placement_types::api::{
    CreateInternshipRequest, InternshipQuery, InternshipResponse, UpdateInternshipRequest,
};

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ValidJson};
use crate::middleware::Actor;
use crate::ownership::verify_internship_ownership;
use crate::validate;
use crate::views;

/// GET /api/internships: public listing with optional `?q=` substring filter.
pub async fn list_internships(
    State(state): State<AppState>,
    Query(query): Query<InternshipQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, |db| Ok(db.get_internships()?)).await?;

    let mut internships: Vec<InternshipResponse> = rows.into_iter().map(views::internship).collect();
    if let Some(needle) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        internships.retain(|i| matches_query(i, needle));
    }

    Ok(Json(internships))
}

/// Case-insensitive literal substring match; no tokenizing or ranking.
fn matches_query(internship: &InternshipResponse, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [
        &internship.title,
        &internship.description,
        &internship.location,
        &internship.company_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// POST /api/internships: the acting company always becomes the owner.
pub async fn create_internship(
    State(state): State<AppState>,
    actor: Actor,
    ValidJson(req): ValidJson<CreateInternshipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = validate::new_internship(req)?;

    let internship = blocking(&state, move |db| {
        db.transaction(|tx| insert_listing(tx, actor.id, &fields))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(internship)))
}

/// GET /api/internships/company
pub async fn company_internships(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |db| Ok(db.get_internships_by_company(actor.id)?)).await?;
    Ok(Json(rows.into_iter().map(views::internship).collect::<Vec<_>>()))
}

/// PATCH /api/internships/{id}
pub async fn update_internship(
    State(state): State<AppState>,
    actor: Actor,
    Path(internship_id): Path<i64>,
    ValidJson(req): ValidJson<UpdateInternshipRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = validate::internship_patch(req)?;

    let internship = blocking(&state, move |db| {
        db.transaction(|tx| {
            verify_internship_ownership(tx, internship_id, actor.id, "edit")?;
            apply_patch(tx, internship_id, &patch)
        })
    })
    .await?;

    Ok(Json(internship))
}

/// DELETE /api/internships/{id}: applications to it are left orphaned.
pub async fn delete_internship(
    State(state): State<AppState>,
    actor: Actor,
    Path(internship_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        db.transaction(|tx| {
            verify_internship_ownership(tx, internship_id, actor.id, "delete")?;
            remove(tx, internship_id)
        })
    })
    .await?;

    info!("Company {} deleted internship {}", actor.id, internship_id);
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn insert_listing(
    conn: &Connection,
    company_id: i64,
    fields: &CreateInternshipRequest,
) -> Result<InternshipResponse, ApiError> {
    let row = queries::insert_internship(conn, company_id, fields)?;
    listing(conn, row.id)
}

pub(crate) fn apply_patch(
    conn: &Connection,
    internship_id: i64,
    patch: &UpdateInternshipRequest,
) -> Result<InternshipResponse, ApiError> {
    queries::update_internship(conn, internship_id, patch)?
        .ok_or_else(|| ApiError::not_found("Internship"))?;
    listing(conn, internship_id)
}

pub(crate) fn remove(conn: &Connection, internship_id: i64) -> Result<(), ApiError> {
    if !queries::delete_internship(conn, internship_id)? {
        return Err(ApiError::not_found("Internship"));
    }
    Ok(())
}

fn listing(conn: &Connection, internship_id: i64) -> Result<InternshipResponse, ApiError> {
    queries::internship_listing_by_id(conn, internship_id)?
        .map(views::internship)
        .ok_or_else(|| ApiError::not_found("Internship"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, location: &str, company: &str) -> InternshipResponse {
        InternshipResponse {
            id: 1,
            company_id: 2,
            company_name: company.into(),
            title: title.into(),
            description: "Work on services".into(),
            requirements: "SQL".into(),
            location: location.into(),
            start_date: "2026-06-01".into(),
            end_date: "2026-08-31".into(),
        }
    }

    #[test]
    fn query_matches_any_text_field() {
        let i = listing("Backend Intern", "Berlin", "acme");
        assert!(matches_query(&i, "backend"));
        assert!(matches_query(&i, "BERL"));
        assert!(matches_query(&i, "acm"));
        assert!(!matches_query(&i, "frontend"));
    }

    #[test]
    fn requirements_are_not_searched() {
        let i = listing("Backend Intern", "Berlin", "acme");
        assert!(!matches_query(&i, "sql"));
    }
}
