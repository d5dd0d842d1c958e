//! Company ownership checks. Existence is not hidden from non-owners: a
//! missing row is `NotFound`, someone else's row is `Forbidden`.
//!
//! Callers run these on the same transaction as the mutation they guard.

use placement_db::Connection;
use placement_db::models::{ApplicationRow, InternshipRow};
use placement_db::queries;

use crate::error::ApiError;

pub fn verify_internship_ownership(
    conn: &Connection,
    internship_id: i64,
    actor_id: i64,
    action: &str,
) -> Result<InternshipRow, ApiError> {
    let internship = queries::internship_by_id(conn, internship_id)?
        .ok_or_else(|| ApiError::not_found("Internship"))?;

    if internship.company_id != actor_id {
        return Err(ApiError::Forbidden(format!(
            "You don't have permission to {action} this internship"
        )));
    }

    Ok(internship)
}

/// Resolves ownership through the parent internship. An application whose
/// internship has been deleted belongs to no company.
pub fn verify_application_ownership(
    conn: &Connection,
    application_id: i64,
    actor_id: i64,
) -> Result<ApplicationRow, ApiError> {
    let application = queries::application_by_id(conn, application_id)?
        .ok_or_else(|| ApiError::not_found("Application"))?;

    let denied =
        || ApiError::Forbidden("You don't have permission to update this application".into());

    let internship = queries::internship_by_id(conn, application.internship_id)?.ok_or_else(denied)?;
    if internship.company_id != actor_id {
        return Err(denied());
    }

    Ok(application)
}
