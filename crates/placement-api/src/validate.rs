use chrono::NaiveDate;

use placement_types::api::{CreateInternshipRequest, UpdateInternshipRequest};

use crate::error::ApiError;

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(ApiError::validation("Username must be between 3 and 32 characters"));
    }
    Ok(username.to_string())
}

/// Stored usernames are trimmed; lookups must match that form.
pub(crate) fn lookup_name(raw: &str) -> &str {
    raw.trim()
}

pub(crate) fn password(raw: &str) -> Result<(), ApiError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("Password must be at least 8 characters"));
    }
    Ok(())
}

pub(crate) fn email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(ApiError::validation("A valid email address is required")),
    }
}

pub(crate) fn required_text(field: &str, raw: &str) -> Result<String, ApiError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// `None` stays `None`; a present value must not be blank.
pub(crate) fn optional_text(field: &str, raw: Option<&str>) -> Result<Option<String>, ApiError> {
    raw.map(|value| required_text(field, value)).transpose()
}

/// Calendar date only. No ordering check against any other date.
pub(crate) fn date(field: &str, raw: &str) -> Result<String, ApiError> {
    let value = required_text(field, raw)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{field} must be a date in YYYY-MM-DD format")))?;
    Ok(value)
}

pub(crate) fn new_internship(req: CreateInternshipRequest) -> Result<CreateInternshipRequest, ApiError> {
    Ok(CreateInternshipRequest {
        title: required_text("title", &req.title)?,
        description: required_text("description", &req.description)?,
        requirements: required_text("requirements", &req.requirements)?,
        location: required_text("location", &req.location)?,
        start_date: date("startDate", &req.start_date)?,
        end_date: date("endDate", &req.end_date)?,
    })
}

pub(crate) fn internship_patch(req: UpdateInternshipRequest) -> Result<UpdateInternshipRequest, ApiError> {
    Ok(UpdateInternshipRequest {
        title: optional_text("title", req.title.as_deref())?,
        description: optional_text("description", req.description.as_deref())?,
        requirements: optional_text("requirements", req.requirements.as_deref())?,
        location: optional_text("location", req.location.as_deref())?,
        start_date: req.start_date.as_deref().map(|d| date("startDate", d)).transpose()?,
        end_date: req.end_date.as_deref().map(|d| date("endDate", d)).transpose()?,
    })
}
