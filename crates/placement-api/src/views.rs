use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use placement_db::models::{ApplicationDetailRow, ApplicationRow, InternshipListingRow, UserRow};
use placement_types::UNKNOWN_LABEL;
use placement_types::api::{ApplicationResponse, InternshipResponse, UserResponse};

pub(crate) fn user(row: UserRow) -> UserResponse {
    UserResponse {
        id: row.id,
        username: row.username,
        role: row.role,
        name: row.name,
        email: row.email,
    }
}

pub(crate) fn internship(row: InternshipListingRow) -> InternshipResponse {
    let InternshipListingRow {
        internship,
        company_name,
    } = row;

    InternshipResponse {
        id: internship.id,
        company_id: internship.company_id,
        company_name: company_name.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        title: internship.title,
        description: internship.description,
        requirements: internship.requirements,
        location: internship.location,
        start_date: internship.start_date,
        end_date: internship.end_date,
    }
}

pub(crate) fn application(row: ApplicationRow) -> ApplicationResponse {
    ApplicationResponse {
        applied_at: parse_timestamp(&row.applied_at, row.id),
        id: row.id,
        internship_id: row.internship_id,
        student_id: row.student_id,
        resume_url: row.resume_url,
        status: row.status,
        internship_title: None,
        student_name: None,
    }
}

/// Joined view; labels of deleted rows fall back to "Unknown".
pub(crate) fn application_detail(row: ApplicationDetailRow) -> ApplicationResponse {
    ApplicationResponse {
        internship_title: Some(row.internship_title.unwrap_or_else(|| UNKNOWN_LABEL.to_string())),
        student_name: Some(row.student_name.unwrap_or_else(|| UNKNOWN_LABEL.to_string())),
        ..application(row.application)
    }
}

fn parse_timestamp(raw: &str, application_id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt applied_at '{}' on application {}: {}", raw, application_id, e);
            DateTime::default()
        })
}
