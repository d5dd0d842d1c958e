//! Database row types: these map directly to SQLite rows.
//! Distinct from placement-types API models to keep the DB layer independent.

use placement_types::{ApplicationStatus, Role};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: String,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub name: Option<&'a str>,
    pub email: &'a str,
}

#[derive(Debug, Clone)]
pub struct InternshipRow {
    pub id: i64,
    pub company_id: i64,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
}

/// Internship joined with its owner's username (`None` once the owner is deleted).
#[derive(Debug, Clone)]
pub struct InternshipListingRow {
    pub internship: InternshipRow,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: i64,
    pub internship_id: i64,
    pub student_id: i64,
    pub resume_url: String,
    pub status: ApplicationStatus,
    /// SQLite `datetime('now')` text, UTC without offset.
    pub applied_at: String,
}

/// Application joined with the internship title and student username.
#[derive(Debug, Clone)]
pub struct ApplicationDetailRow {
    pub application: ApplicationRow,
    pub internship_title: Option<String>,
    pub student_name: Option<String>,
}
