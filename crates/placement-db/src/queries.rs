use std::str::FromStr;

use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

use placement_types::ApplicationStatus;
use placement_types::api::{CreateInternshipRequest, UpdateInternshipRequest};

use crate::Database;
use crate::models::{
    ApplicationDetailRow, ApplicationRow, InternshipListingRow, InternshipRow, NewUser, UserRow,
};

const USER_COLUMNS: &str = "id, username, password, role, name, email";
const INTERNSHIP_COLUMNS: &str =
    "id, company_id, title, description, requirements, location, start_date, end_date";
const APPLICATION_COLUMNS: &str = "id, internship_id, student_id, resume_url, status, applied_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| insert_user(conn, user))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_id(conn, id))
    }

    pub fn get_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(list_users)
    }

    pub fn set_password(&self, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| update_user_password(conn, username, password_hash))
    }

    // -- Internships --

    pub fn get_internships(&self) -> Result<Vec<InternshipListingRow>> {
        self.with_conn(list_internships)
    }

    pub fn get_internships_by_company(&self, company_id: i64) -> Result<Vec<InternshipListingRow>> {
        self.with_conn(|conn| list_internships_by_company(conn, company_id))
    }

    // -- Applications --

    pub fn get_applications_by_student(&self, student_id: i64) -> Result<Vec<ApplicationDetailRow>> {
        self.with_conn(|conn| list_applications_by_student(conn, student_id))
    }

    pub fn get_all_applications(&self) -> Result<Vec<ApplicationDetailRow>> {
        self.with_conn(list_all_applications)
    }
}

// -- Users --

pub fn insert_user(conn: &Connection, user: &NewUser<'_>) -> Result<UserRow> {
    let sql = format!(
        "INSERT INTO users (username, password, role, name, email) VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING {USER_COLUMNS}"
    );
    let row = conn.query_row(
        &sql,
        params![user.username, user.password_hash, user.role.as_str(), user.name, user.email],
        user_from_row,
    )?;
    Ok(row)
}

pub fn user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, [id], user_from_row).optional()
}

pub fn user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    conn.query_row(&sql, [username], user_from_row).optional()
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Coalesce-merge: `None` keeps the stored value. Returns `None` if no such user.
pub fn update_user(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    role: Option<&str>,
    email: Option<&str>,
) -> Result<Option<UserRow>> {
    let sql = format!(
        "UPDATE users
         SET name = COALESCE(?1, name), role = COALESCE(?2, role), email = COALESCE(?3, email)
         WHERE id = ?4
         RETURNING {USER_COLUMNS}"
    );
    conn.query_row(&sql, params![name, role, email, id], user_from_row)
        .optional()
}

pub fn update_user_password(conn: &Connection, username: &str, password_hash: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE users SET password = ?1 WHERE username = ?2",
        (password_hash, username),
    )?;
    Ok(changed > 0)
}

/// Removes only the user row; their internships and applications stay behind.
pub fn delete_user(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

// -- Internships --

pub fn insert_internship(
    conn: &Connection,
    company_id: i64,
    fields: &CreateInternshipRequest,
) -> Result<InternshipRow> {
    let sql = format!(
        "INSERT INTO internships
            (company_id, title, description, requirements, location, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING {INTERNSHIP_COLUMNS}"
    );
    let row = conn.query_row(
        &sql,
        params![
            company_id,
            fields.title,
            fields.description,
            fields.requirements,
            fields.location,
            fields.start_date,
            fields.end_date,
        ],
        internship_from_row,
    )?;
    Ok(row)
}

pub fn internship_by_id(conn: &Connection, id: i64) -> Result<Option<InternshipRow>> {
    let sql = format!("SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE id = ?1");
    conn.query_row(&sql, [id], internship_from_row).optional()
}

pub fn internship_listing_by_id(conn: &Connection, id: i64) -> Result<Option<InternshipListingRow>> {
    let mut rows = query_listings(conn, "WHERE i.id = ?1", [id])?;
    Ok(rows.pop())
}

pub fn list_internships(conn: &Connection) -> Result<Vec<InternshipListingRow>> {
    query_listings(conn, "", params![])
}

pub fn list_internships_by_company(
    conn: &Connection,
    company_id: i64,
) -> Result<Vec<InternshipListingRow>> {
    query_listings(conn, "WHERE i.company_id = ?1", [company_id])
}

/// Partial update; fields left `None` keep their stored value.
pub fn update_internship(
    conn: &Connection,
    id: i64,
    changes: &UpdateInternshipRequest,
) -> Result<Option<InternshipRow>> {
    let sql = format!(
        "UPDATE internships
         SET title = COALESCE(?1, title),
             description = COALESCE(?2, description),
             requirements = COALESCE(?3, requirements),
             location = COALESCE(?4, location),
             start_date = COALESCE(?5, start_date),
             end_date = COALESCE(?6, end_date)
         WHERE id = ?7
         RETURNING {INTERNSHIP_COLUMNS}"
    );
    conn.query_row(
        &sql,
        params![
            changes.title,
            changes.description,
            changes.requirements,
            changes.location,
            changes.start_date,
            changes.end_date,
            id,
        ],
        internship_from_row,
    )
    .optional()
}

/// Dependent applications are left pointing at the removed id.
pub fn delete_internship(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM internships WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

// -- Applications --

/// Status and timestamp are always assigned here, never by the caller.
pub fn insert_application(
    conn: &Connection,
    internship_id: i64,
    student_id: i64,
    resume_url: &str,
) -> Result<ApplicationRow> {
    let sql = format!(
        "INSERT INTO applications (internship_id, student_id, resume_url, status, applied_at)
         VALUES (?1, ?2, ?3, 'pending', datetime('now'))
         RETURNING {APPLICATION_COLUMNS}"
    );
    let row = conn.query_row(
        &sql,
        params![internship_id, student_id, resume_url],
        application_from_row,
    )?;
    Ok(row)
}

pub fn application_by_id(conn: &Connection, id: i64) -> Result<Option<ApplicationRow>> {
    let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1");
    conn.query_row(&sql, [id], application_from_row).optional()
}

pub fn has_applied(conn: &Connection, internship_id: i64, student_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM applications WHERE internship_id = ?1 AND student_id = ?2",
            [internship_id, student_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn list_applications_by_student(
    conn: &Connection,
    student_id: i64,
) -> Result<Vec<ApplicationDetailRow>> {
    query_details(conn, "WHERE a.student_id = ?1", [student_id])
}

pub fn list_applications_by_internship(
    conn: &Connection,
    internship_id: i64,
) -> Result<Vec<ApplicationDetailRow>> {
    query_details(conn, "WHERE a.internship_id = ?1", [internship_id])
}

pub fn list_all_applications(conn: &Connection) -> Result<Vec<ApplicationDetailRow>> {
    query_details(conn, "", params![])
}

pub fn update_application_status(
    conn: &Connection,
    id: i64,
    status: ApplicationStatus,
) -> Result<Option<ApplicationRow>> {
    let sql = format!(
        "UPDATE applications SET status = ?1 WHERE id = ?2 RETURNING {APPLICATION_COLUMNS}"
    );
    conn.query_row(&sql, params![status.as_str(), id], application_from_row)
        .optional()
}

pub fn delete_application(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM applications WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

// -- Joined queries --

fn query_listings<P: rusqlite::Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> Result<Vec<InternshipListingRow>> {
    // LEFT JOIN so internships of deleted companies still list
    let sql = format!(
        "SELECT i.id, i.company_id, i.title, i.description, i.requirements, i.location,
                i.start_date, i.end_date, u.username
         FROM internships i
         LEFT JOIN users u ON i.company_id = u.id
         {filter}
         ORDER BY i.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(InternshipListingRow {
                internship: internship_from_row(row)?,
                company_name: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_details<P: rusqlite::Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> Result<Vec<ApplicationDetailRow>> {
    let sql = format!(
        "SELECT a.id, a.internship_id, a.student_id, a.resume_url, a.status, a.applied_at,
                i.title, u.username
         FROM applications a
         LEFT JOIN internships i ON a.internship_id = i.id
         LEFT JOIN users u ON a.student_id = u.id
         {filter}
         ORDER BY a.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(ApplicationDetailRow {
                application: application_from_row(row)?,
                internship_title: row.get(6)?,
                student_name: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Row mapping --

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        role: parse_column(row, 3)?,
        name: row.get(4)?,
        email: row.get(5)?,
    })
}

fn internship_from_row(row: &Row<'_>) -> rusqlite::Result<InternshipRow> {
    Ok(InternshipRow {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        requirements: row.get(4)?,
        location: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
    })
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        internship_id: row.get(1)?,
        student_id: row.get(2)?,
        resume_url: row.get(3)?,
        status: parse_column(row, 4)?,
        applied_at: row.get(5)?,
    })
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_types::Role;

    fn new_user<'a>(username: &'a str, role: Role) -> NewUser<'a> {
        NewUser {
            username,
            password_hash: "$argon2id$placeholder",
            role,
            name: None,
            email: "someone@example.com",
        }
    }

    fn posting(title: &str) -> CreateInternshipRequest {
        CreateInternshipRequest {
            title: title.into(),
            description: "Build services".into(),
            requirements: "Rust".into(),
            location: "Remote".into(),
            start_date: "2026-06-01".into(),
            end_date: "2026-08-31".into(),
        }
    }

    #[test]
    fn user_roundtrip_through_sqlite() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_user(&new_user("acme", Role::Company)).unwrap();
        assert_eq!(created.role, Role::Company);

        let found = db.get_user_by_username("acme").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(db.get_user_by_id(created.id + 100).unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("acme", Role::Company)).unwrap();
        assert!(db.create_user(&new_user("acme", Role::Student)).is_err());
    }

    #[test]
    fn update_user_keeps_unspecified_fields() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("ada", Role::Student)).unwrap();

        let updated = db
            .with_conn(|conn| update_user(conn, user.id, Some("Ada L."), None, None))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ada L."));
        assert_eq!(updated.role, Role::Student);
        assert_eq!(updated.email, "someone@example.com");

        let missing = db
            .with_conn(|conn| update_user(conn, 999, None, Some("admin"), None))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn internship_patch_coalesces() {
        let db = Database::open_in_memory().unwrap();
        let row = db
            .with_conn(|conn| insert_internship(conn, 7, &posting("Backend Intern")))
            .unwrap();

        let patch = UpdateInternshipRequest {
            location: Some("Berlin".into()),
            ..Default::default()
        };
        let updated = db
            .with_conn(|conn| update_internship(conn, row.id, &patch))
            .unwrap()
            .unwrap();
        assert_eq!(updated.location, "Berlin");
        assert_eq!(updated.title, "Backend Intern");
        assert_eq!(updated.start_date, "2026-06-01");
        assert_eq!(updated.company_id, 7);
    }

    #[test]
    fn new_application_is_pending_with_timestamp() {
        let db = Database::open_in_memory().unwrap();
        let app = db
            .with_conn(|conn| insert_application(conn, 1, 2, "https://cv.example/a"))
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert!(!app.applied_at.is_empty());
        assert!(db.with_conn(|conn| has_applied(conn, 1, 2)).unwrap());
        assert!(!db.with_conn(|conn| has_applied(conn, 1, 3)).unwrap());
    }

    #[test]
    fn deleting_rows_leaves_orphans_visible() {
        let db = Database::open_in_memory().unwrap();
        let company = db.create_user(&new_user("acme", Role::Company)).unwrap();
        let student = db.create_user(&new_user("s1", Role::Student)).unwrap();
        let internship = db
            .with_conn(|conn| insert_internship(conn, company.id, &posting("Backend Intern")))
            .unwrap();
        db.with_conn(|conn| insert_application(conn, internship.id, student.id, "https://cv.example/a"))
            .unwrap();

        assert!(db.with_conn(|conn| delete_user(conn, company.id)).unwrap());
        assert!(db.with_conn(|conn| delete_user(conn, student.id)).unwrap());

        let listings = db.get_internships().unwrap();
        assert_eq!(listings.len(), 1);
        assert!(listings[0].company_name.is_none());

        assert!(db.with_conn(|conn| delete_internship(conn, internship.id)).unwrap());
        let apps = db.get_all_applications().unwrap();
        assert_eq!(apps.len(), 1);
        assert!(apps[0].internship_title.is_none());
        assert!(apps[0].student_name.is_none());
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let res: Result<()> = db.transaction(|tx| {
            insert_application(tx, 1, 2, "https://cv.example/a")?;
            Err(anyhow::anyhow!("abort"))
        });
        assert!(res.is_err());
        assert!(db.get_all_applications().unwrap().is_empty());
    }

    #[test]
    fn missing_rows_report_false() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.with_conn(|conn| delete_application(conn, 1)).unwrap());
        assert!(!db.set_password("nobody", "hash").unwrap());
        let status = db
            .with_conn(|conn| update_application_status(conn, 1, ApplicationStatus::Accepted))
            .unwrap();
        assert!(status.is_none());
    }
}
