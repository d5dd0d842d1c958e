use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Idempotent schema setup. Cross-table ids are deliberately not foreign keys:
/// deleting a user or internship leaves dependent rows in place.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL CHECK (role IN ('student', 'company', 'admin')),
            name        TEXT,
            email       TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS internships (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id      INTEGER NOT NULL,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            requirements    TEXT NOT NULL,
            location        TEXT NOT NULL,
            start_date      TEXT NOT NULL,
            end_date        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_internships_company
            ON internships(company_id);

        CREATE TABLE IF NOT EXISTS applications (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            internship_id   INTEGER NOT NULL,
            student_id      INTEGER NOT NULL,
            resume_url      TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'accepted', 'rejected')),
            applied_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(internship_id, student_id)
        );

        CREATE INDEX IF NOT EXISTS idx_applications_student
            ON applications(student_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
