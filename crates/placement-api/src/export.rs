use rust_xlsxwriter::{Format, Workbook, XlsxError};

use placement_types::api::ApplicationResponse;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EXPORT_FILENAME: &str = "applications.xlsx";
const SHEET_NAME: &str = "Applications";

const COLUMNS: [&str; 8] = [
    "id",
    "studentId",
    "studentName",
    "internshipId",
    "internshipTitle",
    "status",
    "appliedAt",
    "resumeUrl",
];

/// Serialize joined application rows into a single-sheet workbook: one header
/// row, then one row per application in the order given.
pub fn write_workbook(applications: &[ApplicationResponse]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (idx, app) in applications.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_number(row, 0, app.id as f64)?;
        sheet.write_number(row, 1, app.student_id as f64)?;
        sheet.write_string(row, 2, label(&app.student_name))?;
        sheet.write_number(row, 3, app.internship_id as f64)?;
        sheet.write_string(row, 4, label(&app.internship_title))?;
        sheet.write_string(row, 5, app.status.as_str())?;
        sheet.write_string(row, 6, app.applied_at.to_rfc3339())?;
        sheet.write_string(row, 7, &app.resume_url)?;
    }

    workbook.save_to_buffer()
}

fn label(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(placement_types::UNKNOWN_LABEL)
}
