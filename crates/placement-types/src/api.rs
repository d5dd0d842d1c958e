use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::models::{ApplicationStatus, Role};

// -- JWT Claims --

/// Bearer token claims. `role` is informational; the middleware re-reads the
/// user's current role from the database on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

/// Public registration. Students are identified by `studentId`, which becomes
/// their username.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub student_id: Option<String>,
    pub password: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: String,
}

/// Admin patch; omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub email: Option<String>,
}

// -- Internships --

#[derive(Debug, Deserialize)]
pub struct InternshipQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateInternshipRequest {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
}

/// Admin variant of [`CreateInternshipRequest`] naming the owning company.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminCreateInternshipRequest {
    pub company_id: i64,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
}

impl AdminCreateInternshipRequest {
    pub fn into_parts(self) -> (i64, CreateInternshipRequest) {
        (
            self.company_id,
            CreateInternshipRequest {
                title: self.title,
                description: self.description,
                requirements: self.requirements,
                location: self.location,
                start_date: self.start_date,
                end_date: self.end_date,
            },
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateInternshipRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternshipResponse {
    pub id: i64,
    pub company_id: i64,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
}

// -- Applications --

/// `status` and `appliedAt` are server-assigned; clients that echo them back
/// are tolerated and the values discarded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateApplicationRequest {
    pub internship_id: i64,
    pub resume_url: String,
    #[serde(default)]
    pub status: Option<IgnoredAny>,
    #[serde(default)]
    pub applied_at: Option<IgnoredAny>,
}

/// Carried as a raw string so unknown values surface as an invalid status
/// rather than a malformed body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: i64,
    pub internship_id: i64,
    pub student_id: i64,
    pub resume_url: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internship_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_application_discards_server_fields() {
        let req: CreateApplicationRequest = serde_json::from_str(
            r#"{"internshipId":4,"resumeUrl":"https://cv.example/a","status":"accepted","appliedAt":"1999-01-01"}"#,
        )
        .unwrap();
        assert_eq!(req.internship_id, 4);
        assert_eq!(req.resume_url, "https://cv.example/a");
    }

    #[test]
    fn create_application_rejects_other_fields() {
        let res = serde_json::from_str::<CreateApplicationRequest>(
            r#"{"internshipId":4,"resumeUrl":"x","studentId":9}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn internship_patch_rejects_company_reassignment() {
        let res = serde_json::from_str::<UpdateInternshipRequest>(r#"{"companyId":2}"#);
        assert!(res.is_err());

        let patch: UpdateInternshipRequest =
            serde_json::from_str(r#"{"title":"Backend Intern"}"#).unwrap();
        assert_eq!(patch.title.as_deref(), Some("Backend Intern"));
        assert!(patch.location.is_none());
    }

    #[test]
    fn register_uses_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"studentId":"s1234","password":"hunter22!","role":"student","name":"Ada","email":"ada@uni.edu"}"#,
        )
        .unwrap();
        assert_eq!(req.student_id.as_deref(), Some("s1234"));
        assert_eq!(req.role, Role::Student);
        assert!(req.username.is_none());
    }

    #[test]
    fn application_response_omits_absent_join_labels() {
        let resp = ApplicationResponse {
            id: 1,
            internship_id: 2,
            student_id: 3,
            resume_url: "https://cv.example/a".into(),
            status: ApplicationStatus::Pending,
            applied_at: DateTime::<Utc>::default(),
            internship_title: Some("Backend Intern".into()),
            student_name: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["internshipTitle"], "Backend Intern");
        assert_eq!(json["status"], "pending");
        assert!(json.get("studentName").is_none());
    }
}
