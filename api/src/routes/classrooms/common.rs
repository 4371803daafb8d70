//! Request and response shapes for the classroom and roster endpoints.

use db::models::{classroom, enrollment, user};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassroomReq {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 64))]
    pub term: Option<String>,
    #[validate(length(max = 32))]
    pub section: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinClassroomReq {
    #[validate(length(min = 1, max = 16))]
    pub code: String,
    #[validate(length(max = 32))]
    pub student_number: Option<String>,
    #[validate(length(max = 64))]
    pub major: Option<String>,
    #[validate(range(min = 1900, max = 2200))]
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddRosterEntryReq {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 32))]
    pub student_number: Option<String>,
    #[validate(length(max = 64))]
    pub major: Option<String>,
    #[validate(range(min = 1900, max = 2200))]
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Serialize, Default)]
pub struct ClassroomResponse {
    pub id: i64,
    pub name: String,
    pub term: Option<String>,
    pub section: Option<String>,
    pub instructor_id: i64,
    pub instructor_name: Option<String>,
    /// `"instructor"` or `"student"`, relative to the caller.
    pub role: String,
    /// Only the instructor sees the join code.
    pub join_code: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ClassroomResponse {
    fn base(m: classroom::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            term: m.term,
            section: m.section,
            instructor_id: m.instructor_id,
            instructor_name: None,
            role: String::new(),
            join_code: None,
            active: m.active,
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
        }
    }

    pub fn for_instructor(m: classroom::Model, instructor_name: Option<String>) -> Self {
        let join_code = Some(m.join_code.clone());
        Self {
            instructor_name,
            role: "instructor".into(),
            join_code,
            ..Self::base(m)
        }
    }

    pub fn for_student(m: classroom::Model, instructor_name: Option<String>) -> Self {
        Self {
            instructor_name,
            role: "student".into(),
            join_code: None,
            ..Self::base(m)
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct RosterEntryResponse {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub student_number: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub enrolled_at: String,
}

impl RosterEntryResponse {
    pub fn from_parts(enrollment: enrollment::Model, student: user::Model) -> Self {
        Self {
            user_id: student.id,
            name: student.name,
            email: student.email,
            student_number: enrollment.student_number,
            major: enrollment.major,
            graduation_year: enrollment.graduation_year,
            enrolled_at: enrollment.created_at.to_rfc3339(),
        }
    }
}
