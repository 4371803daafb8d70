//! Request and response shapes for the attendance endpoints.

use db::models::attendance_record::{CheckinOutcome, RosterEntry};
use db::models::attendance_session;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckinReq {
    #[validate(length(min = 1, max = 16))]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ManualCheckinReq {
    pub student_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetSessionStateReq {
    pub is_open: bool,
}

#[derive(Debug, Serialize, Default)]
pub struct SessionResponse {
    pub id: i64,
    pub classroom_id: i64,
    pub created_by: i64,
    pub is_open: bool,
    /// Only instructors see the code; students always get `null`. Retained
    /// on closed sessions for historical display.
    pub code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub attended_count: i64,
    pub enrolled_count: i64,
    /// Whether the calling user has a record in this session.
    pub has_checked_in: bool,
}

impl SessionResponse {
    pub fn new(m: attendance_session::Model, include_code: bool) -> Self {
        Self {
            id: m.id,
            classroom_id: m.classroom_id,
            created_by: m.created_by,
            is_open: m.is_open,
            code: include_code.then_some(m.code),
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
            attended_count: 0,
            enrolled_count: 0,
            has_checked_in: false,
        }
    }

    pub fn with_counts(mut self, attended_count: i64, enrolled_count: i64) -> Self {
        self.attended_count = attended_count;
        self.enrolled_count = enrolled_count;
        self
    }

    pub fn with_checked_in(mut self, has_checked_in: bool) -> Self {
        self.has_checked_in = has_checked_in;
        self
    }
}

/// One line of the roster-reconciled view: every enrolled student, present
/// or absent. Absent students carry no timestamp and no provenance.
#[derive(Debug, Serialize)]
pub struct ReconciledEntry {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub student_number: Option<String>,
    pub status: String,
    pub checked_in_at: Option<String>,
    pub provenance: Option<String>,
}

impl From<RosterEntry> for ReconciledEntry {
    fn from(entry: RosterEntry) -> Self {
        Self {
            user_id: entry.student.id,
            name: entry.student.name,
            email: entry.student.email,
            student_number: entry.enrollment.student_number,
            status: if entry.record.is_some() {
                "present".into()
            } else {
                "absent".into()
            },
            checked_in_at: entry.record.as_ref().map(|r| r.taken_at.to_rfc3339()),
            provenance: entry.record.as_ref().map(|r| r.provenance.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct SessionDetailResponse {
    pub session: SessionResponse,
    pub entries: Vec<ReconciledEntry>,
}

#[derive(Debug, Serialize, Default)]
pub struct CheckinResponse {
    pub session_id: i64,
    pub user_id: i64,
    pub status: String,
    pub provenance: String,
    pub taken_at: String,
    /// `false` when the student was already present and nothing was written.
    pub newly_recorded: bool,
}

impl From<CheckinOutcome> for CheckinResponse {
    fn from(outcome: CheckinOutcome) -> Self {
        Self {
            session_id: outcome.record.session_id,
            user_id: outcome.record.user_id,
            status: "present".into(),
            provenance: outcome.record.provenance.to_string(),
            taken_at: outcome.record.taken_at.to_rfc3339(),
            newly_recorded: outcome.newly_recorded,
        }
    }
}
