//! Attendance-rate and demographic aggregates over a classroom's history.
//!
//! Read-only snapshot queries; no concurrency concerns beyond read-committed.

use sea_orm::entity::prelude::*;
use sea_orm::{FromQueryResult, PaginatorTrait, QueryOrder, QuerySelect};
use serde::Serialize;

use crate::error::AttendanceError;
use crate::models::{attendance_record, attendance_session, classroom, enrollment};

/// Count of enrolled students sharing one demographic value. `None` groups
/// the students who left the field blank.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct MajorCount {
    pub major: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct GraduationYearCount {
    pub graduation_year: Option<i32>,
    pub count: i64,
}

/// The full statistics view for one classroom.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassroomStats {
    pub enrolled_count: u64,
    pub session_count: u64,
    pub present_count: u64,
    /// Present-records over (enrolled x sessions), 0–100, one decimal.
    pub attendance_rate: f64,
    pub by_major: Vec<MajorCount>,
    pub by_graduation_year: Vec<GraduationYearCount>,
}

/// Overall attendance rate: total present-records across all sessions,
/// divided by the number of attendance opportunities (enrolled students
/// times sessions held). A classroom with no students or no sessions has
/// had no opportunities, so its rate is 0.0 rather than a division by zero.
pub fn attendance_rate(present: u64, enrolled: u64, sessions: u64) -> f64 {
    let opportunities = enrolled * sessions;
    if opportunities == 0 {
        return 0.0;
    }
    let pct = present as f64 / opportunities as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Computes [`ClassroomStats`] for a classroom from the current roster and
/// full session history.
pub async fn classroom_stats(
    db: &DbConn,
    classroom_id: i64,
) -> Result<ClassroomStats, AttendanceError> {
    if classroom::Entity::find_by_id(classroom_id).one(db).await?.is_none() {
        return Err(AttendanceError::ClassroomNotFound);
    }

    let enrolled_count = enrollment::Model::count_for_classroom(db, classroom_id).await?;
    let session_count =
        attendance_session::Model::count_for_classroom(db, classroom_id).await?;
    let present_count = attendance_record::Model::count_for_classroom(db, classroom_id).await?;

    let by_major = enrollment::Entity::find()
        .select_only()
        .column(enrollment::Column::Major)
        .column_as(enrollment::Column::UserId.count(), "count")
        .filter(enrollment::Column::ClassroomId.eq(classroom_id))
        .group_by(enrollment::Column::Major)
        .order_by_asc(enrollment::Column::Major)
        .into_model::<MajorCount>()
        .all(db)
        .await?;

    let by_graduation_year = enrollment::Entity::find()
        .select_only()
        .column(enrollment::Column::GraduationYear)
        .column_as(enrollment::Column::UserId.count(), "count")
        .filter(enrollment::Column::ClassroomId.eq(classroom_id))
        .group_by(enrollment::Column::GraduationYear)
        .order_by_asc(enrollment::Column::GraduationYear)
        .into_model::<GraduationYearCount>()
        .all(db)
        .await?;

    Ok(ClassroomStats {
        enrolled_count,
        session_count,
        present_count,
        attendance_rate: attendance_rate(present_count, enrolled_count, session_count),
        by_major,
        by_graduation_year,
    })
}
