use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryOrder, SqlErr};
use serde::{Deserialize, Serialize};

use crate::error::AttendanceError;

/// Membership of a person in a classroom, carrying the demographic fields the
/// statistics aggregates group by. A person holds at most one enrollment per
/// classroom; the student number, when present, is unique within a classroom.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub classroom_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    pub student_number: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classroom::Entity",
        from = "Column::ClassroomId",
        to = "super::classroom::Column::Id",
        on_delete = "Cascade"
    )]
    Classroom,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Enrolls a user in a classroom. The composite primary key and the
    /// per-classroom student-number index back the uniqueness rules; a
    /// violation of the latter surfaces as [`AttendanceError::DuplicateStudentNumber`].
    pub async fn enroll(
        db: &DbConn,
        classroom_id: i64,
        user_id: i64,
        student_number: Option<&str>,
        major: Option<&str>,
        graduation_year: Option<i32>,
    ) -> Result<Model, AttendanceError> {
        if Self::is_enrolled(db, classroom_id, user_id).await? {
            return Err(AttendanceError::AlreadyEnrolled);
        }

        let enrollment = ActiveModel {
            classroom_id: Set(classroom_id),
            user_id: Set(user_id),
            student_number: Set(student_number.map(str::to_owned)),
            major: Set(major.map(str::to_owned)),
            graduation_year: Set(graduation_year),
            created_at: Set(Utc::now()),
        };

        match enrollment.insert(db).await {
            Ok(row) => Ok(row),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(msg)) => {
                    if msg.contains("student_number") {
                        Err(AttendanceError::DuplicateStudentNumber)
                    } else {
                        Err(AttendanceError::AlreadyEnrolled)
                    }
                }
                _ => Err(e.into()),
            },
        }
    }

    pub async fn is_enrolled(db: &DbConn, classroom_id: i64, user_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((classroom_id, user_id))
            .one(db)
            .await?
            .is_some())
    }

    pub async fn find_one(
        db: &DbConn,
        classroom_id: i64,
        user_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id((classroom_id, user_id)).one(db).await
    }

    /// The full roster of a classroom with each student's reference row,
    /// ordered by student name.
    pub async fn roster(
        db: &DbConn,
        classroom_id: i64,
    ) -> Result<Vec<(Model, super::user::Model)>, DbErr> {
        let rows = Entity::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .find_also_related(super::user::Entity)
            .order_by_asc(super::user::Column::Name)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(enrollment, student)| student.map(|s| (enrollment, s)))
            .collect())
    }

    pub async fn count_for_classroom(db: &DbConn, classroom_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .count(db)
            .await
    }

    /// Removes a student from the roster. The user must exist; removing one
    /// who is not on the roster is a no-op. Attendance records are kept, but
    /// a removed student no longer appears in reconciled views or statistics.
    pub async fn unenroll(
        db: &DbConn,
        classroom_id: i64,
        user_id: i64,
    ) -> Result<(), AttendanceError> {
        if super::user::Entity::find_by_id(user_id).one(db).await?.is_none() {
            return Err(AttendanceError::StudentNotFound);
        }

        Entity::delete_by_id((classroom_id, user_id)).exec(db).await?;
        Ok(())
    }
}
