use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{JoinType, QueryOrder, QuerySelect, SqlErr};
use serde::{Deserialize, Serialize};

use crate::codes;
use crate::error::AttendanceError;

/// A classroom owned by exactly one instructor. Students enter through the
/// join code; archiving (`active = false`) closes the classroom to new joins
/// without touching its history.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "classrooms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub term: Option<String>,
    pub section: Option<String>,
    pub instructor_id: i64,
    pub join_code: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::InstructorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Instructor,

    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,

    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Instructor.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a classroom with a freshly minted join code. The unique index
    /// on `join_code` is the arbiter; on a collision a new code is drawn, up
    /// to a bounded number of attempts.
    pub async fn create(
        db: &DbConn,
        name: &str,
        term: Option<&str>,
        section: Option<&str>,
        instructor_id: i64,
    ) -> Result<Model, AttendanceError> {
        for _ in 0..codes::MAX_CODE_ATTEMPTS {
            let now = Utc::now();
            let classroom = ActiveModel {
                name: Set(name.to_owned()),
                term: Set(term.map(str::to_owned)),
                section: Set(section.map(str::to_owned)),
                instructor_id: Set(instructor_id),
                join_code: Set(codes::generate(codes::JOIN_CODE_LEN)),
                active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            match classroom.insert(db).await {
                Ok(row) => return Ok(row),
                Err(e) => match e.sql_err() {
                    // join_code is the only unique column; draw again.
                    Some(SqlErr::UniqueConstraintViolation(_)) => continue,
                    _ => return Err(e.into()),
                },
            }
        }

        tracing::warn!(instructor_id, "exhausted join code attempts");
        Err(AttendanceError::CodeSpaceExhausted)
    }

    /// Resolves a submitted join code to an active classroom. Archived
    /// classrooms are indistinguishable from unknown codes on purpose.
    pub async fn find_active_by_join_code(
        db: &DbConn,
        submitted: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::JoinCode.eq(codes::normalize(submitted)))
            .filter(Column::Active.eq(true))
            .one(db)
            .await
    }

    pub async fn is_instructor(db: &DbConn, classroom_id: i64, user_id: i64) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id(classroom_id)
            .one(db)
            .await?
            .is_some_and(|c| c.instructor_id == user_id))
    }

    /// Soft-archives the classroom. Already-archived classrooms are left as
    /// they are.
    pub async fn archive(db: &DbConn, id: i64) -> Result<Model, AttendanceError> {
        let Some(classroom) = Entity::find_by_id(id).one(db).await? else {
            return Err(AttendanceError::ClassroomNotFound);
        };
        if !classroom.active {
            return Ok(classroom);
        }

        let mut am: ActiveModel = classroom.into();
        am.active = Set(false);
        am.updated_at = Set(Utc::now());
        Ok(am.update(db).await?)
    }

    /// Active classrooms the user teaches, newest first.
    pub async fn find_taught_by(db: &DbConn, user_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::InstructorId.eq(user_id))
            .filter(Column::Active.eq(true))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    /// Active classrooms the user attends, newest first.
    pub async fn find_attended_by(db: &DbConn, user_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .join(JoinType::InnerJoin, Relation::Enrollments.def())
            .filter(super::enrollment::Column::UserId.eq(user_id))
            .filter(Column::Active.eq(true))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }
}
