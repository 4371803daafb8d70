use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryOrder};
use serde::Serialize;

use crate::codes;
use crate::error::AttendanceError;

/// One instructor-initiated attendance-taking window for a classroom meeting.
///
/// Sessions are created `open` with a short check-in code. Closing ends the
/// check-in window but keeps the code for historical display; reopening
/// re-enables check-in. Sessions are never deleted by this subsystem.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub classroom_id: i64,
    pub created_by: i64,
    pub is_open: bool,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,

    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether `code` is already attached to an open session in the
    /// classroom, other than `exclude` when given. Codes on closed sessions
    /// are free for reuse.
    async fn open_code_in_use(
        db: &DbConn,
        classroom_id: i64,
        code: &str,
        exclude: Option<i64>,
    ) -> Result<bool, DbErr> {
        let mut query = Entity::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .filter(Column::IsOpen.eq(true))
            .filter(Column::Code.eq(code));
        if let Some(id) = exclude {
            query = query.filter(Column::Id.ne(id));
        }
        Ok(query.count(db).await? > 0)
    }

    /// Draws a session code that no currently-open session in the classroom
    /// uses. Session mutations are instructor-driven and low-frequency, so a
    /// scan-then-draw loop is sufficient here; the hardened path is check-in.
    async fn mint_code(db: &DbConn, classroom_id: i64) -> Result<String, AttendanceError> {
        for _ in 0..codes::MAX_CODE_ATTEMPTS {
            let code = codes::generate(codes::SESSION_CODE_LEN);
            if !Self::open_code_in_use(db, classroom_id, &code, None).await? {
                return Ok(code);
            }
        }
        tracing::warn!(classroom_id, "exhausted session code attempts");
        Err(AttendanceError::CodeSpaceExhausted)
    }

    /// Creates a session in state `open`. A specific code may be requested
    /// (fixtures and drills); it is normalized and must not collide with any
    /// open session's code in the classroom.
    pub async fn create(
        db: &DbConn,
        classroom_id: i64,
        created_by: i64,
        requested_code: Option<&str>,
    ) -> Result<Model, AttendanceError> {
        let code = match requested_code {
            Some(raw) => {
                let code = codes::normalize(raw);
                if Self::open_code_in_use(db, classroom_id, &code, None).await? {
                    return Err(AttendanceError::CodeSpaceExhausted);
                }
                code
            }
            None => Self::mint_code(db, classroom_id).await?,
        };

        let now = Utc::now();
        let session = ActiveModel {
            classroom_id: Set(classroom_id),
            created_by: Set(created_by),
            is_open: Set(true),
            code: Set(code),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(session.insert(db).await?)
    }

    /// Flips the open state. Applying the current state again is a no-op.
    ///
    /// Reopening keeps the stored code unless another session in the
    /// classroom has since opened with it, in which case a fresh code is
    /// minted so no two open sessions ever share one.
    pub async fn set_open(db: &DbConn, session_id: i64, open: bool) -> Result<Model, AttendanceError> {
        let Some(session) = Entity::find_by_id(session_id).one(db).await? else {
            return Err(AttendanceError::SessionNotFound);
        };

        if session.is_open == open {
            return Ok(session);
        }

        let mut code = session.code.clone();
        if open && Self::open_code_in_use(db, session.classroom_id, &code, Some(session.id)).await? {
            code = Self::mint_code(db, session.classroom_id).await?;
        }

        let mut am: ActiveModel = session.into();
        am.is_open = Set(open);
        am.code = Set(code);
        am.updated_at = Set(Utc::now());
        Ok(am.update(db).await?)
    }

    /// Sessions of a classroom, most recently created first.
    pub async fn list_for_classroom(db: &DbConn, classroom_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    pub async fn count_for_classroom(db: &DbConn, classroom_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ClassroomId.eq(classroom_id))
            .count(db)
            .await
    }
}
