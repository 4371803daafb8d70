use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{ConnectionTrait, FromQueryResult, PaginatorTrait, QuerySelect};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::codes;
use crate::error::AttendanceError;
use crate::models::{attendance_session, enrollment, user};

/// How an attendance record came to exist: the student entered the session
/// code themselves, or the instructor marked them present directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString,
    Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_provenance")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Provenance {
    #[sea_orm(string_value = "self_checkin")]
    SelfCheckin,

    #[sea_orm(string_value = "manual")]
    Manual,
}

/// A single student's presence in a single session. A record's existence is
/// presence; absence is never stored. The composite primary key is what
/// enforces "at most one record per (session, student)" regardless of entry
/// path or how many submissions race.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    pub provenance: Provenance,
    pub taken_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id",
        on_delete = "Cascade"
    )]
    Session,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Result of a check-in or manual mark. `newly_recorded` is `false` when the
/// student was already present and the call changed nothing; callers treat
/// both shapes as success.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckinOutcome {
    pub record: Model,
    pub newly_recorded: bool,
}

/// One roster line of the reconciled view: every enrolled student appears,
/// with the attendance record when one exists.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub enrollment: enrollment::Model,
    pub student: user::Model,
    pub record: Option<Model>,
}

#[derive(FromQueryResult)]
struct SessionCountRow {
    session_id: i64,
    count: i64,
}

impl Model {
    pub async fn find_one(
        db: &DbConn,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id((session_id, user_id)).one(db).await
    }

    /// Records a student's self-service check-in against an open session.
    ///
    /// Validation order: session lookup, open state, code, enrollment. The
    /// open-state read is advisory only; the insert itself re-asserts it so
    /// a close that lands between the read and the write cannot slip a
    /// record into a closed session. A repeat submission succeeds without
    /// writing and returns the original record.
    pub async fn check_in(
        db: &DbConn,
        session_id: i64,
        user_id: i64,
        submitted_code: &str,
    ) -> Result<CheckinOutcome, AttendanceError> {
        let Some(session) = attendance_session::Entity::find_by_id(session_id)
            .one(db)
            .await?
        else {
            return Err(AttendanceError::SessionNotFound);
        };

        if !session.is_open {
            return Err(AttendanceError::SessionClosed);
        }

        if !codes::matches(submitted_code, &session.code) {
            return Err(AttendanceError::CodeMismatch);
        }

        if !enrollment::Model::is_enrolled(db, session.classroom_id, user_id).await? {
            return Err(AttendanceError::NotEnrolled);
        }

        Self::commit_self_checkin(db, session_id, user_id).await
    }

    /// The write half of [`check_in`](Self::check_in): the conditional insert
    /// plus the interpretation of its row count. Nothing written means either
    /// the student is already present (idempotent success) or the session
    /// closed after the advisory read.
    async fn commit_self_checkin(
        db: &DbConn,
        session_id: i64,
        user_id: i64,
    ) -> Result<CheckinOutcome, AttendanceError> {
        let written = Self::insert_if_open(db, session_id, user_id).await?;

        if written == 0 {
            return match Self::find_one(db, session_id, user_id).await? {
                Some(existing) => Ok(CheckinOutcome {
                    record: existing,
                    newly_recorded: false,
                }),
                None => Err(AttendanceError::SessionClosed),
            };
        }

        let record = Self::find_one(db, session_id, user_id)
            .await?
            .ok_or_else(|| DbErr::Custom("inserted attendance record vanished".into()))?;
        Ok(CheckinOutcome {
            record,
            newly_recorded: true,
        })
    }

    /// Single conditional statement: insert the record only if the session is
    /// still open, and let the composite primary key swallow duplicates.
    /// `INSERT INTO attendance_records
    ///    SELECT ?, ?, ?, ? FROM attendance_sessions WHERE id = ? AND is_open
    ///  ON CONFLICT DO NOTHING`
    /// Returns the number of rows written (0 or 1).
    async fn insert_if_open(db: &DbConn, session_id: i64, user_id: i64) -> Result<u64, DbErr> {
        let select = Query::select()
            .expr(Expr::val(session_id))
            .expr(Expr::val(user_id))
            .expr(Expr::val(Provenance::SelfCheckin.to_string()))
            .expr(Expr::val(Utc::now()))
            .from(attendance_session::Entity)
            .and_where(attendance_session::Column::Id.eq(session_id))
            .and_where(attendance_session::Column::IsOpen.eq(true))
            .to_owned();

        let mut insert = Query::insert();
        insert
            .into_table(Entity)
            .columns([
                Column::SessionId,
                Column::UserId,
                Column::Provenance,
                Column::TakenAt,
            ])
            .select_from(select)
            .map_err(|e| DbErr::Custom(e.to_string()))?
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::UserId])
                    .do_nothing()
                    .to_owned(),
            );

        let backend = db.get_database_backend();
        let result = db.execute(backend.build(&insert)).await?;
        Ok(result.rows_affected())
    }

    /// Instructor override: marks an enrolled student present without a code.
    ///
    /// Uses the same conflict-swallowing insert as [`check_in`](Self::check_in)
    /// so the one-record invariant holds across entry paths, and carries no
    /// open-state requirement: instructors may correct the roll after closing
    /// a session. Marking an already-present student changes nothing. A user
    /// id with no row at all is distinguished from an existing student who is
    /// merely not enrolled.
    pub async fn mark_manual(
        db: &DbConn,
        session_id: i64,
        user_id: i64,
    ) -> Result<CheckinOutcome, AttendanceError> {
        let Some(session) = attendance_session::Entity::find_by_id(session_id)
            .one(db)
            .await?
        else {
            return Err(AttendanceError::SessionNotFound);
        };

        if user::Entity::find_by_id(user_id).one(db).await?.is_none() {
            return Err(AttendanceError::StudentNotFound);
        }

        if !enrollment::Model::is_enrolled(db, session.classroom_id, user_id).await? {
            return Err(AttendanceError::NotEnrolled);
        }

        let insert = Entity::insert(ActiveModel {
            session_id: sea_orm::ActiveValue::Set(session_id),
            user_id: sea_orm::ActiveValue::Set(user_id),
            provenance: sea_orm::ActiveValue::Set(Provenance::Manual),
            taken_at: sea_orm::ActiveValue::Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([Column::SessionId, Column::UserId])
                .do_nothing()
                .to_owned(),
        );

        let newly_recorded = insert.exec_without_returning(db).await? > 0;

        let record = Self::find_one(db, session_id, user_id)
            .await?
            .ok_or_else(|| DbErr::Custom("inserted attendance record vanished".into()))?;
        Ok(CheckinOutcome {
            record,
            newly_recorded,
        })
    }

    /// Reconciles the classroom roster against this session's records: every
    /// enrolled student appears exactly once, present when a record exists,
    /// absent otherwise. Pure read with no side effects.
    pub async fn reconcile(
        db: &DbConn,
        session_id: i64,
    ) -> Result<Vec<RosterEntry>, AttendanceError> {
        let Some(session) = attendance_session::Entity::find_by_id(session_id)
            .one(db)
            .await?
        else {
            return Err(AttendanceError::SessionNotFound);
        };

        let roster = enrollment::Model::roster(db, session.classroom_id).await?;
        let mut records: HashMap<i64, Model> = Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.user_id, r))
            .collect();

        Ok(roster
            .into_iter()
            .map(|(enrollment, student)| {
                let record = records.remove(&student.id);
                RosterEntry {
                    enrollment,
                    student,
                    record,
                }
            })
            .collect())
    }

    pub async fn count_for_session(db: &DbConn, session_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .count(db)
            .await
    }

    /// Record counts per session, for enriching session listings in one query.
    pub async fn counts_for_sessions(
        db: &DbConn,
        session_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, DbErr> {
        if session_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Entity::find()
            .select_only()
            .column(Column::SessionId)
            .column_as(Column::UserId.count(), "count")
            .filter(Column::SessionId.is_in(session_ids.to_vec()))
            .group_by(Column::SessionId)
            .into_model::<SessionCountRow>()
            .all(db)
            .await?;

        Ok(rows.into_iter().map(|r| (r.session_id, r.count)).collect())
    }

    /// The subset of `session_ids` the user has a record in.
    pub async fn sessions_attended_by(
        db: &DbConn,
        session_ids: &[i64],
        user_id: i64,
    ) -> Result<HashSet<i64>, DbErr> {
        if session_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = Entity::find()
            .filter(Column::SessionId.is_in(session_ids.to_vec()))
            .filter(Column::UserId.eq(user_id))
            .all(db)
            .await?;

        Ok(rows.into_iter().map(|r| r.session_id).collect())
    }

    /// Total present-records across all of a classroom's sessions.
    pub async fn count_for_classroom(db: &DbConn, classroom_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .inner_join(attendance_session::Entity)
            .filter(attendance_session::Column::ClassroomId.eq(classroom_id))
            .count(db)
            .await
    }
}
