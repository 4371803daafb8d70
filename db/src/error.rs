use sea_orm::DbErr;
use thiserror::Error;

/// Domain failures surfaced by the roster and attendance stores.
///
/// Authorization failures are not represented here: ownership and role checks
/// happen per request in the API layer before store operations run. A repeat
/// check-in is not an error either; both entry paths report it as a
/// successful, non-inserting outcome.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("classroom not found")]
    ClassroomNotFound,

    #[error("attendance session not found")]
    SessionNotFound,

    #[error("student not found")]
    StudentNotFound,

    #[error("not enrolled in this classroom")]
    NotEnrolled,

    #[error("already enrolled in this classroom")]
    AlreadyEnrolled,

    #[error("student number already in use in this classroom")]
    DuplicateStudentNumber,

    #[error("attendance session is closed")]
    SessionClosed,

    #[error("invalid check-in code")]
    CodeMismatch,

    #[error("ran out of unused codes")]
    CodeSpaceExhausted,

    #[error(transparent)]
    Database(#[from] DbErr),
}
