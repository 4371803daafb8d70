pub mod attendance_record;
pub mod attendance_session;
pub mod classroom;
pub mod enrollment;
pub mod user;
