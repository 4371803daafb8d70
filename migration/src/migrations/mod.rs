pub mod m202608150001_create_users;
pub mod m202608150002_create_classrooms;
pub mod m202608150003_create_enrollments;
pub mod m202608150004_create_attendance;
