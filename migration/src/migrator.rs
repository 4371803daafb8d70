use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202608150001_create_users::Migration),
            Box::new(migrations::m202608150002_create_classrooms::Migration),
            Box::new(migrations::m202608150003_create_enrollments::Migration),
            Box::new(migrations::m202608150004_create_attendance::Migration),
        ]
    }
}
