use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A person known to the system. Credentials live with the external identity
/// provider; this row only exists so enrollments and attendance records have
/// someone to reference.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::classroom::Entity")]
    Classrooms,

    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,

    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classrooms.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(db: &DbConn, email: &str, name: &str) -> Result<Model, DbErr> {
        let now = Utc::now();
        let user = ActiveModel {
            email: Set(email.to_owned()),
            name: Set(name.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        user.insert(db).await
    }

    pub async fn find_by_email(db: &DbConn, email: &str) -> Result<Option<Model>, DbErr> {
        Entity::find().filter(Column::Email.eq(email)).one(db).await
    }

    /// Looks up a user by email, creating the reference row if absent.
    /// The manual roster path adds students who have never signed in.
    pub async fn find_or_create_by_email(
        db: &DbConn,
        email: &str,
        name: &str,
    ) -> Result<Model, DbErr> {
        if let Some(existing) = Self::find_by_email(db, email).await? {
            return Ok(existing);
        }
        Self::create(db, email, name).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn find_or_create_reuses_existing_row() {
        let db = setup_test_db().await;

        let first = Model::find_or_create_by_email(&db, "ada@example.com", "Ada")
            .await
            .unwrap();
        let second = Model::find_or_create_by_email(&db, "ada@example.com", "Ada L.")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        // The stored name is not overwritten by a later lookup.
        assert_eq!(second.name, "Ada");
    }
}
