//! 作业实体

use chrono::{NaiveDate, NaiveTime};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tutor_id: i64,
    pub subject_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub closing_time: NaiveTime,
    pub max_score: f64,
    pub is_group: bool,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tutors::Entity",
        from = "Column::TutorId",
        to = "super::tutors::Column::Id"
    )]
    Tutor,
    #[sea_orm(has_many = "super::assignment_grades::Entity")]
    AssignmentGrades,
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
}

impl Related<super::assignment_grades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignmentGrades.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 转换为业务模型，`grade_ids` 来自关联表
    pub fn into_assignment(
        self,
        grade_ids: Vec<i64>,
    ) -> crate::models::assignments::entities::Assignment {
        use crate::models::assignments::entities::{Assignment, AssignmentStatus};

        Assignment {
            id: self.id,
            tutor_id: self.tutor_id,
            subject_id: self.subject_id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            closing_time: self.closing_time,
            max_score: self.max_score,
            is_group: self.is_group,
            status: self
                .status
                .parse::<AssignmentStatus>()
                .unwrap_or(AssignmentStatus::Active),
            grade_ids,
            created_at: super::ts_to_utc(self.created_at),
            updated_at: super::ts_to_utc(self.updated_at),
        }
    }
}
