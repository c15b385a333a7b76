//! 考试实体

use chrono::{NaiveDate, NaiveTime};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub subject_id: i64,
    pub grade_id: i64,
    pub title: String,
    pub exam_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub max_score: f64,
    pub results_published: bool,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::exam_registrations::Entity")]
    Registrations,
    #[sea_orm(has_many = "super::exam_results::Entity")]
    Results,
}

impl Related<super::exam_registrations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl Related<super::exam_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Results.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_exam(self) -> crate::models::exams::entities::Exam {
        crate::models::exams::entities::Exam {
            id: self.id,
            subject_id: self.subject_id,
            grade_id: self.grade_id,
            title: self.title,
            exam_date: self.exam_date,
            start_time: self.start_time,
            max_score: self.max_score,
            results_published: self.results_published,
            created_by: self.created_by,
            created_at: super::ts_to_utc(self.created_at),
            updated_at: super::ts_to_utc(self.updated_at),
        }
    }
}
