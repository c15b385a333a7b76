//! 考试成绩实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exam_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub score: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    pub recorded_by: i64,
    pub recorded_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exams::Entity",
        from = "Column::ExamId",
        to = "super::exams::Column::Id"
    )]
    Exam,
}

impl Related<super::exams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_result(self) -> crate::models::exams::entities::ExamResult {
        crate::models::exams::entities::ExamResult {
            id: self.id,
            exam_id: self.exam_id,
            student_id: self.student_id,
            score: self.score,
            remarks: self.remarks,
            recorded_by: self.recorded_by,
            recorded_at: super::ts_to_utc(self.recorded_at),
        }
    }
}
