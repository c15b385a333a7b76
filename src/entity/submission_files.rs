//! 提交文件实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "submission_files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub file_name: String,
    pub file_url: String,
    pub uploaded_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id"
    )]
    Submission,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_submission_file(self) -> crate::models::submissions::entities::SubmissionFile {
        crate::models::submissions::entities::SubmissionFile {
            id: self.id,
            submission_id: self.submission_id,
            file_name: self.file_name,
            file_url: self.file_url,
            uploaded_at: super::ts_to_utc(self.uploaded_at),
        }
    }
}
