use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_tables::{Grades, Students, Subjects, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 考试表
        manager
            .create_table(
                Table::create()
                    .table(Exams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Exams::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Exams::SubjectId).big_integer().not_null())
                    .col(ColumnDef::new(Exams::GradeId).big_integer().not_null())
                    .col(ColumnDef::new(Exams::Title).string().not_null())
                    .col(ColumnDef::new(Exams::ExamDate).date().not_null())
                    .col(ColumnDef::new(Exams::StartTime).time().null())
                    .col(ColumnDef::new(Exams::MaxScore).double().not_null())
                    .col(
                        ColumnDef::new(Exams::ResultsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Exams::CreatedBy).big_integer().not_null())
                    .col(ColumnDef::new(Exams::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Exams::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Exams::Table, Exams::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Exams::Table, Exams::GradeId)
                            .to(Grades::Table, Grades::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Exams::Table, Exams::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 考试报名表
        manager
            .create_table(
                Table::create()
                    .table(ExamRegistrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExamRegistrations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExamRegistrations::ExamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamRegistrations::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamRegistrations::RegisteredAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExamRegistrations::Table, ExamRegistrations::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExamRegistrations::Table, ExamRegistrations::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 考试成绩表
        manager
            .create_table(
                Table::create()
                    .table(ExamResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExamResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExamResults::ExamId).big_integer().not_null())
                    .col(
                        ColumnDef::new(ExamResults::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExamResults::Score).double().not_null())
                    .col(ColumnDef::new(ExamResults::Remarks).text().null())
                    .col(
                        ColumnDef::new(ExamResults::RecordedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExamResults::RecordedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExamResults::Table, ExamResults::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExamResults::Table, ExamResults::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_exam_registrations_exam_student")
                    .table(ExamRegistrations::Table)
                    .col(ExamRegistrations::ExamId)
                    .col(ExamRegistrations::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_exam_results_exam_student")
                    .table(ExamResults::Table)
                    .col(ExamResults::ExamId)
                    .col(ExamResults::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExamResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExamRegistrations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exams::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Exams {
    #[sea_orm(iden = "exams")]
    Table,
    Id,
    SubjectId,
    GradeId,
    Title,
    ExamDate,
    StartTime,
    MaxScore,
    ResultsPublished,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExamRegistrations {
    #[sea_orm(iden = "exam_registrations")]
    Table,
    Id,
    ExamId,
    StudentId,
    RegisteredAt,
}

#[derive(DeriveIden)]
enum ExamResults {
    #[sea_orm(iden = "exam_results")]
    Table,
    Id,
    ExamId,
    StudentId,
    Score,
    Remarks,
    RecordedBy,
    RecordedAt,
}
