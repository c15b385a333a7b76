use std::collections::HashMap;

use chrono::NaiveDate;

use super::enrollments::{active_pairs, student_eligible};
use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::exams::{ActiveModel, Column, Entity as Exams};
use crate::entity::prelude::{ExamRegistrations, ExamResults, Grades, Students, Subjects, Tutors};
use crate::entity::{exam_registrations, exam_results, students};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    exams::{
        entities::{Exam, ExamRegistration, ExamResult},
        requests::{CreateExamRequest, ExamListParams, RecordResultRequest, UpdateExamRequest},
        responses::{ExamResultDetail, MyExamResult, RegistrationDetail},
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

async fn find_exam<C: ConnectionTrait>(db: &C, exam_id: i64) -> Result<crate::entity::exams::Model> {
    Exams::find_by_id(exam_id)
        .one(db)
        .await
        .map_err(db_err("查询考试失败"))?
        .ok_or_else(|| PortalError::not_found("Exam not found"))
}

/// 导师只能管理本科目的考试
async fn ensure_tutor_subject<C: ConnectionTrait>(
    db: &C,
    tutor_id: i64,
    subject_id: i64,
) -> Result<()> {
    let tutor = Tutors::find_by_id(tutor_id)
        .one(db)
        .await
        .map_err(db_err("查询导师失败"))?
        .ok_or_else(|| PortalError::not_found("Tutor profile not found"))?;
    if tutor.subject_id != subject_id {
        return Err(PortalError::authorization(
            "Tutors can only manage exams of their own subject",
        ));
    }
    Ok(())
}

fn check_max_score(max_score: f64) -> Result<()> {
    if !(max_score.is_finite() && max_score > 0.0) {
        return Err(PortalError::validation("Max score must be greater than 0"));
    }
    Ok(())
}

impl SeaOrmStorage {
    pub async fn create_exam_impl(&self, created_by: i64, req: CreateExamRequest) -> Result<Exam> {
        req.validate()?;

        if Subjects::find_by_id(req.subject_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询科目失败"))?
            .is_none()
        {
            return Err(PortalError::not_found(format!(
                "Subject {} not found",
                req.subject_id
            )));
        }
        if Grades::find_by_id(req.grade_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询年级失败"))?
            .is_none()
        {
            return Err(PortalError::not_found(format!(
                "Grade {} not found",
                req.grade_id
            )));
        }

        let now = now_ts();
        let exam = ActiveModel {
            subject_id: Set(req.subject_id),
            grade_id: Set(req.grade_id),
            title: Set(req.title.trim().to_string()),
            exam_date: Set(req.exam_date),
            start_time: Set(req.start_time),
            max_score: Set(req.max_score),
            results_published: Set(false),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err("创建考试失败"))?;

        Ok(exam.into_exam())
    }

    pub async fn get_exam_impl(&self, id: i64) -> Result<Option<Exam>> {
        let result = Exams::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询考试失败"))?;

        Ok(result.map(|m| m.into_exam()))
    }

    pub async fn list_exams_impl(&self, query: ExamListParams) -> Result<PaginatedResponse<Exam>> {
        let (page, size) = query.pagination.normalized();

        let mut select = Exams::find();
        if let Some(subject_id) = query.subject_id {
            select = select.filter(Column::SubjectId.eq(subject_id));
        }
        if let Some(grade_id) = query.grade_id {
            select = select.filter(Column::GradeId.eq(grade_id));
        }

        let paginator = select
            .order_by_desc(Column::ExamDate)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询考试总数失败"))?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询考试列表失败"))?;

        Ok(PaginatedResponse {
            items: items.into_iter().map(|m| m.into_exam()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn list_student_exams_impl(&self, student_id: i64) -> Result<Vec<Exam>> {
        let pairs = active_pairs(&self.db, student_id).await?;
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let mut any = Condition::any();
        for (subject_id, grade_id) in pairs {
            any = any.add(
                Condition::all()
                    .add(Column::SubjectId.eq(subject_id))
                    .add(Column::GradeId.eq(grade_id)),
            );
        }

        let exams = Exams::find()
            .filter(any)
            .order_by_asc(Column::ExamDate)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询考试失败"))?;

        Ok(exams.into_iter().map(|m| m.into_exam()).collect())
    }

    pub async fn update_exam_impl(&self, id: i64, update: UpdateExamRequest) -> Result<Option<Exam>> {
        let Some(existing) = Exams::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("查询考试失败"))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(now_ts());

        if let Some(title) = update.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(PortalError::validation("Title must not be empty"));
            }
            model.title = Set(title);
        }
        if let Some(exam_date) = update.exam_date {
            model.exam_date = Set(exam_date);
        }
        if let Some(start_time) = update.start_time {
            model.start_time = Set(Some(start_time));
        }
        if let Some(max_score) = update.max_score {
            check_max_score(max_score)?;
            model.max_score = Set(max_score);
        }

        let updated = model.update(&self.db).await.map_err(db_err("更新考试失败"))?;

        Ok(Some(updated.into_exam()))
    }

    /// 报名与成绩一并删除
    pub async fn delete_exam_impl(&self, id: i64) -> Result<bool> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        ExamResults::delete_many()
            .filter(exam_results::Column::ExamId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除考试成绩失败"))?;
        ExamRegistrations::delete_many()
            .filter(exam_registrations::Column::ExamId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err("删除考试报名失败"))?;
        let result = Exams::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err("删除考试失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 报名：考试未过期、学生有对应 (科目, 年级) 的有效选课、不重复报名
    pub async fn register_for_exam_impl(
        &self,
        student_id: i64,
        exam_id: i64,
        today: NaiveDate,
    ) -> Result<ExamRegistration> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let exam = find_exam(&txn, exam_id).await?;
        if exam.exam_date < today {
            return Err(PortalError::validation("This exam has already taken place"));
        }
        if !student_eligible(&txn, student_id, exam.subject_id, &[exam.grade_id]).await? {
            return Err(PortalError::authorization(
                "You are not enrolled in the subject and grade of this exam",
            ));
        }

        let existing = ExamRegistrations::find()
            .filter(exam_registrations::Column::ExamId.eq(exam.id))
            .filter(exam_registrations::Column::StudentId.eq(student_id))
            .one(&txn)
            .await
            .map_err(db_err("查询考试报名失败"))?;
        if existing.is_some() {
            return Err(PortalError::conflict("Already registered for this exam"));
        }

        let registration = exam_registrations::ActiveModel {
            exam_id: Set(exam.id),
            student_id: Set(student_id),
            registered_at: Set(now_ts()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("考试报名失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(registration.into_registration())
    }

    pub async fn list_student_registrations_impl(
        &self,
        student_id: i64,
    ) -> Result<Vec<RegistrationDetail>> {
        let rows = ExamRegistrations::find()
            .filter(exam_registrations::Column::StudentId.eq(student_id))
            .find_also_related(Exams)
            .order_by_asc(exam_registrations::Column::RegisteredAt)
            .all(&self.db)
            .await
            .map_err(db_err("查询考试报名失败"))?;

        Ok(rows
            .into_iter()
            .filter_map(|(registration, exam)| {
                let exam = exam?;
                Some(RegistrationDetail {
                    registration: registration.into_registration(),
                    exam_title: exam.title,
                    exam_date: exam.exam_date,
                })
            })
            .collect())
    }

    /// 录入成绩（同一学生重复录入即覆盖）
    pub async fn record_exam_result_impl(
        &self,
        exam_id: i64,
        recorded_by: i64,
        tutor_id: Option<i64>,
        req: RecordResultRequest,
    ) -> Result<ExamResult> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let exam = find_exam(&txn, exam_id).await?;
        if let Some(tutor_id) = tutor_id {
            ensure_tutor_subject(&txn, tutor_id, exam.subject_id).await?;
        }

        if !req.score.is_finite() || req.score < 0.0 || req.score > exam.max_score {
            return Err(PortalError::validation(format!(
                "Score must be between 0 and {}",
                exam.max_score
            )));
        }

        let registered = ExamRegistrations::find()
            .filter(exam_registrations::Column::ExamId.eq(exam.id))
            .filter(exam_registrations::Column::StudentId.eq(req.student_id))
            .one(&txn)
            .await
            .map_err(db_err("查询考试报名失败"))?;
        if registered.is_none() {
            return Err(PortalError::validation(
                "Student is not registered for this exam",
            ));
        }

        let now = now_ts();
        let existing = ExamResults::find()
            .filter(exam_results::Column::ExamId.eq(exam.id))
            .filter(exam_results::Column::StudentId.eq(req.student_id))
            .one(&txn)
            .await
            .map_err(db_err("查询考试成绩失败"))?;

        let result = match existing {
            Some(row) => {
                let mut model: exam_results::ActiveModel = row.into();
                model.score = Set(req.score);
                model.remarks = Set(req.remarks);
                model.recorded_by = Set(recorded_by);
                model.recorded_at = Set(now);
                model.update(&txn).await.map_err(db_err("更新考试成绩失败"))?
            }
            None => exam_results::ActiveModel {
                exam_id: Set(exam.id),
                student_id: Set(req.student_id),
                score: Set(req.score),
                remarks: Set(req.remarks),
                recorded_by: Set(recorded_by),
                recorded_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err("录入考试成绩失败"))?,
        };

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(result.into_result())
    }

    pub async fn list_exam_results_impl(
        &self,
        exam_id: i64,
        tutor_id: Option<i64>,
    ) -> Result<Vec<ExamResultDetail>> {
        let exam = find_exam(&self.db, exam_id).await?;
        if let Some(tutor_id) = tutor_id {
            ensure_tutor_subject(&self.db, tutor_id, exam.subject_id).await?;
        }

        let results = ExamResults::find()
            .filter(exam_results::Column::ExamId.eq(exam.id))
            .order_by_desc(exam_results::Column::Score)
            .order_by_asc(exam_results::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询考试成绩失败"))?;

        let student_ids: Vec<i64> = results.iter().map(|r| r.student_id).collect();
        let names: HashMap<i64, String> = if student_ids.is_empty() {
            HashMap::new()
        } else {
            Students::find()
                .filter(students::Column::Id.is_in(student_ids))
                .all(&self.db)
                .await
                .map_err(db_err("查询学生失败"))?
                .into_iter()
                .map(|s| (s.id, s.full_name))
                .collect()
        };

        Ok(results
            .into_iter()
            .map(|r| ExamResultDetail {
                student_name: names.get(&r.student_id).cloned().unwrap_or_default(),
                result: r.into_result(),
            })
            .collect())
    }

    pub async fn publish_exam_results_impl(&self, exam_id: i64) -> Result<Exam> {
        let exam = find_exam(&self.db, exam_id).await?;

        let mut model: ActiveModel = exam.into();
        model.results_published = Set(true);
        model.updated_at = Set(now_ts());
        let updated = model.update(&self.db).await.map_err(db_err("发布考试成绩失败"))?;

        Ok(updated.into_exam())
    }

    /// 学生只能看到已发布的成绩
    pub async fn list_student_results_impl(&self, student_id: i64) -> Result<Vec<MyExamResult>> {
        let rows = ExamResults::find()
            .filter(exam_results::Column::StudentId.eq(student_id))
            .find_also_related(Exams)
            .filter(Column::ResultsPublished.eq(true))
            .order_by_asc(Column::ExamDate)
            .all(&self.db)
            .await
            .map_err(db_err("查询考试成绩失败"))?;

        Ok(rows
            .into_iter()
            .filter_map(|(result, exam)| {
                let exam = exam?;
                Some(MyExamResult {
                    exam_id: exam.id,
                    exam_title: exam.title,
                    subject_id: exam.subject_id,
                    exam_date: exam.exam_date,
                    score: result.score,
                    max_score: exam.max_score,
                    remarks: result.remarks,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::super::test_support::{Campus, campus, enroll, student, subject, tutor};
    use crate::models::exams::entities::Exam;
    use crate::models::exams::requests::{CreateExamRequest, RecordResultRequest, UpdateExamRequest};
    use crate::storage::Storage;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    async fn schedule(c: &Campus) -> Exam {
        c.storage
            .create_exam(
                c.tutor.user_id,
                CreateExamRequest {
                    subject_id: c.subject.id,
                    grade_id: c.grade_a.id,
                    title: "Midterm".to_string(),
                    exam_date: day(20),
                    start_time: None,
                    max_score: 50.0,
                },
            )
            .await
            .unwrap()
    }

    fn result(student_id: i64, score: f64) -> RecordResultRequest {
        RecordResultRequest {
            student_id,
            score,
            remarks: None,
        }
    }

    #[tokio::test]
    async fn test_registration_rules() {
        let c = campus().await;
        let exam = schedule(&c).await;
        let s = student(&c.storage, "stu", c.grade_a.id).await;

        let err = c.storage.register_for_exam(s.id, exam.id, day(1)).await.unwrap_err();
        assert_eq!(err.code(), "E013");

        enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;
        assert_eq!(c.storage.list_student_exams(s.id).await.unwrap().len(), 1);

        let err = c.storage.register_for_exam(s.id, exam.id, day(21)).await.unwrap_err();
        assert_eq!(err.code(), "E007");

        c.storage.register_for_exam(s.id, exam.id, day(1)).await.unwrap();
        let err = c.storage.register_for_exam(s.id, exam.id, day(1)).await.unwrap_err();
        assert_eq!(err.code(), "E010");

        let regs = c.storage.list_student_registrations(s.id).await.unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].exam_title, "Midterm");
    }

    #[tokio::test]
    async fn test_results_visible_after_publish() {
        let c = campus().await;
        let exam = schedule(&c).await;
        let s = student(&c.storage, "stu", c.grade_a.id).await;
        enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;

        // 未报名不能录入
        let err = c
            .storage
            .record_exam_result(exam.id, c.tutor.user_id, Some(c.tutor.id), result(s.id, 40.0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        c.storage.register_for_exam(s.id, exam.id, day(1)).await.unwrap();

        let err = c
            .storage
            .record_exam_result(exam.id, c.tutor.user_id, Some(c.tutor.id), result(s.id, 51.0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        c.storage
            .record_exam_result(exam.id, c.tutor.user_id, Some(c.tutor.id), result(s.id, 40.0))
            .await
            .unwrap();
        let rewritten = c
            .storage
            .record_exam_result(exam.id, c.tutor.user_id, None, result(s.id, 45.0))
            .await
            .unwrap();
        assert_eq!(rewritten.score, 45.0);

        assert!(c.storage.list_student_results(s.id).await.unwrap().is_empty());
        let published = c.storage.publish_exam_results(exam.id).await.unwrap();
        assert!(published.results_published);

        let mine = c.storage.list_student_results(s.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].score, 45.0);
        assert_eq!(mine[0].max_score, 50.0);

        let all = c.storage.list_exam_results(exam.id, Some(c.tutor.id)).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].student_name, "Student stu");
    }

    #[tokio::test]
    async fn test_tutor_of_other_subject_is_forbidden() {
        let c = campus().await;
        let exam = schedule(&c).await;
        let physics = subject(&c.storage, "PHYS").await;
        let other = tutor(&c.storage, "tutor_phys", physics.id).await;

        let err = c
            .storage
            .list_exam_results(exam.id, Some(other.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");
    }

    #[tokio::test]
    async fn test_update_and_delete_exam() {
        let c = campus().await;
        let exam = schedule(&c).await;

        let err = c
            .storage
            .update_exam(
                exam.id,
                UpdateExamRequest {
                    max_score: Some(0.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        let updated = c
            .storage
            .update_exam(
                exam.id,
                UpdateExamRequest {
                    title: Some("Final".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Final");

        assert!(c.storage.delete_exam(exam.id).await.unwrap());
        assert!(c.storage.get_exam(exam.id).await.unwrap().is_none());
        assert!(!c.storage.delete_exam(exam.id).await.unwrap());
    }
}
