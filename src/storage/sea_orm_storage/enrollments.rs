use std::collections::HashMap;

use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments, Model};
use crate::entity::prelude::{Grades, Students, Subjects, Tutors};
use crate::entity::{grades, students, subjects};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    enrollments::{
        entities::{Enrollment, EnrollmentDetail, EnrollmentStatus},
        requests::{EnrollRequest, EnrollmentListParams},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

/// 学生在该科目下、任一目标年级中是否有有效选课
pub(super) async fn student_eligible<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    subject_id: i64,
    grade_ids: &[i64],
) -> Result<bool> {
    if grade_ids.is_empty() {
        return Ok(false);
    }

    let count = Enrollments::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::SubjectId.eq(subject_id))
        .filter(Column::GradeId.is_in(grade_ids.to_vec()))
        .filter(Column::Status.eq(EnrollmentStatus::Active.to_string()))
        .count(db)
        .await
        .map_err(db_err("查询选课资格失败"))?;

    Ok(count > 0)
}

/// 学生全部有效选课的 (科目, 年级)
pub(super) async fn active_pairs<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
) -> Result<Vec<(i64, i64)>> {
    let rows = Enrollments::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::Status.eq(EnrollmentStatus::Active.to_string()))
        .all(db)
        .await
        .map_err(db_err("查询选课失败"))?;

    let mut pairs: Vec<(i64, i64)> = rows.into_iter().map(|e| (e.subject_id, e.grade_id)).collect();
    pairs.sort_unstable();
    pairs.dedup();
    Ok(pairs)
}

async fn assemble_details<C: ConnectionTrait>(
    db: &C,
    models: Vec<Model>,
) -> Result<Vec<EnrollmentDetail>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let student_ids: Vec<i64> = models.iter().map(|m| m.student_id).collect();
    let grade_ids: Vec<i64> = models.iter().map(|m| m.grade_id).collect();
    let subject_ids: Vec<i64> = models.iter().map(|m| m.subject_id).collect();

    let student_names: HashMap<i64, String> = Students::find()
        .filter(students::Column::Id.is_in(student_ids))
        .all(db)
        .await
        .map_err(db_err("查询学生失败"))?
        .into_iter()
        .map(|s| (s.id, s.full_name))
        .collect();
    let grade_names: HashMap<i64, String> = Grades::find()
        .filter(grades::Column::Id.is_in(grade_ids))
        .all(db)
        .await
        .map_err(db_err("查询年级失败"))?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();
    let subject_names: HashMap<i64, String> = Subjects::find()
        .filter(subjects::Column::Id.is_in(subject_ids))
        .all(db)
        .await
        .map_err(db_err("查询科目失败"))?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    Ok(models
        .into_iter()
        .map(|m| EnrollmentDetail {
            student_name: student_names.get(&m.student_id).cloned().unwrap_or_default(),
            grade_name: grade_names.get(&m.grade_id).cloned().unwrap_or_default(),
            subject_name: subject_names.get(&m.subject_id).cloned().unwrap_or_default(),
            enrollment: m.into_enrollment(),
        })
        .collect())
}

impl SeaOrmStorage {
    /// 导师名下的有效选课
    pub async fn list_enrollments_impl(
        &self,
        tutor_id: i64,
        query: EnrollmentListParams,
    ) -> Result<PaginatedResponse<EnrollmentDetail>> {
        let (page, size) = query.pagination.normalized();

        let mut select = Enrollments::find()
            .filter(Column::TutorId.eq(tutor_id))
            .filter(Column::Status.eq(EnrollmentStatus::Active.to_string()));

        if let Some(grade_id) = query.grade_id {
            select = select.filter(Column::GradeId.eq(grade_id));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Column::StudentId.in_subquery(
                    Query::select()
                        .column(students::Column::Id)
                        .from(students::Entity)
                        .and_where(students::Column::FullName.contains(&escaped))
                        .to_owned(),
                ),
            );
        }

        let paginator = select
            .order_by_desc(Column::EnrolledAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询选课总数失败"))?;
        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询选课列表失败"))?;

        Ok(PaginatedResponse {
            items: assemble_details(&self.db, models).await?,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 选课科目固定为导师的科目；重复的有效选课返回冲突
    pub async fn enroll_student_impl(&self, tutor_id: i64, req: EnrollRequest) -> Result<Enrollment> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let tutor = Tutors::find_by_id(tutor_id)
            .one(&txn)
            .await
            .map_err(db_err("查询导师失败"))?
            .ok_or_else(|| PortalError::not_found("Tutor profile not found"))?;

        if Students::find_by_id(req.student_id)
            .one(&txn)
            .await
            .map_err(db_err("查询学生失败"))?
            .is_none()
        {
            return Err(PortalError::not_found(format!(
                "Student {} not found",
                req.student_id
            )));
        }

        if Grades::find_by_id(req.grade_id)
            .one(&txn)
            .await
            .map_err(db_err("查询年级失败"))?
            .is_none()
        {
            return Err(PortalError::not_found(format!(
                "Grade {} not found",
                req.grade_id
            )));
        }

        let duplicate = Enrollments::find()
            .filter(Column::StudentId.eq(req.student_id))
            .filter(Column::SubjectId.eq(tutor.subject_id))
            .filter(Column::GradeId.eq(req.grade_id))
            .filter(Column::Status.eq(EnrollmentStatus::Active.to_string()))
            .count(&txn)
            .await
            .map_err(db_err("查询选课失败"))?;
        if duplicate > 0 {
            return Err(PortalError::conflict(
                "Student is already enrolled in this subject and grade",
            ));
        }

        let now = now_ts();
        let enrollment = ActiveModel {
            student_id: Set(req.student_id),
            subject_id: Set(tutor.subject_id),
            grade_id: Set(req.grade_id),
            tutor_id: Set(tutor.id),
            status: Set(EnrollmentStatus::Active.to_string()),
            enrolled_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("创建选课失败"))?;

        // 已发布的作业同样需要为新学生准备提交记录
        super::assignments::backfill_submissions(
            &txn,
            req.student_id,
            tutor.subject_id,
            req.grade_id,
        )
        .await?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(enrollment.into_enrollment())
    }

    /// 软退课，只有选课所属导师可以操作
    pub async fn unenroll_impl(&self, tutor_id: i64, enrollment_id: i64) -> Result<Enrollment> {
        let existing = Enrollments::find_by_id(enrollment_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询选课失败"))?
            .ok_or_else(|| PortalError::not_found("Enrollment not found"))?;

        if existing.tutor_id != tutor_id {
            return Err(PortalError::authorization(
                "Only the enrolling tutor can remove this enrollment",
            ));
        }
        if existing.status != EnrollmentStatus::Active.to_string() {
            return Err(PortalError::not_found("Enrollment not found"));
        }

        let mut model: ActiveModel = existing.into();
        model.status = Set(EnrollmentStatus::Inactive.to_string());
        model.updated_at = Set(now_ts());
        let updated = model.update(&self.db).await.map_err(db_err("退课失败"))?;

        Ok(updated.into_enrollment())
    }

    pub async fn list_student_enrollments_impl(
        &self,
        student_id: i64,
    ) -> Result<Vec<EnrollmentDetail>> {
        let models = Enrollments::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(EnrollmentStatus::Active.to_string()))
            .order_by_asc(Column::SubjectId)
            .all(&self.db)
            .await
            .map_err(db_err("查询选课失败"))?;

        assemble_details(&self.db, models).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{campus, enroll, student, subject, tutor};
    use crate::models::PaginationQuery;
    use crate::models::enrollments::entities::EnrollmentStatus;
    use crate::models::enrollments::requests::{EnrollRequest, EnrollmentListParams};
    use crate::storage::Storage;

    fn all() -> EnrollmentListParams {
        EnrollmentListParams {
            pagination: PaginationQuery::default(),
            search: None,
            grade_id: None,
        }
    }

    #[tokio::test]
    async fn test_enroll_uses_tutor_subject() {
        let c = campus().await;
        let s = student(&c.storage, "stu", c.grade_a.id).await;
        let e = enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;

        assert_eq!(e.subject_id, c.subject.id);
        assert_eq!(e.status, EnrollmentStatus::Active);
        assert!(
            c.storage
                .is_student_eligible(s.id, c.subject.id, &[c.grade_a.id, c.grade_b.id])
                .await
                .unwrap()
        );
        assert!(
            !c.storage
                .is_student_eligible(s.id, c.subject.id, &[c.grade_b.id])
                .await
                .unwrap()
        );

        let page = c.storage.list_enrollments(c.tutor.id, all()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].student_name, "Student stu");
        assert_eq!(page.items[0].grade_name, "Grade 10");
    }

    #[tokio::test]
    async fn test_duplicate_active_enrollment_conflicts() {
        let c = campus().await;
        let s = student(&c.storage, "stu", c.grade_a.id).await;
        enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;

        let err = c
            .storage
            .enroll_student(
                c.tutor.id,
                EnrollRequest {
                    student_id: s.id,
                    grade_id: c.grade_a.id,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E010");
    }

    #[tokio::test]
    async fn test_enroll_unknown_student_or_grade_is_not_found() {
        let c = campus().await;
        let err = c
            .storage
            .enroll_student(
                c.tutor.id,
                EnrollRequest {
                    student_id: 999,
                    grade_id: c.grade_a.id,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");

        let s = student(&c.storage, "stu", c.grade_a.id).await;
        let err = c
            .storage
            .enroll_student(
                c.tutor.id,
                EnrollRequest {
                    student_id: s.id,
                    grade_id: 999,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }

    #[tokio::test]
    async fn test_unenroll_is_soft_and_owner_only() {
        let c = campus().await;
        let other_subject = subject(&c.storage, "PHYS").await;
        let other_tutor = tutor(&c.storage, "tutor_phys", other_subject.id).await;
        let s = student(&c.storage, "stu", c.grade_a.id).await;
        let e = enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;

        let err = c.storage.unenroll(other_tutor.id, e.id).await.unwrap_err();
        assert_eq!(err.code(), "E013");

        let removed = c.storage.unenroll(c.tutor.id, e.id).await.unwrap();
        assert_eq!(removed.status, EnrollmentStatus::Inactive);
        assert!(
            !c.storage
                .is_student_eligible(s.id, c.subject.id, &[c.grade_a.id])
                .await
                .unwrap()
        );

        // 已退课再次退课
        let err = c.storage.unenroll(c.tutor.id, e.id).await.unwrap_err();
        assert_eq!(err.code(), "E008");

        // 重新选课生成新记录
        let again = enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;
        assert_ne!(again.id, e.id);
        assert!(c.storage.list_enrollments(c.tutor.id, all()).await.unwrap().items.len() == 1);
        assert_eq!(c.storage.list_student_enrollments(s.id).await.unwrap().len(), 1);
    }
}
