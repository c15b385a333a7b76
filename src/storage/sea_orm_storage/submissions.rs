use std::collections::HashSet;

use chrono::NaiveDateTime;

use super::assignments::{grade_ids_of, insert_missing_submissions, owned_assignment};
use super::enrollments::student_eligible;
use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::prelude::{Assignments, GroupMembers, Students, SubmissionFiles, Submissions};
use crate::entity::{group_members, submission_files, submissions};
use crate::errors::{PortalError, Result};
use crate::models::{
    assignments::{SubmissionWindow, WindowVerdict},
    submissions::{
        entities::SubmissionStatus,
        requests::{GradeSubmissionRequest, SubmitWork},
        responses::{GradeResponse, SubmitOutcome, SubmitResponse},
    },
};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// 确保 (作业, 学生) 的提交记录存在并标记为已提交，返回记录 ID 与被替换的文件 URL
async fn mark_submitted<C: ConnectionTrait>(
    db: &C,
    assignment_id: i64,
    student_id: i64,
    now: NaiveDateTime,
    is_late: bool,
) -> Result<(i64, Vec<String>)> {
    insert_missing_submissions(db, [(assignment_id, student_id)]).await?;

    let row = Submissions::find()
        .filter(submissions::Column::AssignmentId.eq(assignment_id))
        .filter(submissions::Column::StudentId.eq(student_id))
        .one(db)
        .await
        .map_err(db_err("查询提交失败"))?
        .ok_or_else(|| PortalError::database_operation("提交记录写入后未找到"))?;

    let replaced: Vec<String> = SubmissionFiles::find()
        .select_only()
        .column(submission_files::Column::FileUrl)
        .filter(submission_files::Column::SubmissionId.eq(row.id))
        .into_tuple()
        .all(db)
        .await
        .map_err(db_err("查询提交文件失败"))?;
    if !replaced.is_empty() {
        SubmissionFiles::delete_many()
            .filter(submission_files::Column::SubmissionId.eq(row.id))
            .exec(db)
            .await
            .map_err(db_err("删除旧提交文件失败"))?;
    }

    let id = row.id;
    let mut model: submissions::ActiveModel = row.into();
    model.status = Set(SubmissionStatus::Submitted.to_string());
    model.submission_date = Set(Some(now));
    model.is_late = Set(is_late);
    model.update(db).await.map_err(db_err("更新提交失败"))?;

    Ok((id, replaced))
}

/// 组员去重、排除本人，并要求每位组员都有该作业的选课资格
async fn validate_group<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    subject_id: i64,
    grade_ids: &[i64],
    requested: &[i64],
) -> Result<Vec<i64>> {
    let mut seen = HashSet::new();
    let members: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| *id != student_id && seen.insert(*id))
        .collect();

    if members.is_empty() {
        return Err(PortalError::validation(
            "Group assignments require at least one other group member",
        ));
    }

    for member in &members {
        let exists = Students::find_by_id(*member)
            .one(db)
            .await
            .map_err(db_err("查询学生失败"))?
            .is_some();
        if !exists {
            return Err(PortalError::validation(format!(
                "Group member {member} does not exist"
            )));
        }
        if !student_eligible(db, *member, subject_id, grade_ids).await? {
            return Err(PortalError::validation(format!(
                "Group member {member} is not enrolled for this assignment"
            )));
        }
    }

    Ok(members)
}

impl SeaOrmStorage {
    /// 提交作业：窗口、资格、组员在同一事务内校验，主提交与组员提交一起写入
    pub async fn submit_work_impl(&self, work: SubmitWork) -> Result<SubmitOutcome> {
        if work.files.is_empty() {
            return Err(PortalError::validation("At least one file is required"));
        }

        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let assignment = Assignments::find_by_id(work.assignment_id)
            .one(&txn)
            .await
            .map_err(db_err("查询作业失败"))?
            .ok_or_else(|| PortalError::not_found("Assignment not found"))?;
        let grade_ids = grade_ids_of(&txn, assignment.id).await?;

        if !student_eligible(&txn, work.student_id, assignment.subject_id, &grade_ids).await? {
            return Err(PortalError::authorization(
                "You are not enrolled for this assignment",
            ));
        }

        let verdict = SubmissionWindow::new(
            assignment.due_date,
            assignment.closing_time,
            work.grace_period_hours,
        )
        .evaluate(work.now);
        if verdict == WindowVerdict::Closed {
            return Err(PortalError::submission_closed(
                "The submission period for this assignment has ended",
            ));
        }
        let is_late = verdict.is_late();

        let members = if assignment.is_group {
            validate_group(
                &txn,
                work.student_id,
                assignment.subject_id,
                &grade_ids,
                &work.group_member_ids,
            )
            .await?
        } else {
            Vec::new()
        };

        let (primary_id, mut replaced_file_urls) =
            mark_submitted(&txn, assignment.id, work.student_id, work.now, is_late).await?;

        // 重新提交时以本次名单为准
        GroupMembers::delete_many()
            .filter(group_members::Column::SubmissionId.eq(primary_id))
            .exec(&txn)
            .await
            .map_err(db_err("清理小组成员失败"))?;

        for member in &members {
            let (_, replaced) =
                mark_submitted(&txn, assignment.id, *member, work.now, is_late).await?;
            replaced_file_urls.extend(replaced);

            GroupMembers::insert(group_members::ActiveModel {
                submission_id: Set(primary_id),
                student_id: Set(*member),
            })
            .on_conflict(
                OnConflict::columns([
                    group_members::Column::SubmissionId,
                    group_members::Column::StudentId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(&txn)
            .await
            .map_err(db_err("写入小组成员失败"))?;
        }

        let uploaded_at = now_ts();
        for file in &work.files {
            submission_files::ActiveModel {
                submission_id: Set(primary_id),
                file_name: Set(file.file_name.clone()),
                file_url: Set(file.file_url.clone()),
                uploaded_at: Set(uploaded_at),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err("写入提交文件失败"))?;
        }

        let files = SubmissionFiles::find()
            .filter(submission_files::Column::SubmissionId.eq(primary_id))
            .order_by_asc(submission_files::Column::Id)
            .all(&txn)
            .await
            .map_err(db_err("查询提交文件失败"))?
            .into_iter()
            .map(|f| f.into_submission_file())
            .collect();

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(SubmitOutcome {
            response: SubmitResponse {
                submission_id: primary_id,
                status: SubmissionStatus::Submitted,
                is_late,
                files,
                group_member_ids: members,
            },
            replaced_file_urls,
        })
    }

    /// 评分：仅作业所属导师，分数须在 [0, max_score]；小组作业可同步给组员
    pub async fn grade_submission_impl(
        &self,
        tutor_id: i64,
        submission_id: i64,
        req: GradeSubmissionRequest,
    ) -> Result<GradeResponse> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let submission = Submissions::find_by_id(submission_id)
            .one(&txn)
            .await
            .map_err(db_err("查询提交失败"))?
            .ok_or_else(|| PortalError::not_found("Submission not found"))?;
        let assignment = owned_assignment(&txn, tutor_id, submission.assignment_id).await?;

        if !req.score.is_finite() || req.score < 0.0 || req.score > assignment.max_score {
            return Err(PortalError::validation(format!(
                "Score must be between 0 and {}",
                assignment.max_score
            )));
        }

        let graded_at = now_ts();
        let apply = |update: sea_orm::UpdateMany<Submissions>| {
            update
                .col_expr(
                    submissions::Column::Status,
                    Expr::value(SubmissionStatus::Graded.to_string()),
                )
                .col_expr(submissions::Column::Score, Expr::value(req.score))
                .col_expr(submissions::Column::Feedback, Expr::value(req.feedback.clone()))
                .col_expr(submissions::Column::GradedAt, Expr::value(graded_at))
        };

        apply(Submissions::update_many())
            .filter(submissions::Column::Id.eq(submission.id))
            .exec(&txn)
            .await
            .map_err(db_err("评分失败"))?;

        let mut updated_student_ids = vec![submission.student_id];

        if assignment.is_group && req.apply_to_all_group_members {
            let members: Vec<i64> = GroupMembers::find()
                .select_only()
                .column(group_members::Column::StudentId)
                .filter(group_members::Column::SubmissionId.eq(submission.id))
                .order_by_asc(group_members::Column::StudentId)
                .into_tuple()
                .all(&txn)
                .await
                .map_err(db_err("查询小组成员失败"))?;

            for member in members {
                let result = apply(Submissions::update_many())
                    .filter(submissions::Column::AssignmentId.eq(assignment.id))
                    .filter(submissions::Column::StudentId.eq(member))
                    .exec(&txn)
                    .await
                    .map_err(db_err("同步组员评分失败"))?;
                if result.rows_affected > 0 {
                    updated_student_ids.push(member);
                }
            }
        }

        let graded = Submissions::find_by_id(submission.id)
            .one(&txn)
            .await
            .map_err(db_err("查询提交失败"))?
            .ok_or_else(|| PortalError::not_found("Submission not found"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(GradeResponse {
            submission: graded.into_submission(),
            updated_student_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::super::assignments::tests::publish;
    use super::super::test_support::{Campus, campus, enroll, student, tutor};
    use crate::models::students::entities::Student;
    use crate::models::submissions::entities::SubmissionStatus;
    use crate::models::submissions::requests::{GradeSubmissionRequest, StoredFile, SubmitWork};
    use crate::storage::Storage;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn file(name: &str) -> StoredFile {
        StoredFile {
            file_name: name.to_string(),
            file_url: format!("/uploads/{name}"),
        }
    }

    fn work(assignment_id: i64, student_id: i64, now: NaiveDateTime) -> SubmitWork {
        SubmitWork {
            assignment_id,
            student_id,
            group_member_ids: Vec::new(),
            files: vec![file("essay.pdf")],
            now,
            grace_period_hours: 24,
        }
    }

    async fn enrolled(c: &Campus, username: &str) -> Student {
        let s = student(&c.storage, username, c.grade_a.id).await;
        enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;
        s
    }

    fn grade(score: f64, apply: bool) -> GradeSubmissionRequest {
        GradeSubmissionRequest {
            score,
            feedback: Some("Good".to_string()),
            apply_to_all_group_members: apply,
        }
    }

    #[tokio::test]
    async fn test_submission_window_boundaries() {
        let c = campus().await;
        let a = publish(&c, false).await;
        let early = enrolled(&c, "early").await;
        let late = enrolled(&c, "late").await;
        let closed = enrolled(&c, "closed").await;

        let on_time = c.storage.submit_work(work(a.id, early.id, at(10, 17, 59))).await.unwrap();
        assert!(!on_time.response.is_late);
        assert_eq!(on_time.response.status, SubmissionStatus::Submitted);

        let late_outcome = c.storage.submit_work(work(a.id, late.id, at(10, 18, 1))).await.unwrap();
        assert!(late_outcome.response.is_late);

        let err = c
            .storage
            .submit_work(work(a.id, closed.id, at(12, 0, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E015");

        let detail = c
            .storage
            .get_student_assignment_detail(closed.id, a.id)
            .await
            .unwrap();
        assert_eq!(
            detail.submission.map(|s| s.status),
            Some(SubmissionStatus::NotSubmitted)
        );
    }

    #[tokio::test]
    async fn test_submit_requires_enrollment_and_assignment() {
        let c = campus().await;
        let a = publish(&c, false).await;
        let outsider = student(&c.storage, "outsider", c.grade_a.id).await;

        let err = c
            .storage
            .submit_work(work(a.id, outsider.id, at(10, 12, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");

        let err = c
            .storage
            .submit_work(work(999, outsider.id, at(10, 12, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }

    #[tokio::test]
    async fn test_resubmission_replaces_files() {
        let c = campus().await;
        let a = publish(&c, false).await;
        let s = enrolled(&c, "stu").await;

        let first = c.storage.submit_work(work(a.id, s.id, at(9, 10, 0))).await.unwrap();
        assert!(first.replaced_file_urls.is_empty());

        let mut second = work(a.id, s.id, at(10, 19, 0));
        second.files = vec![file("essay_v2.pdf"), file("appendix.pdf")];
        let second = c.storage.submit_work(second).await.unwrap();

        assert_eq!(second.response.submission_id, first.response.submission_id);
        assert_eq!(second.replaced_file_urls, vec!["/uploads/essay.pdf".to_string()]);
        assert!(second.response.is_late);

        let detail = c.storage.get_student_assignment_detail(s.id, a.id).await.unwrap();
        let names: Vec<String> = detail.files.into_iter().map(|f| f.file_name).collect();
        assert_eq!(names, vec!["essay_v2.pdf", "appendix.pdf"]);
    }

    #[tokio::test]
    async fn test_group_submission_validates_members() {
        let c = campus().await;
        let a = publish(&c, true).await;
        let s = enrolled(&c, "leader").await;
        let outsider = student(&c.storage, "outsider", c.grade_a.id).await;

        // 只有本人
        let mut only_self = work(a.id, s.id, at(10, 9, 0));
        only_self.group_member_ids = vec![s.id];
        let err = c.storage.submit_work(only_self).await.unwrap_err();
        assert_eq!(err.code(), "E007");

        let mut with_outsider = work(a.id, s.id, at(10, 9, 0));
        with_outsider.group_member_ids = vec![outsider.id];
        let err = c.storage.submit_work(with_outsider).await.unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[tokio::test]
    async fn test_group_grading_with_and_without_propagation() {
        let c = campus().await;
        let a = publish(&c, true).await;
        let leader = enrolled(&c, "leader").await;
        let m1 = enrolled(&c, "member1").await;
        let m2 = enrolled(&c, "member2").await;

        let mut submit = work(a.id, leader.id, at(10, 9, 0));
        submit.group_member_ids = vec![m1.id, m2.id, m1.id];
        let outcome = c.storage.submit_work(submit).await.unwrap();
        assert_eq!(outcome.response.group_member_ids, vec![m1.id, m2.id]);

        // 组员看到主提交的文件与小组
        let member_view = c.storage.get_student_assignment_detail(m1.id, a.id).await.unwrap();
        assert_eq!(
            member_view.submission.as_ref().map(|s| s.status.clone()),
            Some(SubmissionStatus::Submitted)
        );
        assert_eq!(member_view.files.len(), 1);
        assert!(member_view.group_member_ids.contains(&leader.id));

        let primary = outcome.response.submission_id;

        let solo = c
            .storage
            .grade_submission(c.tutor.id, primary, grade(70.0, false))
            .await
            .unwrap();
        assert_eq!(solo.updated_student_ids, vec![leader.id]);
        let m1_view = c.storage.get_student_assignment_detail(m1.id, a.id).await.unwrap();
        assert_eq!(m1_view.submission.and_then(|s| s.score), None);

        let all = c
            .storage
            .grade_submission(c.tutor.id, primary, grade(88.0, true))
            .await
            .unwrap();
        assert_eq!(all.updated_student_ids, vec![leader.id, m1.id, m2.id]);
        assert_eq!(all.submission.status, SubmissionStatus::Graded);
        for member in [m1.id, m2.id] {
            let view = c.storage.get_student_assignment_detail(member, a.id).await.unwrap();
            let sub = view.submission.unwrap();
            assert_eq!(sub.score, Some(88.0));
            assert_eq!(sub.feedback.as_deref(), Some("Good"));
            assert_eq!(sub.status, SubmissionStatus::Graded);
        }

        let tutor_view = c.storage.get_tutor_assignment_detail(c.tutor.id, a.id).await.unwrap();
        assert_eq!(tutor_view.submissions.len(), 1);
        assert_eq!(tutor_view.submissions[0].group_member_names.len(), 2);
    }

    #[tokio::test]
    async fn test_resubmission_replaces_group_members() {
        let c = campus().await;
        let a = publish(&c, true).await;
        let leader = enrolled(&c, "leader").await;
        let m1 = enrolled(&c, "member1").await;
        let m2 = enrolled(&c, "member2").await;

        let mut first = work(a.id, leader.id, at(10, 9, 0));
        first.group_member_ids = vec![m1.id, m2.id];
        c.storage.submit_work(first).await.unwrap();

        let mut second = work(a.id, leader.id, at(10, 10, 0));
        second.group_member_ids = vec![m1.id];
        let outcome = c.storage.submit_work(second).await.unwrap();
        assert_eq!(outcome.response.group_member_ids, vec![m1.id]);

        let tutor_view = c.storage.get_tutor_assignment_detail(c.tutor.id, a.id).await.unwrap();
        assert_eq!(tutor_view.submissions.len(), 1);
        assert_eq!(tutor_view.submissions[0].group_member_names.len(), 1);

        let graded = c
            .storage
            .grade_submission(c.tutor.id, outcome.response.submission_id, grade(90.0, true))
            .await
            .unwrap();
        assert_eq!(graded.updated_student_ids, vec![leader.id, m1.id]);
        let dropped = c.storage.get_student_assignment_detail(m2.id, a.id).await.unwrap();
        assert_eq!(dropped.submission.and_then(|s| s.score), None);
        assert!(!dropped.group_member_ids.contains(&leader.id));
    }

    #[tokio::test]
    async fn test_grade_range_and_ownership() {
        let c = campus().await;
        let a = publish(&c, false).await;
        let s = enrolled(&c, "stu").await;
        let outcome = c.storage.submit_work(work(a.id, s.id, at(10, 9, 0))).await.unwrap();
        let id = outcome.response.submission_id;

        let ok = c.storage.grade_submission(c.tutor.id, id, grade(100.0, false)).await.unwrap();
        assert_eq!(ok.submission.score, Some(100.0));
        assert!(ok.submission.graded_at.is_some());

        for bad in [101.0, -1.0, f64::NAN] {
            let err = c
                .storage
                .grade_submission(c.tutor.id, id, grade(bad, false))
                .await
                .unwrap_err();
            assert_eq!(err.code(), "E007");
        }

        let intruder = tutor(&c.storage, "intruder", c.subject.id).await;
        let err = c
            .storage
            .grade_submission(intruder.id, id, grade(50.0, false))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");

        let err = c
            .storage
            .grade_submission(c.tutor.id, 999, grade(50.0, false))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }

    #[tokio::test]
    async fn test_delete_assignment_returns_file_urls() {
        let c = campus().await;
        let a = publish(&c, false).await;
        let s = enrolled(&c, "stu").await;
        c.storage.submit_work(work(a.id, s.id, at(10, 9, 0))).await.unwrap();

        let urls = c.storage.delete_assignment(c.tutor.id, a.id).await.unwrap();
        assert_eq!(urls, vec!["/uploads/essay.pdf".to_string()]);
    }
}
