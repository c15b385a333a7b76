use std::collections::{HashMap, HashSet};

use super::enrollments::{active_pairs, student_eligible};
use super::{SeaOrmStorage, db_err, now_ts};
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments, Model};
use crate::entity::prelude::{
    AssignmentGrades, Enrollments, Grades, GroupMembers, Students, SubmissionFiles, Submissions,
    Tutors,
};
use crate::entity::{
    assignment_grades, enrollments, grades, group_members, students, submission_files, submissions,
};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginatedResponse, PaginationInfo,
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::{AssignmentListParams, AssignmentRequest},
        responses::{
            StudentAssignmentDetail, StudentAssignmentItem, SubmissionOverview,
            TutorAssignmentDetail,
        },
    },
    enrollments::entities::EnrollmentStatus,
    submissions::entities::{SubmissionFile, SubmissionStatus},
};
use crate::utils::escape_like_pattern;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 作业的目标年级
pub(super) async fn grade_ids_of<C: ConnectionTrait>(db: &C, assignment_id: i64) -> Result<Vec<i64>> {
    let links = AssignmentGrades::find()
        .filter(assignment_grades::Column::AssignmentId.eq(assignment_id))
        .order_by_asc(assignment_grades::Column::GradeId)
        .all(db)
        .await
        .map_err(db_err("查询作业年级失败"))?;

    Ok(links.into_iter().map(|l| l.grade_id).collect())
}

async fn grade_ids_map<C: ConnectionTrait>(
    db: &C,
    assignment_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>> {
    let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
    if assignment_ids.is_empty() {
        return Ok(map);
    }

    let links = AssignmentGrades::find()
        .filter(assignment_grades::Column::AssignmentId.is_in(assignment_ids.to_vec()))
        .order_by_asc(assignment_grades::Column::GradeId)
        .all(db)
        .await
        .map_err(db_err("查询作业年级失败"))?;
    for link in links {
        map.entry(link.assignment_id).or_default().push(link.grade_id);
    }

    Ok(map)
}

async fn ensure_grades_exist<C: ConnectionTrait>(db: &C, grade_ids: &[i64]) -> Result<()> {
    let found = Grades::find()
        .filter(grades::Column::Id.is_in(grade_ids.to_vec()))
        .count(db)
        .await
        .map_err(db_err("查询年级失败"))?;
    if found as usize != grade_ids.len() {
        return Err(PortalError::validation("Unknown grade in grade_ids"));
    }
    Ok(())
}

async fn insert_grade_links<C: ConnectionTrait>(
    db: &C,
    assignment_id: i64,
    grade_ids: &[i64],
) -> Result<()> {
    for grade_id in grade_ids {
        assignment_grades::ActiveModel {
            assignment_id: Set(assignment_id),
            grade_id: Set(*grade_id),
        }
        .insert(db)
        .await
        .map_err(db_err("写入作业年级失败"))?;
    }
    Ok(())
}

/// 为 (作业, 学生) 补齐 not_submitted 记录，已存在的保持不变
pub(super) async fn insert_missing_submissions<C: ConnectionTrait>(
    db: &C,
    rows: impl IntoIterator<Item = (i64, i64)>,
) -> Result<()> {
    for (assignment_id, student_id) in rows {
        let model = submissions::ActiveModel {
            assignment_id: Set(assignment_id),
            student_id: Set(student_id),
            status: Set(SubmissionStatus::NotSubmitted.to_string()),
            submission_date: Set(None),
            score: Set(None),
            feedback: Set(None),
            is_late: Set(false),
            graded_at: Set(None),
            ..Default::default()
        };
        Submissions::insert(model)
            .on_conflict(
                OnConflict::columns([
                    submissions::Column::AssignmentId,
                    submissions::Column::StudentId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await
            .map_err(db_err("创建提交记录失败"))?;
    }
    Ok(())
}

/// 目标年级中所有有效选课学生都应有一条提交记录
async fn fan_out_submissions<C: ConnectionTrait>(
    db: &C,
    assignment_id: i64,
    subject_id: i64,
    grade_ids: &[i64],
) -> Result<()> {
    let student_ids: Vec<i64> = Enrollments::find()
        .select_only()
        .column(enrollments::Column::StudentId)
        .distinct()
        .filter(enrollments::Column::SubjectId.eq(subject_id))
        .filter(enrollments::Column::GradeId.is_in(grade_ids.to_vec()))
        .filter(enrollments::Column::Status.eq(EnrollmentStatus::Active.to_string()))
        .into_tuple()
        .all(db)
        .await
        .map_err(db_err("查询选课学生失败"))?;

    insert_missing_submissions(db, student_ids.into_iter().map(|s| (assignment_id, s))).await
}

/// 新选课的学生补齐该 (科目, 年级) 下有效作业的提交记录
pub(super) async fn backfill_submissions<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    subject_id: i64,
    grade_id: i64,
) -> Result<()> {
    let assignment_ids: Vec<i64> = AssignmentGrades::find()
        .select_only()
        .column(assignment_grades::Column::AssignmentId)
        .filter(assignment_grades::Column::GradeId.eq(grade_id))
        .into_tuple()
        .all(db)
        .await
        .map_err(db_err("查询作业年级失败"))?;
    if assignment_ids.is_empty() {
        return Ok(());
    }

    let active: Vec<i64> = Assignments::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::Id.is_in(assignment_ids))
        .filter(Column::SubjectId.eq(subject_id))
        .filter(Column::Status.eq(AssignmentStatus::Active.to_string()))
        .into_tuple()
        .all(db)
        .await
        .map_err(db_err("查询作业失败"))?;

    insert_missing_submissions(db, active.into_iter().map(|a| (a, student_id))).await
}

/// 作业存在且属于该导师（不存在 404，非本人 403）
pub(super) async fn owned_assignment<C: ConnectionTrait>(
    db: &C,
    tutor_id: i64,
    assignment_id: i64,
) -> Result<Model> {
    let assignment = Assignments::find_by_id(assignment_id)
        .one(db)
        .await
        .map_err(db_err("查询作业失败"))?
        .ok_or_else(|| PortalError::not_found("Assignment not found"))?;

    if assignment.tutor_id != tutor_id {
        return Err(PortalError::authorization(
            "Only the tutor who owns this assignment can modify it",
        ));
    }
    Ok(assignment)
}

async fn files_by_submission<C: ConnectionTrait>(
    db: &C,
    submission_ids: &[i64],
) -> Result<HashMap<i64, Vec<SubmissionFile>>> {
    let mut map: HashMap<i64, Vec<SubmissionFile>> = HashMap::new();
    if submission_ids.is_empty() {
        return Ok(map);
    }

    let files = SubmissionFiles::find()
        .filter(submission_files::Column::SubmissionId.is_in(submission_ids.to_vec()))
        .order_by_asc(submission_files::Column::Id)
        .all(db)
        .await
        .map_err(db_err("查询提交文件失败"))?;
    for file in files {
        map.entry(file.submission_id)
            .or_default()
            .push(file.into_submission_file());
    }

    Ok(map)
}

impl SeaOrmStorage {
    pub async fn create_assignment_impl(
        &self,
        tutor_id: i64,
        req: AssignmentRequest,
    ) -> Result<Assignment> {
        req.validate_fields()?;
        let grade_ids = req.unique_grade_ids();

        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let tutor = Tutors::find_by_id(tutor_id)
            .one(&txn)
            .await
            .map_err(db_err("查询导师失败"))?
            .ok_or_else(|| PortalError::not_found("Tutor profile not found"))?;
        ensure_grades_exist(&txn, &grade_ids).await?;

        let now = now_ts();
        let assignment = ActiveModel {
            tutor_id: Set(tutor.id),
            subject_id: Set(tutor.subject_id),
            title: Set(req.title.trim().to_string()),
            description: Set(req.description),
            due_date: Set(req.due_date),
            closing_time: Set(req.closing_time),
            max_score: Set(req.max_score),
            is_group: Set(req.is_group),
            status: Set(AssignmentStatus::Active.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("创建作业失败"))?;

        insert_grade_links(&txn, assignment.id, &grade_ids).await?;
        fan_out_submissions(&txn, assignment.id, assignment.subject_id, &grade_ids).await?;

        let grade_ids = grade_ids_of(&txn, assignment.id).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(assignment.into_assignment(grade_ids))
    }

    /// 年级集合整体替换，随后为新增年级的学生补齐提交记录
    pub async fn update_assignment_impl(
        &self,
        tutor_id: i64,
        assignment_id: i64,
        req: AssignmentRequest,
    ) -> Result<Assignment> {
        req.validate_fields()?;
        let grade_ids = req.unique_grade_ids();

        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let existing = owned_assignment(&txn, tutor_id, assignment_id).await?;
        ensure_grades_exist(&txn, &grade_ids).await?;

        let mut model: ActiveModel = existing.into();
        model.title = Set(req.title.trim().to_string());
        model.description = Set(req.description);
        model.due_date = Set(req.due_date);
        model.closing_time = Set(req.closing_time);
        model.max_score = Set(req.max_score);
        model.is_group = Set(req.is_group);
        model.updated_at = Set(now_ts());
        let assignment = model.update(&txn).await.map_err(db_err("更新作业失败"))?;

        AssignmentGrades::delete_many()
            .filter(assignment_grades::Column::AssignmentId.eq(assignment.id))
            .exec(&txn)
            .await
            .map_err(db_err("清理作业年级失败"))?;
        insert_grade_links(&txn, assignment.id, &grade_ids).await?;
        fan_out_submissions(&txn, assignment.id, assignment.subject_id, &grade_ids).await?;

        let grade_ids = grade_ids_of(&txn, assignment.id).await?;
        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(assignment.into_assignment(grade_ids))
    }

    /// 删除作业及其提交、文件记录、小组关系，返回需清理的文件 URL
    pub async fn delete_assignment_impl(
        &self,
        tutor_id: i64,
        assignment_id: i64,
    ) -> Result<Vec<String>> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let assignment = owned_assignment(&txn, tutor_id, assignment_id).await?;

        let submission_ids: Vec<i64> = Submissions::find()
            .select_only()
            .column(submissions::Column::Id)
            .filter(submissions::Column::AssignmentId.eq(assignment.id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(db_err("查询提交失败"))?;

        let mut file_urls = Vec::new();
        if !submission_ids.is_empty() {
            file_urls = SubmissionFiles::find()
                .select_only()
                .column(submission_files::Column::FileUrl)
                .filter(submission_files::Column::SubmissionId.is_in(submission_ids.clone()))
                .into_tuple()
                .all(&txn)
                .await
                .map_err(db_err("查询提交文件失败"))?;

            SubmissionFiles::delete_many()
                .filter(submission_files::Column::SubmissionId.is_in(submission_ids.clone()))
                .exec(&txn)
                .await
                .map_err(db_err("删除提交文件失败"))?;
            GroupMembers::delete_many()
                .filter(group_members::Column::SubmissionId.is_in(submission_ids))
                .exec(&txn)
                .await
                .map_err(db_err("删除小组成员失败"))?;
            Submissions::delete_many()
                .filter(submissions::Column::AssignmentId.eq(assignment.id))
                .exec(&txn)
                .await
                .map_err(db_err("删除提交失败"))?;
        }

        AssignmentGrades::delete_many()
            .filter(assignment_grades::Column::AssignmentId.eq(assignment.id))
            .exec(&txn)
            .await
            .map_err(db_err("删除作业年级失败"))?;
        Assignments::delete_by_id(assignment.id)
            .exec(&txn)
            .await
            .map_err(db_err("删除作业失败"))?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(file_urls)
    }

    pub async fn get_assignment_impl(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let Some(model) = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询作业失败"))?
        else {
            return Ok(None);
        };

        let grade_ids = grade_ids_of(&self.db, model.id).await?;
        Ok(Some(model.into_assignment(grade_ids)))
    }

    pub async fn list_tutor_assignments_impl(
        &self,
        tutor_id: i64,
        query: AssignmentListParams,
    ) -> Result<PaginatedResponse<Assignment>> {
        let (page, size) = query.pagination.normalized();

        let mut select = Assignments::find().filter(Column::TutorId.eq(tutor_id));
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            select = select.filter(Column::Title.contains(escape_like_pattern(search.trim())));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询作业总数失败"))?;
        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询作业列表失败"))?;

        let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let mut grades = grade_ids_map(&self.db, &ids).await?;

        Ok(PaginatedResponse {
            items: models
                .into_iter()
                .map(|m| {
                    let grade_ids = grades.remove(&m.id).unwrap_or_default();
                    m.into_assignment(grade_ids)
                })
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 学生可见的作业：有效选课的 (科目, 年级) 与作业目标年级有交集
    pub async fn list_student_assignments_impl(
        &self,
        student_id: i64,
        query: AssignmentListParams,
    ) -> Result<PaginatedResponse<StudentAssignmentItem>> {
        let (page, size) = query.pagination.normalized();

        let pairs = active_pairs(&self.db, student_id).await?;
        let empty = PaginatedResponse {
            items: Vec::new(),
            pagination: PaginationInfo::new(page, size, 0),
        };
        if pairs.is_empty() {
            return Ok(empty);
        }

        let grade_ids: Vec<i64> = pairs
            .iter()
            .map(|(_, g)| *g)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let links = AssignmentGrades::find()
            .filter(assignment_grades::Column::GradeId.is_in(grade_ids))
            .all(&self.db)
            .await
            .map_err(db_err("查询作业年级失败"))?;
        if links.is_empty() {
            return Ok(empty);
        }

        let candidates: Vec<i64> = links
            .iter()
            .map(|l| l.assignment_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let subject_of: HashMap<i64, i64> = Assignments::find()
            .select_only()
            .column(Column::Id)
            .column(Column::SubjectId)
            .filter(Column::Id.is_in(candidates))
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(db_err("查询作业失败"))?
            .into_iter()
            .collect();

        let pair_set: HashSet<(i64, i64)> = pairs.into_iter().collect();
        let visible: HashSet<i64> = links
            .iter()
            .filter(|l| {
                subject_of
                    .get(&l.assignment_id)
                    .is_some_and(|subject| pair_set.contains(&(*subject, l.grade_id)))
            })
            .map(|l| l.assignment_id)
            .collect();
        if visible.is_empty() {
            return Ok(empty);
        }

        let mut select = Assignments::find()
            .filter(Column::Id.is_in(visible))
            .filter(Column::Status.eq(AssignmentStatus::Active.to_string()));
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            select = select.filter(Column::Title.contains(escape_like_pattern(search.trim())));
        }

        let paginator = select
            .order_by_asc(Column::DueDate)
            .order_by_asc(Column::ClosingTime)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_err("查询作业总数失败"))?;
        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("查询作业列表失败"))?;

        let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let mut grades = grade_ids_map(&self.db, &ids).await?;
        let own: HashMap<i64, submissions::Model> = if ids.is_empty() {
            HashMap::new()
        } else {
            Submissions::find()
                .filter(submissions::Column::StudentId.eq(student_id))
                .filter(submissions::Column::AssignmentId.is_in(ids))
                .all(&self.db)
                .await
                .map_err(db_err("查询提交失败"))?
                .into_iter()
                .map(|s| (s.assignment_id, s))
                .collect()
        };

        let items = models
            .into_iter()
            .map(|m| {
                let submission = own.get(&m.id);
                let grade_ids = grades.remove(&m.id).unwrap_or_default();
                StudentAssignmentItem {
                    submission_status: submission
                        .and_then(|s| s.status.parse().ok())
                        .unwrap_or(SubmissionStatus::NotSubmitted),
                    is_late: submission.is_some_and(|s| s.is_late),
                    score: submission.and_then(|s| s.score),
                    assignment: m.into_assignment(grade_ids),
                }
            })
            .collect();

        Ok(PaginatedResponse {
            items,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn get_student_assignment_detail_impl(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentAssignmentDetail> {
        let model = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询作业失败"))?
            .ok_or_else(|| PortalError::not_found("Assignment not found"))?;
        let grade_ids = grade_ids_of(&self.db, model.id).await?;

        if !student_eligible(&self.db, student_id, model.subject_id, &grade_ids).await? {
            return Err(PortalError::authorization(
                "You are not enrolled for this assignment",
            ));
        }

        let own = Submissions::find()
            .filter(submissions::Column::AssignmentId.eq(model.id))
            .filter(submissions::Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(db_err("查询提交失败"))?;

        let mut files = Vec::new();
        let mut group_member_ids = Vec::new();

        if let Some(ref submission) = own {
            files = files_by_submission(&self.db, &[submission.id])
                .await?
                .remove(&submission.id)
                .unwrap_or_default();
            group_member_ids = GroupMembers::find()
                .select_only()
                .column(group_members::Column::StudentId)
                .filter(group_members::Column::SubmissionId.eq(submission.id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(db_err("查询小组成员失败"))?;
        }

        // 作为组员被他人提交时，展示主提交的文件与小组
        if group_member_ids.is_empty() && files.is_empty() {
            let linked: Vec<i64> = GroupMembers::find()
                .select_only()
                .column(group_members::Column::SubmissionId)
                .filter(group_members::Column::StudentId.eq(student_id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(db_err("查询小组成员失败"))?;

            if !linked.is_empty()
                && let Some(primary) = Submissions::find()
                    .filter(submissions::Column::Id.is_in(linked))
                    .filter(submissions::Column::AssignmentId.eq(model.id))
                    .one(&self.db)
                    .await
                    .map_err(db_err("查询提交失败"))?
            {
                files = files_by_submission(&self.db, &[primary.id])
                    .await?
                    .remove(&primary.id)
                    .unwrap_or_default();
                let members: Vec<i64> = GroupMembers::find()
                    .select_only()
                    .column(group_members::Column::StudentId)
                    .filter(group_members::Column::SubmissionId.eq(primary.id))
                    .into_tuple()
                    .all(&self.db)
                    .await
                    .map_err(db_err("查询小组成员失败"))?;
                group_member_ids = std::iter::once(primary.student_id)
                    .chain(members)
                    .filter(|id| *id != student_id)
                    .collect();
            }
        }

        Ok(StudentAssignmentDetail {
            assignment: model.into_assignment(grade_ids),
            submission: own.map(|s| s.into_submission()),
            files,
            group_member_ids,
        })
    }

    /// 导师视角：只列出带文件的提交
    pub async fn get_tutor_assignment_detail_impl(
        &self,
        tutor_id: i64,
        assignment_id: i64,
    ) -> Result<TutorAssignmentDetail> {
        let model = owned_assignment(&self.db, tutor_id, assignment_id).await?;
        let grade_ids = grade_ids_of(&self.db, model.id).await?;

        let rows = Submissions::find()
            .filter(submissions::Column::AssignmentId.eq(model.id))
            .order_by_asc(submissions::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err("查询提交失败"))?;
        let ids: Vec<i64> = rows.iter().map(|s| s.id).collect();
        let mut files = files_by_submission(&self.db, &ids).await?;

        let with_files: Vec<submissions::Model> =
            rows.into_iter().filter(|s| files.contains_key(&s.id)).collect();
        let kept_ids: Vec<i64> = with_files.iter().map(|s| s.id).collect();

        let mut members: HashMap<i64, Vec<i64>> = HashMap::new();
        if !kept_ids.is_empty() {
            let links = GroupMembers::find()
                .filter(group_members::Column::SubmissionId.is_in(kept_ids))
                .all(&self.db)
                .await
                .map_err(db_err("查询小组成员失败"))?;
            for link in links {
                members.entry(link.submission_id).or_default().push(link.student_id);
            }
        }

        let student_ids: HashSet<i64> = with_files
            .iter()
            .map(|s| s.student_id)
            .chain(members.values().flatten().copied())
            .collect();
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

        let submissions = with_files
            .into_iter()
            .map(|s| {
                let group_member_names = members
                    .remove(&s.id)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|id| names.get(&id).cloned())
                    .collect();
                SubmissionOverview {
                    student_name: names.get(&s.student_id).cloned().unwrap_or_default(),
                    files: files.remove(&s.id).unwrap_or_default(),
                    group_member_names,
                    submission: s.into_submission(),
                }
            })
            .collect();

        Ok(TutorAssignmentDetail {
            assignment: model.into_assignment(grade_ids),
            submissions,
        })
    }

    pub async fn is_student_eligible_for_assignment_impl(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<bool> {
        let Some(model) = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询作业失败"))?
        else {
            return Ok(false);
        };
        let grade_ids = grade_ids_of(&self.db, model.id).await?;

        student_eligible(&self.db, student_id, model.subject_id, &grade_ids).await
    }
}

#[cfg(test)]
pub(super) mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    use super::super::test_support::{Campus, campus, enroll, student, subject, tutor};
    use crate::entity::prelude::Submissions;
    use crate::entity::submissions;
    use crate::models::PaginationQuery;
    use crate::models::assignments::entities::Assignment;
    use crate::models::assignments::requests::{AssignmentListParams, AssignmentRequest};
    use crate::models::submissions::entities::SubmissionStatus;
    use crate::storage::Storage;

    pub(crate) fn request(grade_ids: Vec<i64>, is_group: bool) -> AssignmentRequest {
        AssignmentRequest {
            title: "Essay".to_string(),
            description: Some("Write an essay".to_string()),
            grade_ids,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            closing_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            max_score: 100.0,
            is_group,
        }
    }

    pub(crate) async fn publish(c: &Campus, is_group: bool) -> Assignment {
        c.storage
            .create_assignment(c.tutor.id, request(vec![c.grade_a.id], is_group))
            .await
            .unwrap()
    }

    fn params() -> AssignmentListParams {
        AssignmentListParams {
            pagination: PaginationQuery::default(),
            search: None,
        }
    }

    #[tokio::test]
    async fn test_create_fans_out_to_active_enrollments_only() {
        let c = campus().await;
        let enrolled = student(&c.storage, "enrolled", c.grade_a.id).await;
        let dropped = student(&c.storage, "dropped", c.grade_a.id).await;
        let other_grade = student(&c.storage, "other", c.grade_b.id).await;
        enroll(&c.storage, c.tutor.id, enrolled.id, c.grade_a.id).await;
        let e = enroll(&c.storage, c.tutor.id, dropped.id, c.grade_a.id).await;
        enroll(&c.storage, c.tutor.id, other_grade.id, c.grade_b.id).await;
        c.storage.unenroll(c.tutor.id, e.id).await.unwrap();

        let assignment = publish(&c, false).await;
        assert_eq!(assignment.subject_id, c.subject.id);
        assert_eq!(assignment.grade_ids, vec![c.grade_a.id]);

        let detail = c
            .storage
            .get_student_assignment_detail(enrolled.id, assignment.id)
            .await
            .unwrap();
        let submission = detail.submission.expect("fan-out row");
        assert_eq!(submission.status, SubmissionStatus::NotSubmitted);

        let err = c
            .storage
            .get_student_assignment_detail(dropped.id, assignment.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");
        assert!(
            !c.storage
                .is_student_eligible_for_assignment(other_grade.id, assignment.id)
                .await
                .unwrap()
        );

        // 未选课的学生不产生提交行
        for outsider in [dropped.id, other_grade.id] {
            let row = Submissions::find()
                .filter(submissions::Column::AssignmentId.eq(assignment.id))
                .filter(submissions::Column::StudentId.eq(outsider))
                .one(&c.storage.db)
                .await
                .unwrap();
            assert!(row.is_none());
        }
        let rows = Submissions::find()
            .filter(submissions::Column::AssignmentId.eq(assignment.id))
            .count(&c.storage.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_grade_and_bad_score() {
        let c = campus().await;
        let err = c
            .storage
            .create_assignment(c.tutor.id, request(vec![c.grade_a.id, 999], false))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        let mut bad = request(vec![c.grade_a.id], false);
        bad.max_score = 0.0;
        let err = c.storage.create_assignment(c.tutor.id, bad).await.unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[tokio::test]
    async fn test_update_replaces_grade_set_and_extends_fan_out() {
        let c = campus().await;
        let b_student = student(&c.storage, "bee", c.grade_b.id).await;
        enroll(&c.storage, c.tutor.id, b_student.id, c.grade_b.id).await;
        let assignment = publish(&c, false).await;

        let mut req = request(vec![c.grade_b.id, c.grade_b.id], false);
        req.title = "Essay v2".to_string();
        let updated = c
            .storage
            .update_assignment(c.tutor.id, assignment.id, req)
            .await
            .unwrap();
        assert_eq!(updated.grade_ids, vec![c.grade_b.id]);
        assert_eq!(updated.title, "Essay v2");

        let detail = c
            .storage
            .get_student_assignment_detail(b_student.id, assignment.id)
            .await
            .unwrap();
        assert!(detail.submission.is_some());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_update_or_delete() {
        let c = campus().await;
        let other_tutor = tutor(&c.storage, "other_math", c.subject.id).await;
        let assignment = publish(&c, false).await;

        let err = c
            .storage
            .update_assignment(other_tutor.id, assignment.id, request(vec![c.grade_a.id], false))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");

        let err = c
            .storage
            .delete_assignment(other_tutor.id, assignment.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");

        let err = c.storage.delete_assignment(c.tutor.id, 999).await.unwrap_err();
        assert_eq!(err.code(), "E008");
    }

    #[tokio::test]
    async fn test_delete_removes_assignment() {
        let c = campus().await;
        let s = student(&c.storage, "stu", c.grade_a.id).await;
        enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;
        let assignment = publish(&c, false).await;

        let urls = c
            .storage
            .delete_assignment(c.tutor.id, assignment.id)
            .await
            .unwrap();
        assert!(urls.is_empty());
        assert!(c.storage.get_assignment(assignment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_student_listing_follows_enrollment() {
        let c = campus().await;
        let physics = subject(&c.storage, "PHYS").await;
        let physics_tutor = tutor(&c.storage, "tutor_phys", physics.id).await;
        let s = student(&c.storage, "stu", c.grade_a.id).await;
        enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;

        publish(&c, false).await;
        // 同年级但学生未选的科目
        c.storage
            .create_assignment(physics_tutor.id, request(vec![c.grade_a.id], false))
            .await
            .unwrap();

        let page = c.storage.list_student_assignments(s.id, params()).await.unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].assignment.subject_id, c.subject.id);
        assert_eq!(page.items[0].submission_status, SubmissionStatus::NotSubmitted);

        let tutor_page = c.storage.list_tutor_assignments(c.tutor.id, params()).await.unwrap();
        assert_eq!(tutor_page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_late_enrollment_backfills_submission() {
        let c = campus().await;
        let assignment = publish(&c, false).await;
        let s = student(&c.storage, "late", c.grade_a.id).await;
        enroll(&c.storage, c.tutor.id, s.id, c.grade_a.id).await;

        let detail = c
            .storage
            .get_student_assignment_detail(s.id, assignment.id)
            .await
            .unwrap();
        assert_eq!(
            detail.submission.map(|s| s.status),
            Some(SubmissionStatus::NotSubmitted)
        );
    }
}
