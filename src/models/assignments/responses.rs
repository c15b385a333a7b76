use serde::Serialize;
use ts_rs::TS;

use super::entities::Assignment;
use crate::models::submissions::entities::{Submission, SubmissionFile, SubmissionStatus};

/// 学生视角的作业列表项，附带本人提交状态
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct StudentAssignmentItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    pub submission_status: SubmissionStatus,
    pub is_late: bool,
    pub score: Option<f64>,
}

/// 学生视角的作业详情
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct StudentAssignmentDetail {
    pub assignment: Assignment,
    pub submission: Option<Submission>,
    pub files: Vec<SubmissionFile>,
    pub group_member_ids: Vec<i64>,
}

/// 导师视角下的一条提交
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct SubmissionOverview {
    pub submission: Submission,
    pub student_name: String,
    pub files: Vec<SubmissionFile>,
    pub group_member_names: Vec<String>,
}

/// 导师视角的作业详情：只包含至少有一个文件的提交
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct TutorAssignmentDetail {
    pub assignment: Assignment,
    pub submissions: Vec<SubmissionOverview>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub enum AssignmentDetail {
    Student(StudentAssignmentDetail),
    Tutor(TutorAssignmentDetail),
}
