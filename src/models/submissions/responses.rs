use serde::Serialize;
use ts_rs::TS;

use super::entities::{Submission, SubmissionFile, SubmissionStatus};

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmitResponse {
    pub submission_id: i64,
    pub status: SubmissionStatus,
    pub is_late: bool,
    pub files: Vec<SubmissionFile>,
    pub group_member_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct GradeResponse {
    pub submission: Submission,
    /// 本次被更新的学生（含主提交人）
    pub updated_student_ids: Vec<i64>,
}

/// 存储层提交结果，附带被替换掉的旧文件（供清理磁盘）
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub response: SubmitResponse,
    pub replaced_file_urls: Vec<String>,
}
