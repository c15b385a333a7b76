use chrono::NaiveDateTime;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct GradeSubmissionRequest {
    pub score: f64,
    pub feedback: Option<String>,
    /// 小组作业时是否同步给所有组员
    #[serde(default, alias = "applyToAllGroupMembers")]
    pub apply_to_all_group_members: bool,
}

/// 已落盘的上传文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub file_url: String,
}

/// 存储层的提交输入
#[derive(Debug, Clone)]
pub struct SubmitWork {
    pub assignment_id: i64,
    pub student_id: i64,
    pub group_member_ids: Vec<i64>,
    pub files: Vec<StoredFile>,
    /// 本地墙上时间
    pub now: NaiveDateTime,
    pub grace_period_hours: i64,
}
