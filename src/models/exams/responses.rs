use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

use super::entities::{ExamRegistration, ExamResult};

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct RegistrationDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub registration: ExamRegistration,
    pub exam_title: String,
    pub exam_date: NaiveDate,
}

/// 导师/管理员查看的成绩行
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamResultDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub result: ExamResult,
    pub student_name: String,
}

/// 学生查看的本人已发布成绩
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct MyExamResult {
    pub exam_id: i64,
    pub exam_title: String,
    pub subject_id: i64,
    pub exam_date: NaiveDate,
    pub score: f64,
    pub max_score: f64,
    pub remarks: Option<String>,
}
