use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct Exam {
    pub id: i64,
    pub subject_id: i64,
    pub grade_id: i64,
    pub title: String,
    pub exam_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub max_score: f64,
    pub results_published: bool,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamRegistration {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamResult {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub score: f64,
    pub remarks: Option<String>,
    /// 录入人（用户 ID）
    pub recorded_by: i64,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}
