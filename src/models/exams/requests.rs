use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use ts_rs::TS;

use crate::errors::PortalError;
use crate::models::common::{
    PaginationQuery, datetime::deserialize_option_time, pagination::deserialize_option_i64,
};

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "deserialize_option_i64")]
    pub subject_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_i64")]
    pub grade_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct CreateExamRequest {
    pub subject_id: i64,
    pub grade_id: i64,
    pub title: String,
    pub exam_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_option_time")]
    #[ts(type = "string | null")]
    pub start_time: Option<NaiveTime>,
    pub max_score: f64,
}

impl CreateExamRequest {
    pub fn validate(&self) -> Result<(), PortalError> {
        if self.title.trim().is_empty() {
            return Err(PortalError::validation("Title must not be empty"));
        }
        if !(self.max_score.is_finite() && self.max_score > 0.0) {
            return Err(PortalError::validation("Max score must be greater than 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct UpdateExamRequest {
    pub title: Option<String>,
    pub exam_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_option_time")]
    #[ts(type = "string | null")]
    pub start_time: Option<NaiveTime>,
    pub max_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct RecordResultRequest {
    pub student_id: i64,
    pub score: f64,
    pub remarks: Option<String>,
}
