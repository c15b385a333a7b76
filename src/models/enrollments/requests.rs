use crate::models::common::{PaginationQuery, pagination::deserialize_option_i64};
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrollmentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    /// 按学生姓名模糊搜索
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_i64")]
    pub grade_id: Option<i64>,
}

/// 导师将学生加入自己科目下的某个年级
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrollRequest {
    pub student_id: i64,
    pub grade_id: i64,
}
