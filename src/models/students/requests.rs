use crate::models::common::{PaginationQuery, pagination::deserialize_option_i64};
use crate::models::users::entities::UserStatus;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct StudentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "deserialize_option_i64")]
    pub grade_id: Option<i64>,
    pub search: Option<String>,
}

/// 创建学生：账号与档案在同一事务中写入
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct CreateStudentRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: String,
    pub grade_id: Option<i64>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct UpdateStudentRequest {
    pub full_name: Option<String>,
    pub grade_id: Option<i64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: Option<UserStatus>,
}
