use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::UserStatus;

/// 学生档案（带账号与年级信息）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct Student {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: Option<String>,
    pub status: UserStatus,
    pub full_name: String,
    pub grade_id: Option<i64>,
    pub grade_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
