use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::UserStatus;

/// 导师档案，每位导师只教一个科目
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/tutor.ts")]
pub struct Tutor {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: Option<String>,
    pub status: UserStatus,
    pub full_name: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub phone: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
