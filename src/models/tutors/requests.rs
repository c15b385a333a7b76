use crate::models::common::{PaginationQuery, pagination::deserialize_option_i64};
use crate::models::users::entities::UserStatus;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/tutor.ts")]
pub struct TutorListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "deserialize_option_i64")]
    pub subject_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/tutor.ts")]
pub struct CreateTutorRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: String,
    pub subject_id: i64,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/tutor.ts")]
pub struct UpdateTutorRequest {
    pub full_name: Option<String>,
    pub subject_id: Option<i64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: Option<UserStatus>,
}
