use crate::models::users::entities::UserRole;

/// 令牌解出的调用方身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: UserRole,
}
