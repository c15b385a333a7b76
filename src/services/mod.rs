pub mod assignments;
pub mod auth;
pub mod enrollments;
pub mod exams;
pub mod files;
pub mod grades;
pub mod students;
pub mod subjects;
pub mod submissions;
pub mod tutors;
pub mod users;

pub use assignments::AssignmentService;
pub use auth::AuthService;
pub use enrollments::EnrollmentService;
pub use exams::ExamService;
pub use files::FileService;
pub use grades::GradeService;
pub use students::StudentService;
pub use subjects::SubjectService;
pub use submissions::SubmissionService;
pub use tutors::TutorService;
pub use users::UserService;

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{NaiveDate, NaiveDateTime};

use crate::cache::{CacheResult, ObjectCache};
use crate::errors::PortalError;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, auth::entities::Principal};
use crate::storage::Storage;
use crate::utils::validate;

/// 生成服务结构体：存储默认从 app_data 懒取，测试时可直接注入
macro_rules! define_service {
    ($name:ident) => {
        pub struct $name {
            storage: Option<std::sync::Arc<dyn crate::storage::Storage>>,
        }

        impl $name {
            pub fn new_lazy() -> Self {
                Self { storage: None }
            }

            pub fn with_storage(storage: std::sync::Arc<dyn crate::storage::Storage>) -> Self {
                Self {
                    storage: Some(storage),
                }
            }

            pub(crate) fn get_storage(
                &self,
                request: &actix_web::HttpRequest,
            ) -> actix_web::Result<std::sync::Arc<dyn crate::storage::Storage>> {
                match &self.storage {
                    Some(storage) => Ok(storage.clone()),
                    None => crate::services::storage_from(request),
                }
            }
        }
    };
}
pub(crate) use define_service;

pub(crate) fn storage_from(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            tracing::error!("Storage not found in app data");
            actix_web::error::ErrorInternalServerError("Storage unavailable")
        })
}

pub(crate) fn cache_from(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
}

pub(crate) fn principal_from(request: &HttpRequest) -> Result<Principal, PortalError> {
    RequireJWT::extract_principal(request)
        .ok_or_else(|| PortalError::authentication("Authentication required"))
}

/// 机构本地墙上时间
pub(crate) fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub(crate) fn local_today() -> NaiveDate {
    local_now().date()
}

/// 把错误转成响应信封；服务端错误记日志并隐藏细节
pub(crate) fn error_response(err: &PortalError) -> HttpResponse {
    let code = ErrorCode::from(err);
    let message = if err.is_client_error() {
        err.message().to_string()
    } else {
        tracing::error!("{}", err);
        match err {
            PortalError::DatabaseConnection(_) => "Database is unavailable".to_string(),
            PortalError::DatabaseTimeout(_) => "Database operation timed out".to_string(),
            _ => "Internal server error".to_string(),
        }
    };
    HttpResponse::build(err.status()).json(ApiResponse::<()>::error_empty(code, message))
}

/// 资源不存在时换用具体的业务码，其余同 [`error_response`]
pub(crate) fn not_found_as(err: &PortalError, code: ErrorCode) -> HttpResponse {
    match err {
        PortalError::NotFound(msg) => not_found(code, msg),
        _ => error_response(err),
    }
}

pub(crate) fn not_found(code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(code, message))
}

/// 校验新账号字段并返回密码哈希（学生、导师建档共用）
pub(crate) fn prepare_account(
    username: &str,
    password: &str,
    email: Option<&str>,
    phone: Option<&str>,
    full_name: &str,
) -> Result<String, PortalError> {
    validate::validate_username(username.trim())?;
    validate::validate_password(password)?;
    validate::validate_optional_email(email)?;
    validate::validate_optional_phone(phone)?;
    validate::required_text("Full name", full_name)?;
    crate::utils::password::hash_password(password)
}

#[derive(Clone, Copy)]
enum ProfileKind {
    Student,
    Tutor,
}

impl ProfileKind {
    fn cache_key(self, user_id: i64) -> String {
        match self {
            ProfileKind::Student => format!("student_id:{user_id}"),
            ProfileKind::Tutor => format!("tutor_id:{user_id}"),
        }
    }
}

async fn resolve_profile_id(
    request: &HttpRequest,
    storage: &Arc<dyn Storage>,
    user_id: i64,
    kind: ProfileKind,
) -> Result<i64, PortalError> {
    let cache = cache_from(request);
    let key = kind.cache_key(user_id);

    if let Some(cache) = &cache {
        match cache.get::<i64>(&key).await {
            CacheResult::Found(id) => {
                tracing::debug!("Profile cache hit for {}", key);
                return Ok(id);
            }
            _ => tracing::debug!("Profile cache miss for {}", key),
        }
    }

    let id = match kind {
        ProfileKind::Student => storage
            .get_student_by_user_id(user_id)
            .await?
            .map(|s| s.id)
            .ok_or_else(|| PortalError::authorization("No student profile for this account"))?,
        ProfileKind::Tutor => storage
            .get_tutor_by_user_id(user_id)
            .await?
            .map(|t| t.id)
            .ok_or_else(|| PortalError::authorization("No tutor profile for this account"))?,
    };

    if let Some(cache) = &cache {
        cache.insert(&key, &id).await;
    }
    Ok(id)
}

/// 当前用户对应的学生档案 ID
pub(crate) async fn resolve_student_id(
    request: &HttpRequest,
    storage: &Arc<dyn Storage>,
) -> Result<i64, PortalError> {
    let principal = principal_from(request)?;
    resolve_profile_id(request, storage, principal.user_id, ProfileKind::Student).await
}

/// 当前用户对应的导师档案 ID
pub(crate) async fn resolve_tutor_id(
    request: &HttpRequest,
    storage: &Arc<dyn Storage>,
) -> Result<i64, PortalError> {
    let principal = principal_from(request)?;
    resolve_profile_id(request, storage, principal.user_id, ProfileKind::Tutor).await
}

/// 档案被删除后清理身份缓存
pub(crate) async fn forget_profile(request: &HttpRequest, user_id: i64) {
    if let Some(cache) = cache_from(request) {
        cache.remove(&ProfileKind::Student.cache_key(user_id)).await;
        cache.remove(&ProfileKind::Tutor.cache_key(user_id)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status_mapping() {
        assert_eq!(
            error_response(&PortalError::submission_closed("ended")).status(),
            400
        );
        assert_eq!(error_response(&PortalError::authorization("no")).status(), 403);
        assert_eq!(
            error_response(&PortalError::database_timeout("slow")).status(),
            504
        );
        assert_eq!(
            error_response(&PortalError::database_operation("boom")).status(),
            500
        );
    }

    #[test]
    fn test_not_found_as_only_rewrites_not_found() {
        let resp = not_found_as(&PortalError::not_found("gone"), ErrorCode::ExamNotFound);
        assert_eq!(resp.status(), 404);
        let resp = not_found_as(&PortalError::conflict("dup"), ErrorCode::ExamNotFound);
        assert_eq!(resp.status(), 409);
    }

    #[test]
    fn test_profile_cache_keys() {
        assert_eq!(ProfileKind::Student.cache_key(3), "student_id:3");
        assert_eq!(ProfileKind::Tutor.cache_key(3), "tutor_id:3");
    }
}
