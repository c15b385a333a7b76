pub mod assignments;
pub mod auth;
pub mod common;
pub mod enrollments;
pub mod exams;
pub mod grades;
pub mod students;
pub mod subjects;
pub mod submissions;
pub mod tutors;
pub mod users;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

use crate::errors::PortalError;

/// 业务错误码（响应体中的 `code` 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用 1xxx
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    ServiceUnavailable = 1010,
    GatewayTimeout = 1011,

    // 认证 2xxx
    AuthFailed = 2000,

    // 文件 3xxx
    FileNotFound = 3000,

    // 用户与档案 4xxx
    UserNotFound = 4000,
    UserAlreadyExists = 4001,
    CanNotDeleteCurrentUser = 4002,
    StudentNotFound = 4003,
    TutorNotFound = 4004,

    // 作业流程 5xxx
    AssignmentNotFound = 5000,
    SubmissionNotFound = 5001,
    SubmissionClosed = 5002,

    // 选课 6xxx
    EnrollmentNotFound = 6000,
    AlreadyEnrolled = 6001,

    // 考试 7xxx
    ExamNotFound = 7000,
    ExamAlreadyRegistered = 7001,
}

impl From<&PortalError> for ErrorCode {
    fn from(err: &PortalError) -> Self {
        match err {
            PortalError::Validation(_) | PortalError::DateParse(_) => ErrorCode::BadRequest,
            PortalError::SubmissionClosed(_) => ErrorCode::SubmissionClosed,
            PortalError::Authentication(_) => ErrorCode::Unauthorized,
            PortalError::Authorization(_) => ErrorCode::Forbidden,
            PortalError::NotFound(_) => ErrorCode::NotFound,
            PortalError::Conflict(_) => ErrorCode::Conflict,
            PortalError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            PortalError::DatabaseTimeout(_) => ErrorCode::GatewayTimeout,
            _ => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_portal_error() {
        assert_eq!(
            ErrorCode::from(&PortalError::submission_closed("late")),
            ErrorCode::SubmissionClosed
        );
        assert_eq!(
            ErrorCode::from(&PortalError::conflict("dup")),
            ErrorCode::Conflict
        );
        assert_eq!(
            ErrorCode::from(&PortalError::file_operation("disk")),
            ErrorCode::InternalServerError
        );
        assert_eq!(ErrorCode::Success as i32, 0);
    }
}
