//! 统一错误处理模块
//!
//! 使用宏生成门户的错误类型，每个变体带有稳定的错误代码、类型名称以及对应的 HTTP 状态。

use std::fmt;

use actix_web::http::StatusCode;
use sea_orm::{ConnAcquireErr, DbErr, SqlErr};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() / error_type() / message() / status()
/// - snake_case 便捷构造函数
macro_rules! define_portal_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $status:expr)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum PortalError {
            $($variant(String),)*
        }

        impl PortalError {
            /// 错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(PortalError::$variant(_) => $code,)*
                }
            }

            /// 错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(PortalError::$variant(_) => $type_name,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(PortalError::$variant(msg) => msg,)*
                }
            }

            /// 对应的 HTTP 状态码
            pub fn status(&self) -> StatusCode {
                match self {
                    $(PortalError::$variant(_) => $status,)*
                }
            }
        }

        paste::paste! {
            impl PortalError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        PortalError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_portal_errors! {
    CacheConnection("E001", "Cache Connection Error", StatusCode::INTERNAL_SERVER_ERROR),
    CachePluginNotFound("E002", "Cache Plugin Not Found", StatusCode::INTERNAL_SERVER_ERROR),
    DatabaseConfig("E003", "Database Configuration Error", StatusCode::INTERNAL_SERVER_ERROR),
    DatabaseConnection("E004", "Database Connection Error", StatusCode::SERVICE_UNAVAILABLE),
    DatabaseOperation("E005", "Database Operation Error", StatusCode::INTERNAL_SERVER_ERROR),
    FileOperation("E006", "File Operation Error", StatusCode::INTERNAL_SERVER_ERROR),
    Validation("E007", "Validation Error", StatusCode::BAD_REQUEST),
    NotFound("E008", "Resource Not Found", StatusCode::NOT_FOUND),
    Serialization("E009", "Serialization Error", StatusCode::INTERNAL_SERVER_ERROR),
    Conflict("E010", "Resource Conflict", StatusCode::CONFLICT),
    DateParse("E011", "Date Parse Error", StatusCode::BAD_REQUEST),
    Authentication("E012", "Authentication Error", StatusCode::UNAUTHORIZED),
    Authorization("E013", "Authorization Error", StatusCode::FORBIDDEN),
    DatabaseTimeout("E014", "Database Timeout", StatusCode::GATEWAY_TIMEOUT),
    SubmissionClosed("E015", "Submission Period Ended", StatusCode::BAD_REQUEST),
}

impl PortalError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否属于调用方可见的业务错误（其余错误需要记录日志并返回通用 500/503/504）
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for PortalError {}

impl From<DbErr> for PortalError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => return PortalError::Conflict(msg),
            // 仍被引用的记录无法删除
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => return PortalError::Conflict(msg),
            _ => {}
        }
        match err {
            DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => {
                PortalError::DatabaseTimeout("Timed out acquiring a database connection".into())
            }
            DbErr::ConnectionAcquire(e) => PortalError::DatabaseConnection(e.to_string()),
            DbErr::Conn(e) => PortalError::DatabaseConnection(e.to_string()),
            other => {
                let msg = other.to_string();
                if is_foreign_key_violation(&msg) {
                    PortalError::Conflict(msg)
                } else {
                    PortalError::DatabaseOperation(msg)
                }
            }
        }
    }
}

/// SQLite 对 `ON DELETE RESTRICT` 报扩展码 1811，`sql_err()` 不识别
fn is_foreign_key_violation(msg: &str) -> bool {
    msg.contains("FOREIGN KEY constraint failed") || msg.contains("code: 1811")
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for PortalError {
    fn from(err: chrono::ParseError) -> Self {
        PortalError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PortalError::cache_connection("test").code(), "E001");
        assert_eq!(PortalError::database_config("test").code(), "E003");
        assert_eq!(PortalError::validation("test").code(), "E007");
        assert_eq!(PortalError::authentication("test").code(), "E012");
        assert_eq!(PortalError::submission_closed("test").code(), "E015");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            PortalError::conflict("dup").error_type(),
            "Resource Conflict"
        );
        assert_eq!(
            PortalError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(PortalError::validation("").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PortalError::submission_closed("").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PortalError::authentication("").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(PortalError::authorization("").status(), StatusCode::FORBIDDEN);
        assert_eq!(PortalError::not_found("").status(), StatusCode::NOT_FOUND);
        assert_eq!(PortalError::conflict("").status(), StatusCode::CONFLICT);
        assert_eq!(
            PortalError::database_connection("").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            PortalError::database_timeout("").status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            PortalError::database_operation("").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(PortalError::not_found("").is_client_error());
        assert!(!PortalError::file_operation("").is_client_error());
    }

    #[test]
    fn test_db_err_mapping() {
        let timeout: PortalError = DbErr::ConnectionAcquire(ConnAcquireErr::Timeout).into();
        assert_eq!(timeout.code(), "E014");

        let closed: PortalError = DbErr::ConnectionAcquire(ConnAcquireErr::ConnectionClosed).into();
        assert_eq!(closed.code(), "E004");

        let other: PortalError = DbErr::Custom("boom".into()).into();
        assert_eq!(other.code(), "E005");
    }

    #[test]
    fn test_restrict_violation_maps_to_conflict() {
        let restrict: PortalError = DbErr::Exec(sea_orm::RuntimeErr::Internal(
            "error returned from database: (code: 1811) FOREIGN KEY constraint failed".into(),
        ))
        .into();
        assert_eq!(restrict.code(), "E010");
        assert_eq!(restrict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_format_simple() {
        let err = PortalError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }
}
