use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::ErrorCode;

/// 响应信封：`{code, message, data?, timestamp}`
///
/// `code` 为 0 表示成功；失败时 `message` 携带可读的错误描述。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct ApiResponse<T: TS> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    fn build(code: ErrorCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self::build(ErrorCode::Success, Some(data), message)
    }

    pub fn is_success(&self) -> bool {
        self.code == ErrorCode::Success as i32
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self::build(ErrorCode::Success, None, message)
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(code, None, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(ApiResponse::success(5_i64, "done")).unwrap();
        assert_eq!(ok["code"], 0);
        assert_eq!(ok["data"], 5);
        assert!(ok.get("timestamp").is_some());

        let err = ApiResponse::error_empty(ErrorCode::ExamNotFound, "Exam not found");
        assert!(!err.is_success());
        let err = serde_json::to_value(err).unwrap();
        assert_eq!(err["code"], 7000);
        assert_eq!(err["message"], "Exam not found");
        assert!(err.get("data").is_none());
    }
}
