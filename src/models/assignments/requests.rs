use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use ts_rs::TS;

use crate::errors::PortalError;
use crate::models::common::{PaginationQuery, datetime::deserialize_time};

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    /// 按标题模糊搜索
    pub search: Option<String>,
}

/// 创建与更新作业共用的请求体
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentRequest {
    pub title: String,
    pub description: Option<String>,
    pub grade_ids: Vec<i64>,
    pub due_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_time")]
    #[ts(type = "string")]
    pub closing_time: NaiveTime,
    pub max_score: f64,
    #[serde(default)]
    pub is_group: bool,
}

impl AssignmentRequest {
    /// 完整校验；`today` 为机构本地日期
    pub fn validate(&self, today: NaiveDate) -> Result<(), PortalError> {
        self.validate_fields()?;
        if self.due_date < today {
            return Err(PortalError::validation("Due date must not be in the past"));
        }
        Ok(())
    }

    /// 与日期无关的字段校验
    pub fn validate_fields(&self) -> Result<(), PortalError> {
        if self.title.trim().is_empty() {
            return Err(PortalError::validation("Title must not be empty"));
        }
        if self.grade_ids.is_empty() {
            return Err(PortalError::validation(
                "At least one target grade is required",
            ));
        }
        if !(self.max_score.is_finite() && self.max_score > 0.0) {
            return Err(PortalError::validation("Max score must be greater than 0"));
        }
        Ok(())
    }

    /// 去重后的年级列表，保持原有顺序
    pub fn unique_grade_ids(&self) -> Vec<i64> {
        let mut seen = std::collections::HashSet::new();
        self.grade_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AssignmentRequest {
        serde_json::from_value(serde_json::json!({
            "title": "Essay",
            "grade_ids": [1, 2, 1],
            "due_date": "2025-01-10",
            "closing_time": "18:00",
            "max_score": 100.0
        }))
        .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
    }

    #[test]
    fn test_deserialize_short_closing_time() {
        let req = request();
        assert_eq!(req.closing_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert!(!req.is_group);
        assert_eq!(req.unique_grade_ids(), vec![1, 2]);
    }

    #[test]
    fn test_validate_ok() {
        assert!(request().validate(today()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_grades() {
        let mut req = request();
        req.grade_ids.clear();
        assert_eq!(req.validate(today()).unwrap_err().code(), "E007");
    }

    #[test]
    fn test_validate_rejects_blank_title_and_bad_score() {
        let mut req = request();
        req.title = "   ".into();
        assert!(req.validate(today()).is_err());

        let mut req = request();
        req.max_score = 0.0;
        assert!(req.validate(today()).is_err());
    }

    #[test]
    fn test_validate_rejects_past_due_date() {
        let req = request();
        let later = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        assert!(req.validate(later).is_err());
        // 当天截止仍然允许
        let same_day = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert!(req.validate(same_day).is_ok());
    }
}
