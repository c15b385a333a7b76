use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::window::SubmissionWindow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub enum AssignmentStatus {
    Active,
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentStatus::Active => write!(f, "active"),
        }
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AssignmentStatus::Active),
            _ => Err(format!("Invalid assignment status: {s}")),
        }
    }
}

/// 作业，`grade_ids` 为目标年级集合
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct Assignment {
    pub id: i64,
    pub tutor_id: i64,
    pub subject_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub closing_time: NaiveTime,
    pub max_score: f64,
    pub is_group: bool,
    pub status: AssignmentStatus,
    pub grade_ids: Vec<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Assignment {
    pub fn window(&self, grace_period_hours: i64) -> SubmissionWindow {
        SubmissionWindow::new(self.due_date, self.closing_time, grace_period_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(AssignmentStatus::Active.to_string(), "active");
        assert_eq!("active".parse::<AssignmentStatus>(), Ok(AssignmentStatus::Active));
        assert!("closed".parse::<AssignmentStatus>().is_err());
    }
}
