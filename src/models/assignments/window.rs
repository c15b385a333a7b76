//! 提交时间窗口
//!
//! 截止时刻 = 截止日期 + 关闭时间（本地墙上时间）；之后的宽限期内仍可提交，但标记为迟交；
//! 宽限期结束后拒绝提交。

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// 宽限期默认 24 小时
pub const DEFAULT_GRACE_PERIOD_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowVerdict {
    OnTime,
    Late,
    Closed,
}

impl WindowVerdict {
    pub fn is_late(self) -> bool {
        self == WindowVerdict::Late
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionWindow {
    due_instant: NaiveDateTime,
    grace: Duration,
}

impl SubmissionWindow {
    pub fn new(due_date: NaiveDate, closing_time: NaiveTime, grace_period_hours: i64) -> Self {
        Self {
            due_instant: due_date.and_time(closing_time),
            grace: Duration::hours(grace_period_hours.max(0)),
        }
    }

    pub fn due_instant(&self) -> NaiveDateTime {
        self.due_instant
    }

    pub fn grace_deadline(&self) -> NaiveDateTime {
        self.due_instant + self.grace
    }

    /// 截止时刻本身算按时，宽限期终点本身算迟交
    pub fn evaluate(&self, now: NaiveDateTime) -> WindowVerdict {
        if now > self.grace_deadline() {
            WindowVerdict::Closed
        } else if now > self.due_instant {
            WindowVerdict::Late
        } else {
            WindowVerdict::OnTime
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> SubmissionWindow {
        SubmissionWindow::new(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            DEFAULT_GRACE_PERIOD_HOURS,
        )
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_before_due_is_on_time() {
        assert_eq!(window().evaluate(at(10, 17, 59)), WindowVerdict::OnTime);
    }

    #[test]
    fn test_exactly_at_due_is_on_time() {
        assert_eq!(window().evaluate(at(10, 18, 0)), WindowVerdict::OnTime);
    }

    #[test]
    fn test_after_due_within_grace_is_late() {
        assert_eq!(window().evaluate(at(10, 18, 1)), WindowVerdict::Late);
        assert!(window().evaluate(at(11, 12, 0)).is_late());
    }

    #[test]
    fn test_grace_deadline_boundary() {
        let w = window();
        assert_eq!(w.grace_deadline(), at(11, 18, 0));
        assert_eq!(w.evaluate(at(11, 18, 0)), WindowVerdict::Late);
        assert_eq!(w.evaluate(at(11, 18, 1)), WindowVerdict::Closed);
    }

    #[test]
    fn test_after_grace_is_closed() {
        assert_eq!(window().evaluate(at(12, 0, 0)), WindowVerdict::Closed);
    }

    #[test]
    fn test_custom_grace_period() {
        let w = SubmissionWindow::new(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            2,
        );
        assert_eq!(w.evaluate(at(10, 19, 59)), WindowVerdict::Late);
        assert_eq!(w.evaluate(at(10, 20, 1)), WindowVerdict::Closed);
    }
}
