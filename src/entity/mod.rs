//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod assignment_grades;
pub mod assignments;
pub mod enrollments;
pub mod exam_registrations;
pub mod exam_results;
pub mod exams;
pub mod grades;
pub mod group_members;
pub mod students;
pub mod subjects;
pub mod submission_files;
pub mod submissions;
pub mod tutors;
pub mod users;

use chrono::{DateTime, Utc};

/// Unix 秒 → UTC 时间
pub(crate) fn ts_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}
