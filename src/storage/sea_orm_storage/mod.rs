//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod enrollments;
mod exams;
mod grades;
mod students;
mod subjects;
mod submissions;
mod tutors;
mod users;

#[cfg(test)]
pub(crate) mod test_support;

use crate::config::AppConfig;
use crate::errors::{PortalError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

/// 为数据库错误附加上下文，保留冲突/超时/连接错误的分类
pub(crate) fn db_err(context: &'static str) -> impl Fn(DbErr) -> PortalError {
    move |e| match PortalError::from(e) {
        PortalError::DatabaseOperation(msg) => {
            PortalError::DatabaseOperation(format!("{context}: {msg}"))
        }
        other => other,
    }
}

pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

impl SeaOrmStorage {
    /// 根据全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect_with_url(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await
    }

    /// 连接指定数据库并执行迁移
    pub async fn connect_with_url(url: &str, pool_size: u32, timeout: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout).await?
        };

        Migrator::up(&db, None)
            .await
            .map_err(|e| PortalError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| PortalError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let mut pool = SqlitePoolOptions::new()
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout));

        if in_memory {
            // 内存库只存在于单个连接中，连接不能被回收
            pool = pool
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("cache_size", "-64000")
                .pragma("temp_store", "memory")
                .pragma("mmap_size", "536870912")
                .pragma("wal_autocheckpoint", "1000");
            pool = pool
                .max_connections(pool_size.max(1))
                .idle_timeout(Duration::from_secs(300));
        }

        let pool = pool
            .connect_with(opt)
            .await
            .map_err(|e| PortalError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(
        url: &str,
        pool_size: u32,
        timeout: u64,
    ) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(pool_size.min(5))
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| PortalError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(PortalError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    PaginatedResponse,
    assignments::{
        entities::Assignment,
        requests::{AssignmentListParams, AssignmentRequest},
        responses::{StudentAssignmentDetail, StudentAssignmentItem, TutorAssignmentDetail},
    },
    enrollments::{
        entities::{Enrollment, EnrollmentDetail},
        requests::{EnrollRequest, EnrollmentListParams},
    },
    exams::{
        entities::{Exam, ExamRegistration, ExamResult},
        requests::{CreateExamRequest, ExamListParams, RecordResultRequest, UpdateExamRequest},
        responses::{ExamResultDetail, MyExamResult, RegistrationDetail},
    },
    grades::{
        entities::Grade,
        requests::{CreateGradeRequest, GradeListParams, UpdateGradeRequest},
    },
    students::{
        entities::Student,
        requests::{CreateStudentRequest, StudentListParams, UpdateStudentRequest},
    },
    subjects::{
        entities::Subject,
        requests::{CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest},
    },
    submissions::{
        requests::{GradeSubmissionRequest, SubmitWork},
        responses::{GradeResponse, SubmitOutcome},
    },
    tutors::{
        entities::Tutor,
        requests::{CreateTutorRequest, TutorListParams, UpdateTutorRequest},
    },
    users::{
        entities::User,
        requests::{NewUser, UpdateUserRequest, UserListParams},
    },
};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn list_users_with_pagination(
        &self,
        query: UserListParams,
    ) -> Result<PaginatedResponse<User>> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 科目模块
    async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject> {
        self.create_subject_impl(req).await
    }

    async fn get_subject(&self, id: i64) -> Result<Option<Subject>> {
        self.get_subject_impl(id).await
    }

    async fn list_subjects(&self, query: SubjectListParams) -> Result<PaginatedResponse<Subject>> {
        self.list_subjects_impl(query).await
    }

    async fn update_subject(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        self.update_subject_impl(id, update).await
    }

    async fn delete_subject(&self, id: i64) -> Result<bool> {
        self.delete_subject_impl(id).await
    }

    // 年级模块
    async fn create_grade(&self, req: CreateGradeRequest) -> Result<Grade> {
        self.create_grade_impl(req).await
    }

    async fn get_grade(&self, id: i64) -> Result<Option<Grade>> {
        self.get_grade_impl(id).await
    }

    async fn list_grades(&self, query: GradeListParams) -> Result<PaginatedResponse<Grade>> {
        self.list_grades_impl(query).await
    }

    async fn update_grade(&self, id: i64, update: UpdateGradeRequest) -> Result<Option<Grade>> {
        self.update_grade_impl(id, update).await
    }

    async fn delete_grade(&self, id: i64) -> Result<bool> {
        self.delete_grade_impl(id).await
    }

    // 学生模块
    async fn create_student(&self, req: CreateStudentRequest) -> Result<Student> {
        self.create_student_impl(req).await
    }

    async fn get_student(&self, id: i64) -> Result<Option<Student>> {
        self.get_student_impl(id).await
    }

    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<Student>> {
        self.get_student_by_user_id_impl(user_id).await
    }

    async fn list_students(&self, query: StudentListParams) -> Result<PaginatedResponse<Student>> {
        self.list_students_impl(query).await
    }

    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        self.update_student_impl(id, update).await
    }

    async fn delete_student(&self, id: i64) -> Result<Option<i64>> {
        self.delete_student_impl(id).await
    }

    // 导师模块
    async fn create_tutor(&self, req: CreateTutorRequest) -> Result<Tutor> {
        self.create_tutor_impl(req).await
    }

    async fn get_tutor(&self, id: i64) -> Result<Option<Tutor>> {
        self.get_tutor_impl(id).await
    }

    async fn get_tutor_by_user_id(&self, user_id: i64) -> Result<Option<Tutor>> {
        self.get_tutor_by_user_id_impl(user_id).await
    }

    async fn list_tutors(&self, query: TutorListParams) -> Result<PaginatedResponse<Tutor>> {
        self.list_tutors_impl(query).await
    }

    async fn update_tutor(&self, id: i64, update: UpdateTutorRequest) -> Result<Option<Tutor>> {
        self.update_tutor_impl(id, update).await
    }

    async fn delete_tutor(&self, id: i64) -> Result<Option<i64>> {
        self.delete_tutor_impl(id).await
    }

    // 选课模块
    async fn list_enrollments(
        &self,
        tutor_id: i64,
        query: EnrollmentListParams,
    ) -> Result<PaginatedResponse<EnrollmentDetail>> {
        self.list_enrollments_impl(tutor_id, query).await
    }

    async fn enroll_student(&self, tutor_id: i64, req: EnrollRequest) -> Result<Enrollment> {
        self.enroll_student_impl(tutor_id, req).await
    }

    async fn unenroll(&self, tutor_id: i64, enrollment_id: i64) -> Result<Enrollment> {
        self.unenroll_impl(tutor_id, enrollment_id).await
    }

    async fn list_student_enrollments(&self, student_id: i64) -> Result<Vec<EnrollmentDetail>> {
        self.list_student_enrollments_impl(student_id).await
    }

    async fn is_student_eligible(
        &self,
        student_id: i64,
        subject_id: i64,
        grade_ids: &[i64],
    ) -> Result<bool> {
        enrollments::student_eligible(&self.db, student_id, subject_id, grade_ids).await
    }

    // 作业模块
    async fn create_assignment(
        &self,
        tutor_id: i64,
        req: AssignmentRequest,
    ) -> Result<Assignment> {
        self.create_assignment_impl(tutor_id, req).await
    }

    async fn update_assignment(
        &self,
        tutor_id: i64,
        assignment_id: i64,
        req: AssignmentRequest,
    ) -> Result<Assignment> {
        self.update_assignment_impl(tutor_id, assignment_id, req)
            .await
    }

    async fn delete_assignment(&self, tutor_id: i64, assignment_id: i64) -> Result<Vec<String>> {
        self.delete_assignment_impl(tutor_id, assignment_id).await
    }

    async fn get_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_impl(assignment_id).await
    }

    async fn list_tutor_assignments(
        &self,
        tutor_id: i64,
        query: AssignmentListParams,
    ) -> Result<PaginatedResponse<Assignment>> {
        self.list_tutor_assignments_impl(tutor_id, query).await
    }

    async fn list_student_assignments(
        &self,
        student_id: i64,
        query: AssignmentListParams,
    ) -> Result<PaginatedResponse<StudentAssignmentItem>> {
        self.list_student_assignments_impl(student_id, query).await
    }

    async fn get_student_assignment_detail(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentAssignmentDetail> {
        self.get_student_assignment_detail_impl(student_id, assignment_id)
            .await
    }

    async fn get_tutor_assignment_detail(
        &self,
        tutor_id: i64,
        assignment_id: i64,
    ) -> Result<TutorAssignmentDetail> {
        self.get_tutor_assignment_detail_impl(tutor_id, assignment_id)
            .await
    }

    async fn is_student_eligible_for_assignment(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<bool> {
        self.is_student_eligible_for_assignment_impl(student_id, assignment_id)
            .await
    }

    // 提交模块
    async fn submit_work(&self, work: SubmitWork) -> Result<SubmitOutcome> {
        self.submit_work_impl(work).await
    }

    async fn grade_submission(
        &self,
        tutor_id: i64,
        submission_id: i64,
        req: GradeSubmissionRequest,
    ) -> Result<GradeResponse> {
        self.grade_submission_impl(tutor_id, submission_id, req)
            .await
    }

    // 考试模块
    async fn create_exam(&self, created_by: i64, req: CreateExamRequest) -> Result<Exam> {
        self.create_exam_impl(created_by, req).await
    }

    async fn get_exam(&self, id: i64) -> Result<Option<Exam>> {
        self.get_exam_impl(id).await
    }

    async fn list_exams(&self, query: ExamListParams) -> Result<PaginatedResponse<Exam>> {
        self.list_exams_impl(query).await
    }

    async fn list_student_exams(&self, student_id: i64) -> Result<Vec<Exam>> {
        self.list_student_exams_impl(student_id).await
    }

    async fn update_exam(&self, id: i64, update: UpdateExamRequest) -> Result<Option<Exam>> {
        self.update_exam_impl(id, update).await
    }

    async fn delete_exam(&self, id: i64) -> Result<bool> {
        self.delete_exam_impl(id).await
    }

    async fn register_for_exam(
        &self,
        student_id: i64,
        exam_id: i64,
        today: NaiveDate,
    ) -> Result<ExamRegistration> {
        self.register_for_exam_impl(student_id, exam_id, today)
            .await
    }

    async fn list_student_registrations(
        &self,
        student_id: i64,
    ) -> Result<Vec<RegistrationDetail>> {
        self.list_student_registrations_impl(student_id).await
    }

    async fn record_exam_result(
        &self,
        exam_id: i64,
        recorded_by: i64,
        tutor_id: Option<i64>,
        req: RecordResultRequest,
    ) -> Result<ExamResult> {
        self.record_exam_result_impl(exam_id, recorded_by, tutor_id, req)
            .await
    }

    async fn list_exam_results(
        &self,
        exam_id: i64,
        tutor_id: Option<i64>,
    ) -> Result<Vec<ExamResultDetail>> {
        self.list_exam_results_impl(exam_id, tutor_id).await
    }

    async fn publish_exam_results(&self, exam_id: i64) -> Result<Exam> {
        self.publish_exam_results_impl(exam_id).await
    }

    async fn list_student_results(&self, student_id: i64) -> Result<Vec<MyExamResult>> {
        self.list_student_results_impl(student_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("portal.db").unwrap(),
            "sqlite://portal.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url(":memory:").unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u:p@localhost/portal").unwrap(),
            "postgres://u:p@localhost/portal"
        );
        let err = SeaOrmStorage::build_database_url("ftp://nope").unwrap_err();
        assert_eq!(err.code(), "E003");
    }

    #[test]
    fn test_db_err_keeps_classification() {
        let mapped = db_err("查询失败")(DbErr::Custom("boom".into()));
        assert_eq!(mapped.code(), "E005");
        assert!(mapped.message().starts_with("查询失败"));

        let timeout = db_err("查询失败")(DbErr::ConnectionAcquire(
            sea_orm::ConnAcquireErr::Timeout,
        ));
        assert_eq!(timeout.code(), "E014");
    }
}
