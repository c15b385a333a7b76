use std::sync::Arc;

use chrono::NaiveDate;

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

use crate::errors::Result;

pub mod sea_orm_storage;

/// 数据访问接口
///
/// 涉及多行写入的方法（作业创建/更新/删除、提交、评分、带账号的档案创建）在实现内部使用单个事务。
/// 业务约束（归属、取值范围、资格）同样在事务内校验，违反时返回对应的 `PortalError`。
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户
    // 创建用户（密码已哈希）
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn list_users_with_pagination(
        &self,
        query: UserListParams,
    ) -> Result<PaginatedResponse<User>>;
    // 更新用户（`password` 字段为哈希后的值）
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    async fn delete_user(&self, id: i64) -> Result<bool>;
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    async fn count_users(&self) -> Result<u64>;

    /// 科目
    async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject>;
    async fn get_subject(&self, id: i64) -> Result<Option<Subject>>;
    async fn list_subjects(&self, query: SubjectListParams) -> Result<PaginatedResponse<Subject>>;
    async fn update_subject(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>>;
    async fn delete_subject(&self, id: i64) -> Result<bool>;

    /// 年级
    async fn create_grade(&self, req: CreateGradeRequest) -> Result<Grade>;
    async fn get_grade(&self, id: i64) -> Result<Option<Grade>>;
    async fn list_grades(&self, query: GradeListParams) -> Result<PaginatedResponse<Grade>>;
    async fn update_grade(&self, id: i64, update: UpdateGradeRequest) -> Result<Option<Grade>>;
    async fn delete_grade(&self, id: i64) -> Result<bool>;

    /// 学生档案（`password` 字段为哈希后的值）
    async fn create_student(&self, req: CreateStudentRequest) -> Result<Student>;
    async fn get_student(&self, id: i64) -> Result<Option<Student>>;
    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<Student>>;
    async fn list_students(&self, query: StudentListParams) -> Result<PaginatedResponse<Student>>;
    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>>;
    // 删除学生及其账号，返回被删除档案对应的用户 ID
    async fn delete_student(&self, id: i64) -> Result<Option<i64>>;

    /// 导师档案（`password` 字段为哈希后的值）
    async fn create_tutor(&self, req: CreateTutorRequest) -> Result<Tutor>;
    async fn get_tutor(&self, id: i64) -> Result<Option<Tutor>>;
    async fn get_tutor_by_user_id(&self, user_id: i64) -> Result<Option<Tutor>>;
    async fn list_tutors(&self, query: TutorListParams) -> Result<PaginatedResponse<Tutor>>;
    async fn update_tutor(&self, id: i64, update: UpdateTutorRequest) -> Result<Option<Tutor>>;
    async fn delete_tutor(&self, id: i64) -> Result<Option<i64>>;

    /// 选课目录
    async fn list_enrollments(
        &self,
        tutor_id: i64,
        query: EnrollmentListParams,
    ) -> Result<PaginatedResponse<EnrollmentDetail>>;
    async fn enroll_student(&self, tutor_id: i64, req: EnrollRequest) -> Result<Enrollment>;
    // 软退课：状态置为 inactive
    async fn unenroll(&self, tutor_id: i64, enrollment_id: i64) -> Result<Enrollment>;
    async fn list_student_enrollments(&self, student_id: i64) -> Result<Vec<EnrollmentDetail>>;
    // 学生是否在该科目的任一年级下有有效选课
    async fn is_student_eligible(
        &self,
        student_id: i64,
        subject_id: i64,
        grade_ids: &[i64],
    ) -> Result<bool>;

    /// 作业流程
    async fn create_assignment(&self, tutor_id: i64, req: AssignmentRequest)
    -> Result<Assignment>;
    async fn update_assignment(
        &self,
        tutor_id: i64,
        assignment_id: i64,
        req: AssignmentRequest,
    ) -> Result<Assignment>;
    // 删除作业，返回需要从磁盘清理的文件 URL
    async fn delete_assignment(&self, tutor_id: i64, assignment_id: i64) -> Result<Vec<String>>;
    async fn get_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>>;
    async fn list_tutor_assignments(
        &self,
        tutor_id: i64,
        query: AssignmentListParams,
    ) -> Result<PaginatedResponse<Assignment>>;
    async fn list_student_assignments(
        &self,
        student_id: i64,
        query: AssignmentListParams,
    ) -> Result<PaginatedResponse<StudentAssignmentItem>>;
    async fn get_student_assignment_detail(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentAssignmentDetail>;
    async fn get_tutor_assignment_detail(
        &self,
        tutor_id: i64,
        assignment_id: i64,
    ) -> Result<TutorAssignmentDetail>;
    async fn is_student_eligible_for_assignment(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<bool>;
    async fn submit_work(&self, work: SubmitWork) -> Result<SubmitOutcome>;
    async fn grade_submission(
        &self,
        tutor_id: i64,
        submission_id: i64,
        req: GradeSubmissionRequest,
    ) -> Result<GradeResponse>;

    /// 考试
    async fn create_exam(&self, created_by: i64, req: CreateExamRequest) -> Result<Exam>;
    async fn get_exam(&self, id: i64) -> Result<Option<Exam>>;
    async fn list_exams(&self, query: ExamListParams) -> Result<PaginatedResponse<Exam>>;
    // 学生可见的考试：有效选课覆盖的 (科目, 年级)
    async fn list_student_exams(&self, student_id: i64) -> Result<Vec<Exam>>;
    async fn update_exam(&self, id: i64, update: UpdateExamRequest) -> Result<Option<Exam>>;
    async fn delete_exam(&self, id: i64) -> Result<bool>;
    async fn register_for_exam(
        &self,
        student_id: i64,
        exam_id: i64,
        today: NaiveDate,
    ) -> Result<ExamRegistration>;
    async fn list_student_registrations(&self, student_id: i64)
    -> Result<Vec<RegistrationDetail>>;
    // `tutor_id` 为 None 表示管理员操作
    async fn record_exam_result(
        &self,
        exam_id: i64,
        recorded_by: i64,
        tutor_id: Option<i64>,
        req: RecordResultRequest,
    ) -> Result<ExamResult>;
    async fn list_exam_results(
        &self,
        exam_id: i64,
        tutor_id: Option<i64>,
    ) -> Result<Vec<ExamResultDetail>>;
    async fn publish_exam_results(&self, exam_id: i64) -> Result<Exam>;
    async fn list_student_results(&self, student_id: i64) -> Result<Vec<MyExamResult>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
