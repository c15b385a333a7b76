//! 预导入模块，方便使用

pub use super::assignment_grades::{
    ActiveModel as AssignmentGradeActiveModel, Entity as AssignmentGrades,
    Model as AssignmentGradeModel,
};
pub use super::assignments::{
    ActiveModel as AssignmentActiveModel, Entity as Assignments, Model as AssignmentModel,
};
pub use super::enrollments::{
    ActiveModel as EnrollmentActiveModel, Entity as Enrollments, Model as EnrollmentModel,
};
pub use super::exam_registrations::{
    ActiveModel as ExamRegistrationActiveModel, Entity as ExamRegistrations,
    Model as ExamRegistrationModel,
};
pub use super::exam_results::{
    ActiveModel as ExamResultActiveModel, Entity as ExamResults, Model as ExamResultModel,
};
pub use super::exams::{ActiveModel as ExamActiveModel, Entity as Exams, Model as ExamModel};
pub use super::grades::{ActiveModel as GradeActiveModel, Entity as Grades, Model as GradeModel};
pub use super::group_members::{
    ActiveModel as GroupMemberActiveModel, Entity as GroupMembers, Model as GroupMemberModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::subjects::{
    ActiveModel as SubjectActiveModel, Entity as Subjects, Model as SubjectModel,
};
pub use super::submission_files::{
    ActiveModel as SubmissionFileActiveModel, Entity as SubmissionFiles,
    Model as SubmissionFileModel,
};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
pub use super::tutors::{ActiveModel as TutorActiveModel, Entity as Tutors, Model as TutorModel};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
