//! 存储层测试夹具：内存 SQLite + 常用档案

use super::SeaOrmStorage;
use crate::models::{
    enrollments::{entities::Enrollment, requests::EnrollRequest},
    grades::{entities::Grade, requests::CreateGradeRequest},
    students::{entities::Student, requests::CreateStudentRequest},
    subjects::{entities::Subject, requests::CreateSubjectRequest},
    tutors::{entities::Tutor, requests::CreateTutorRequest},
};
use crate::storage::Storage;

pub(crate) async fn memory_storage() -> SeaOrmStorage {
    SeaOrmStorage::connect_with_url("sqlite::memory:", 1, 5)
        .await
        .expect("in-memory sqlite")
}

pub(crate) async fn subject(storage: &SeaOrmStorage, code: &str) -> Subject {
    storage
        .create_subject(CreateSubjectRequest {
            name: format!("Subject {code}"),
            code: code.to_string(),
            description: None,
        })
        .await
        .unwrap()
}

pub(crate) async fn grade(storage: &SeaOrmStorage, name: &str, level: i32) -> Grade {
    storage
        .create_grade(CreateGradeRequest {
            name: name.to_string(),
            level,
        })
        .await
        .unwrap()
}

pub(crate) async fn tutor(storage: &SeaOrmStorage, username: &str, subject_id: i64) -> Tutor {
    storage
        .create_tutor(CreateTutorRequest {
            username: username.to_string(),
            password: "hashed".to_string(),
            email: None,
            full_name: format!("Tutor {username}"),
            subject_id,
            phone: None,
        })
        .await
        .unwrap()
}

pub(crate) async fn student(storage: &SeaOrmStorage, username: &str, grade_id: i64) -> Student {
    storage
        .create_student(CreateStudentRequest {
            username: username.to_string(),
            password: "hashed".to_string(),
            email: None,
            full_name: format!("Student {username}"),
            grade_id: Some(grade_id),
            phone: None,
        })
        .await
        .unwrap()
}

pub(crate) async fn enroll(
    storage: &SeaOrmStorage,
    tutor_id: i64,
    student_id: i64,
    grade_id: i64,
) -> Enrollment {
    storage
        .enroll_student(
            tutor_id,
            EnrollRequest {
                student_id,
                grade_id,
            },
        )
        .await
        .unwrap()
}

/// 一个科目、两个年级、一位导师
pub(crate) struct Campus {
    pub storage: SeaOrmStorage,
    pub subject: Subject,
    pub grade_a: Grade,
    pub grade_b: Grade,
    pub tutor: Tutor,
}

pub(crate) async fn campus() -> Campus {
    let storage = memory_storage().await;
    let subject = subject(&storage, "MATH").await;
    let grade_a = grade(&storage, "Grade 10", 10).await;
    let grade_b = grade(&storage, "Grade 11", 11).await;
    let tutor = tutor(&storage, "tutor_math", subject.id).await;
    Campus {
        storage,
        subject,
        grade_a,
        grade_b,
        tutor,
    }
}
