pub mod assignments;
pub mod auth;
pub mod enrollments;
pub mod exams;
pub mod files;
pub mod grades;
pub mod students;
pub mod subjects;
pub mod submissions;
pub mod tutors;
pub mod users;

pub use assignments::configure_assignment_routes;
pub use auth::configure_auth_routes;
pub use enrollments::configure_enrollment_routes;
pub use exams::configure_exam_routes;
pub use files::configure_file_routes;
pub use grades::configure_grade_routes;
pub use students::configure_student_routes;
pub use subjects::configure_subject_routes;
pub use submissions::configure_submission_routes;
pub use tutors::configure_tutor_routes;
pub use users::configure_user_routes;

use actix_web::web;

/// 挂载全部 API 路由与上传目录
pub fn configure_all(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_subject_routes)
        .configure(configure_grade_routes)
        .configure(configure_student_routes)
        .configure(configure_tutor_routes)
        .configure(configure_enrollment_routes)
        .configure(configure_assignment_routes)
        .configure(configure_submission_routes)
        .configure(configure_exam_routes)
        .configure(configure_file_routes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::utils::jwt::JwtUtils;
    use actix_web::{App, http::StatusCode, test};

    fn bearer(role: UserRole) -> (&'static str, String) {
        let token = JwtUtils::generate_token(1, &role).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    // 角色不符的请求在进入业务层前就被拦截，不需要存储
    #[actix_web::test]
    async fn test_role_gates_across_routes() {
        let app = test::init_service(App::new().configure(configure_all)).await;

        let cases = [
            ("GET", "/api/v1/users", None, StatusCode::UNAUTHORIZED),
            ("GET", "/api/v1/users", Some(UserRole::Tutor), StatusCode::FORBIDDEN),
            ("POST", "/api/v1/exams", Some(UserRole::Student), StatusCode::FORBIDDEN),
            ("GET", "/api/v1/exams/results/my", Some(UserRole::Tutor), StatusCode::FORBIDDEN),
            ("POST", "/api/v1/exams/3/publish", Some(UserRole::Tutor), StatusCode::FORBIDDEN),
            ("GET", "/api/v1/students/me", Some(UserRole::Tutor), StatusCode::FORBIDDEN),
            ("GET", "/api/v1/tutors/me", Some(UserRole::Student), StatusCode::FORBIDDEN),
            ("POST", "/api/v1/enrollments", Some(UserRole::Student), StatusCode::FORBIDDEN),
            ("POST", "/api/v1/assignments", Some(UserRole::Admin), StatusCode::FORBIDDEN),
            ("POST", "/api/v1/assignments/5/submit", Some(UserRole::Tutor), StatusCode::FORBIDDEN),
            ("PUT", "/api/v1/submissions/5/grade", Some(UserRole::Student), StatusCode::FORBIDDEN),
            ("DELETE", "/api/v1/subjects/2", Some(UserRole::Tutor), StatusCode::FORBIDDEN),
        ];

        for (method, uri, role, expected) in cases {
            let mut req = match method {
                "POST" => test::TestRequest::post(),
                "PUT" => test::TestRequest::put(),
                "DELETE" => test::TestRequest::delete(),
                _ => test::TestRequest::get(),
            }
            .uri(uri);
            if let Some(role) = role {
                req = req.insert_header(bearer(role));
            }
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), expected, "{method} {uri}");
        }
    }
}
