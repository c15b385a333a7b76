pub mod grade;
pub mod submit;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::submissions::requests::GradeSubmissionRequest;

super::define_service!(SubmissionService);

impl SubmissionService {
    // 学生提交作业（multipart）
    pub async fn submit(
        &self,
        assignment_id: i64,
        payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        submit::handle_submit(self, assignment_id, payload, request).await
    }

    // 导师评分
    pub async fn grade(
        &self,
        submission_id: i64,
        req: GradeSubmissionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        grade::handle_grade(self, submission_id, req, request).await
    }
}
