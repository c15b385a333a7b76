pub mod manage;
pub mod registration;
pub mod results;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::exams::requests::{
    CreateExamRequest, ExamListParams, RecordResultRequest, UpdateExamRequest,
};

super::define_service!(ExamService);

impl ExamService {
    pub async fn list_exams(
        &self,
        query: ExamListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::list_exams(self, query, request).await
    }

    pub async fn create_exam(
        &self,
        req: CreateExamRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::create_exam(self, req, request).await
    }

    pub async fn get_exam(&self, exam_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        manage::get_exam(self, exam_id, request).await
    }

    pub async fn update_exam(
        &self,
        exam_id: i64,
        req: UpdateExamRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::update_exam(self, exam_id, req, request).await
    }

    pub async fn delete_exam(
        &self,
        exam_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        manage::delete_exam(self, exam_id, request).await
    }

    // 学生报名
    pub async fn register(&self, exam_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        registration::register(self, exam_id, request).await
    }

    pub async fn list_my_registrations(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        registration::list_my_registrations(self, request).await
    }

    // 录入成绩（管理员或本科目导师）
    pub async fn record_result(
        &self,
        exam_id: i64,
        req: RecordResultRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        results::record_result(self, exam_id, req, request).await
    }

    pub async fn list_results(
        &self,
        exam_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        results::list_results(self, exam_id, request).await
    }

    pub async fn publish_results(
        &self,
        exam_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        results::publish_results(self, exam_id, request).await
    }

    pub async fn list_my_results(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        results::list_my_results(self, request).await
    }
}
