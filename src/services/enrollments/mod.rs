//! 选课目录

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    enrollments::requests::{EnrollRequest, EnrollmentListParams},
};
use crate::errors::PortalError;
use crate::services::{error_response, not_found_as, resolve_student_id, resolve_tutor_id};

super::define_service!(EnrollmentService);

impl EnrollmentService {
    /// 导师名下的有效选课
    pub async fn list_enrollments(
        &self,
        query: EnrollmentListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let result = match resolve_tutor_id(request, &storage).await {
            Ok(tutor_id) => storage.list_enrollments(tutor_id, query).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                page,
                "Enrollment list retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn enroll(
        &self,
        req: EnrollRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let result = match resolve_tutor_id(request, &storage).await {
            Ok(tutor_id) => storage.enroll_student(tutor_id, req).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(enrollment) => {
                tracing::info!(
                    "Student {} enrolled into subject {} grade {}",
                    enrollment.student_id,
                    enrollment.subject_id,
                    enrollment.grade_id
                );
                Ok(HttpResponse::Created().json(ApiResponse::success(
                    enrollment,
                    "Student enrolled successfully",
                )))
            }
            Err(PortalError::Conflict(msg)) => Ok(HttpResponse::Conflict()
                .json(ApiResponse::error_empty(ErrorCode::AlreadyEnrolled, msg))),
            Err(e) => Ok(error_response(&e)),
        }
    }

    /// 软退课
    pub async fn unenroll(
        &self,
        enrollment_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let result = match resolve_tutor_id(request, &storage).await {
            Ok(tutor_id) => storage.unenroll(tutor_id, enrollment_id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(enrollment) => {
                tracing::info!("Enrollment {} deactivated", enrollment.id);
                Ok(HttpResponse::Ok().json(ApiResponse::success(
                    enrollment,
                    "Student unenrolled successfully",
                )))
            }
            Err(e) => Ok(not_found_as(&e, ErrorCode::EnrollmentNotFound)),
        }
    }

    /// 学生本人的有效选课
    pub async fn list_my_enrollments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let result = match resolve_student_id(request, &storage).await {
            Ok(student_id) => storage.list_student_enrollments(student_id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                items,
                "Enrollments retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }
}
