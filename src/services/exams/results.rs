use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::ExamService;
use crate::errors::PortalError;
use crate::models::{
    ApiResponse, ErrorCode, exams::requests::RecordResultRequest, users::entities::UserRole,
};
use crate::services::{
    error_response, not_found_as, principal_from, resolve_student_id, resolve_tutor_id,
};
use crate::storage::Storage;

/// 导师返回自己的档案 ID，管理员返回 None
async fn acting_tutor(
    request: &HttpRequest,
    storage: &Arc<dyn Storage>,
) -> Result<(i64, Option<i64>), PortalError> {
    let principal = principal_from(request)?;
    match principal.role {
        UserRole::Admin => Ok((principal.user_id, None)),
        UserRole::Tutor => {
            let tutor_id = resolve_tutor_id(request, storage).await?;
            Ok((principal.user_id, Some(tutor_id)))
        }
        UserRole::Student => Err(PortalError::authorization(
            "Only admins and tutors can manage exam results",
        )),
    }
}

pub async fn record_result(
    service: &ExamService,
    exam_id: i64,
    req: RecordResultRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let result = match acting_tutor(request, &storage).await {
        Ok((user_id, tutor_id)) => {
            storage
                .record_exam_result(exam_id, user_id, tutor_id, req)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(result) => {
            tracing::info!(
                "Result recorded for student {} in exam {}: {}",
                result.student_id,
                exam_id,
                result.score
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                result,
                "Exam result recorded successfully",
            )))
        }
        Err(e) => Ok(not_found_as(&e, ErrorCode::ExamNotFound)),
    }
}

pub async fn list_results(
    service: &ExamService,
    exam_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let results = match acting_tutor(request, &storage).await {
        Ok((_, tutor_id)) => storage.list_exam_results(exam_id, tutor_id).await,
        Err(e) => Err(e),
    };

    match results {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Exam results retrieved successfully",
        ))),
        Err(e) => Ok(not_found_as(&e, ErrorCode::ExamNotFound)),
    }
}

pub async fn publish_results(
    service: &ExamService,
    exam_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.publish_exam_results(exam_id).await {
        Ok(exam) => {
            tracing::info!("Results of exam {} published", exam.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                exam,
                "Exam results published successfully",
            )))
        }
        Err(e) => Ok(not_found_as(&e, ErrorCode::ExamNotFound)),
    }
}

/// 学生本人已发布的成绩
pub async fn list_my_results(
    service: &ExamService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let results = match resolve_student_id(request, &storage).await {
        Ok(student_id) => storage.list_student_results(student_id).await,
        Err(e) => Err(e),
    };

    match results {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Exam results retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
