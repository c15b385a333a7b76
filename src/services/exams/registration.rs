use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ExamService;
use crate::errors::PortalError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, local_today, not_found_as, resolve_student_id};

pub async fn register(
    service: &ExamService,
    exam_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let student_id = match resolve_student_id(request, &storage).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match storage
        .register_for_exam(student_id, exam_id, local_today())
        .await
    {
        Ok(registration) => {
            tracing::info!("Student {} registered for exam {}", student_id, exam_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                registration,
                "Registered for exam successfully",
            )))
        }
        Err(PortalError::Conflict(msg)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::ExamAlreadyRegistered, msg),
        )),
        Err(e) => Ok(not_found_as(&e, ErrorCode::ExamNotFound)),
    }
}

pub async fn list_my_registrations(
    service: &ExamService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let registrations = match resolve_student_id(request, &storage).await {
        Ok(student_id) => storage.list_student_registrations(student_id).await,
        Err(e) => Err(e),
    };

    match registrations {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Registrations retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
