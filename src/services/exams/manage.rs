use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ExamService;
use crate::models::{
    ApiResponse, ErrorCode,
    exams::requests::{CreateExamRequest, ExamListParams, UpdateExamRequest},
    users::entities::UserRole,
};
use crate::services::{error_response, not_found, principal_from, resolve_student_id};

/// 学生只看到选课覆盖的考试，其余角色按条件分页
pub async fn list_exams(
    service: &ExamService,
    query: ExamListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let principal = match principal_from(request) {
        Ok(p) => p,
        Err(e) => return Ok(error_response(&e)),
    };

    if principal.role == UserRole::Student {
        let exams = match resolve_student_id(request, &storage).await {
            Ok(student_id) => storage.list_student_exams(student_id).await,
            Err(e) => Err(e),
        };
        return match exams {
            Ok(exams) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                exams,
                "Exams retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e)),
        };
    }

    match storage.list_exams(query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            page,
            "Exams retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn create_exam(
    service: &ExamService,
    req: CreateExamRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let principal = match principal_from(request) {
        Ok(p) => p,
        Err(e) => return Ok(error_response(&e)),
    };
    let storage = service.get_storage(request)?;

    match storage.create_exam(principal.user_id, req).await {
        Ok(exam) => {
            tracing::info!("Exam {} '{}' scheduled on {}", exam.id, exam.title, exam.exam_date);
            Ok(HttpResponse::Created().json(ApiResponse::success(exam, "Exam created successfully")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_exam(
    service: &ExamService,
    exam_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.get_exam(exam_id).await {
        Ok(Some(exam)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            exam,
            "Exam retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::ExamNotFound, "Exam not found")),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn update_exam(
    service: &ExamService,
    exam_id: i64,
    req: UpdateExamRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.update_exam(exam_id, req).await {
        Ok(Some(exam)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            exam,
            "Exam updated successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::ExamNotFound, "Exam not found")),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn delete_exam(
    service: &ExamService,
    exam_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match storage.delete_exam(exam_id).await {
        Ok(true) => {
            tracing::info!("Exam {} deleted", exam_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Exam deleted successfully")))
        }
        Ok(false) => Ok(not_found(ErrorCode::ExamNotFound, "Exam not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
