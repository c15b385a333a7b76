use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::errors::PortalError;
use crate::models::{
    ApiResponse, ErrorCode, assignments::responses::AssignmentDetail, users::entities::UserRole,
};
use crate::services::{
    error_response, not_found_as, principal_from, resolve_student_id, resolve_tutor_id,
};

/// 学生看到本人提交，导师（仅作者）看到全部有文件的提交
pub async fn get_assignment_detail(
    service: &AssignmentService,
    assignment_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let principal = match principal_from(request) {
        Ok(p) => p,
        Err(e) => return Ok(error_response(&e)),
    };

    let detail = match principal.role {
        UserRole::Student => match resolve_student_id(request, &storage).await {
            Ok(student_id) => storage
                .get_student_assignment_detail(student_id, assignment_id)
                .await
                .map(AssignmentDetail::Student),
            Err(e) => Err(e),
        },
        UserRole::Tutor => match resolve_tutor_id(request, &storage).await {
            Ok(tutor_id) => storage
                .get_tutor_assignment_detail(tutor_id, assignment_id)
                .await
                .map(AssignmentDetail::Tutor),
            Err(e) => Err(e),
        },
        UserRole::Admin => Err(PortalError::authorization(
            "Assignment details are available to tutors and students",
        )),
    };

    match detail {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Assignment retrieved successfully",
        ))),
        Err(e) => Ok(not_found_as(&e, ErrorCode::AssignmentNotFound)),
    }
}
