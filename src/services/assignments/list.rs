use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::errors::PortalError;
use crate::models::{
    ApiResponse, assignments::requests::AssignmentListParams, users::entities::UserRole,
};
use crate::services::{error_response, principal_from, resolve_student_id, resolve_tutor_id};

pub async fn list_assignments(
    service: &AssignmentService,
    query: AssignmentListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let principal = match principal_from(request) {
        Ok(p) => p,
        Err(e) => return Ok(error_response(&e)),
    };

    let response = match principal.role {
        UserRole::Tutor => match resolve_tutor_id(request, &storage).await {
            Ok(tutor_id) => storage
                .list_tutor_assignments(tutor_id, query)
                .await
                .map(|page| {
                    HttpResponse::Ok()
                        .json(ApiResponse::success(page, "Assignments retrieved successfully"))
                }),
            Err(e) => Err(e),
        },
        UserRole::Student => match resolve_student_id(request, &storage).await {
            Ok(student_id) => storage
                .list_student_assignments(student_id, query)
                .await
                .map(|page| {
                    HttpResponse::Ok()
                        .json(ApiResponse::success(page, "Assignments retrieved successfully"))
                }),
            Err(e) => Err(e),
        },
        UserRole::Admin => Err(PortalError::authorization(
            "Assignments are listed per tutor or student",
        )),
    };

    Ok(response.unwrap_or_else(|e| error_response(&e)))
}
