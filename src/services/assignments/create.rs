use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::{ApiResponse, assignments::requests::AssignmentRequest};
use crate::services::{error_response, local_today, resolve_tutor_id};

pub async fn create_assignment(
    service: &AssignmentService,
    req: AssignmentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 截止日期按机构本地日期比较
    if let Err(e) = req.validate(local_today()) {
        return Ok(error_response(&e));
    }

    let storage = service.get_storage(request)?;
    let tutor_id = match resolve_tutor_id(request, &storage).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match storage.create_assignment(tutor_id, req).await {
        Ok(assignment) => {
            tracing::info!(
                "Assignment {} '{}' created by tutor {}",
                assignment.id,
                assignment.title,
                tutor_id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                assignment,
                "Assignment created successfully",
            )))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
