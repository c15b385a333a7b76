use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::{ApiResponse, ErrorCode, assignments::requests::AssignmentRequest};
use crate::services::{error_response, local_today, not_found_as, resolve_tutor_id};

pub async fn update_assignment(
    service: &AssignmentService,
    assignment_id: i64,
    req: AssignmentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(e) = req.validate(local_today()) {
        return Ok(error_response(&e));
    }

    let storage = service.get_storage(request)?;
    let tutor_id = match resolve_tutor_id(request, &storage).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match storage.update_assignment(tutor_id, assignment_id, req).await {
        Ok(assignment) => {
            tracing::info!("Assignment {} updated", assignment.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                assignment,
                "Assignment updated successfully",
            )))
        }
        Err(e) => Ok(not_found_as(&e, ErrorCode::AssignmentNotFound)),
    }
}
