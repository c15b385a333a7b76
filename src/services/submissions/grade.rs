use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::{ApiResponse, ErrorCode, submissions::requests::GradeSubmissionRequest};
use crate::services::{error_response, not_found_as, resolve_tutor_id};

pub async fn handle_grade(
    service: &SubmissionService,
    submission_id: i64,
    req: GradeSubmissionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let tutor_id = match resolve_tutor_id(request, &storage).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match storage.grade_submission(tutor_id, submission_id, req).await {
        Ok(graded) => {
            tracing::info!(
                "Submission {} graded by tutor {} ({} student(s) updated)",
                submission_id,
                tutor_id,
                graded.updated_student_ids.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                graded,
                "Submission graded successfully",
            )))
        }
        Err(e) => Ok(not_found_as(&e, ErrorCode::SubmissionNotFound)),
    }
}
