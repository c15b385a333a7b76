use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found_as, resolve_tutor_id};
use crate::utils::UploadStore;

pub async fn delete_assignment(
    service: &AssignmentService,
    assignment_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let tutor_id = match resolve_tutor_id(request, &storage).await {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match storage.delete_assignment(tutor_id, assignment_id).await {
        Ok(file_urls) => {
            // 数据库已提交，磁盘文件尽力清理
            UploadStore::from_config().remove_urls(&file_urls).await;
            tracing::info!(
                "Assignment {} deleted with {} stored file(s)",
                assignment_id,
                file_urls.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Assignment deleted successfully",
            )))
        }
        Err(e) => Ok(not_found_as(&e, ErrorCode::AssignmentNotFound)),
    }
}
