use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::auth::responses::{TokenVerificationResponse, UserInfoResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, not_found, principal_from};

use super::AuthService;

pub async fn handle_verify_token(
    _service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match principal_from(request) {
        Ok(principal) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            TokenVerificationResponse {
                is_valid: true,
                user_id: principal.user_id,
                role: principal.role,
            },
            "Token is valid",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn handle_get_user(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let principal = match principal_from(request) {
        Ok(p) => p,
        Err(e) => return Ok(error_response(&e)),
    };
    let storage = service.get_storage(request)?;

    match storage.get_user_by_id(principal.user_id).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "User information retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
