use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::errors::PortalError;
use crate::models::{ApiResponse, ErrorCode, users::requests::UpdateUserRequest};
use crate::services::{error_response, not_found};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_optional_email, validate_password};

fn prepare(mut update_data: UpdateUserRequest) -> Result<UpdateUserRequest, PortalError> {
    validate_optional_email(update_data.email.as_deref())?;
    if let Some(password) = update_data.password.take() {
        validate_password(&password)?;
        update_data.password = Some(hash_password(&password)?);
    }
    Ok(update_data)
}

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let update_data = match prepare(update_data) {
        Ok(u) => u,
        Err(e) => return Ok(error_response(&e)),
    };

    let storage = service.get_storage(request)?;

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            user,
            "User information updated successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(e) => Ok(error_response(&e)),
    }
}
