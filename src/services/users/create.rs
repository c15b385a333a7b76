use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::errors::PortalError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        entities::UserRole,
        requests::{CreateUserRequest, NewUser},
    },
};
use crate::services::error_response;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_optional_email, validate_password, validate_username};

fn prepare(user_data: CreateUserRequest) -> Result<NewUser, PortalError> {
    let username = user_data.username.trim().to_string();
    validate_username(&username)?;
    validate_optional_email(user_data.email.as_deref())?;
    validate_password(&user_data.password)?;

    Ok(NewUser {
        username,
        email: user_data
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
        password_hash: hash_password(&user_data.password)?,
        role: UserRole::Admin,
    })
}

pub async fn create_user(
    service: &UserService,
    user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let new_user = match prepare(user_data) {
        Ok(u) => u,
        Err(e) => return Ok(error_response(&e)),
    };

    let storage = service.get_storage(request)?;

    match storage.create_user(new_user).await {
        Ok(user) => {
            tracing::info!("Admin account {} created", user.username);
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "User created successfully")))
        }
        Err(PortalError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "Username or email already exists"),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}
