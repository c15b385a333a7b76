//! 导师档案：每位导师对应一个科目

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    tutors::requests::{CreateTutorRequest, TutorListParams, UpdateTutorRequest},
};
use crate::services::{
    error_response, forget_profile, not_found, prepare_account, resolve_tutor_id,
};
use crate::utils::validate::{validate_optional_email, validate_optional_phone};

super::define_service!(TutorService);

impl TutorService {
    pub async fn list_tutors(
        &self,
        query: TutorListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.list_tutors(query).await {
            Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                page,
                "Tutor list retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn get_tutor(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.get_tutor(id).await {
            Ok(Some(tutor)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                tutor,
                "Tutor retrieved successfully",
            ))),
            Ok(None) => Ok(not_found(ErrorCode::TutorNotFound, "Tutor not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }

    /// 当前导师本人的档案
    pub async fn get_me(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let tutor_id = match resolve_tutor_id(request, &storage).await {
            Ok(id) => id,
            Err(e) => return Ok(error_response(&e)),
        };
        self.get_tutor(tutor_id, request).await
    }

    pub async fn create_tutor(
        &self,
        mut req: CreateTutorRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        req.password = match prepare_account(
            &req.username,
            &req.password,
            req.email.as_deref(),
            req.phone.as_deref(),
            &req.full_name,
        ) {
            Ok(hash) => hash,
            Err(e) => return Ok(error_response(&e)),
        };
        req.username = req.username.trim().to_string();

        let storage = self.get_storage(request)?;
        match storage.create_tutor(req).await {
            Ok(tutor) => {
                tracing::info!("Tutor {} ({}) created", tutor.full_name, tutor.username);
                Ok(HttpResponse::Created().json(ApiResponse::success(
                    tutor,
                    "Tutor created successfully",
                )))
            }
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn update_tutor(
        &self,
        id: i64,
        req: UpdateTutorRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(e) = validate_optional_email(req.email.as_deref())
            .and_then(|_| validate_optional_phone(req.phone.as_deref()))
        {
            return Ok(error_response(&e));
        }

        let storage = self.get_storage(request)?;
        match storage.update_tutor(id, req).await {
            Ok(Some(tutor)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                tutor,
                "Tutor updated successfully",
            ))),
            Ok(None) => Ok(not_found(ErrorCode::TutorNotFound, "Tutor not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn delete_tutor(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.delete_tutor(id).await {
            Ok(Some(user_id)) => {
                forget_profile(request, user_id).await;
                tracing::info!("Tutor {} and account {} deleted", id, user_id);
                Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                    "Tutor deleted successfully",
                )))
            }
            Ok(None) => Ok(not_found(ErrorCode::TutorNotFound, "Tutor not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }
}
