//! 年级（班级层级）管理

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::PortalError;
use crate::models::{
    ApiResponse, ErrorCode,
    grades::requests::{CreateGradeRequest, GradeListParams, UpdateGradeRequest},
};
use crate::services::{error_response, not_found};

super::define_service!(GradeService);

impl GradeService {
    pub async fn list_grades(
        &self,
        query: GradeListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.list_grades(query).await {
            Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                page,
                "Grade list retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn get_grade(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.get_grade(id).await {
            Ok(Some(grade)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                grade,
                "Grade retrieved successfully",
            ))),
            Ok(None) => Ok(not_found(ErrorCode::NotFound, "Grade not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn create_grade(
        &self,
        req: CreateGradeRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.create_grade(req).await {
            Ok(grade) => {
                tracing::info!("Grade {} created", grade.name);
                Ok(HttpResponse::Created()
                    .json(ApiResponse::success(grade, "Grade created successfully")))
            }
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn update_grade(
        &self,
        id: i64,
        req: UpdateGradeRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.update_grade(id, req).await {
            Ok(Some(grade)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                grade,
                "Grade updated successfully",
            ))),
            Ok(None) => Ok(not_found(ErrorCode::NotFound, "Grade not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn delete_grade(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.delete_grade(id).await {
            Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Grade deleted successfully",
            ))),
            Ok(false) => Ok(not_found(ErrorCode::NotFound, "Grade not found")),
            Err(PortalError::Conflict(_)) => Ok(error_response(&PortalError::conflict(
                "Grade is still referenced by students, enrollments, assignments or exams",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }
}
