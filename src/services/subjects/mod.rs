//! 科目管理

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::PortalError;
use crate::models::{
    ApiResponse, ErrorCode,
    subjects::requests::{CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest},
};
use crate::services::{error_response, not_found};

super::define_service!(SubjectService);

fn check_create(req: &CreateSubjectRequest) -> Result<(), PortalError> {
    if req.name.trim().is_empty() || req.code.trim().is_empty() {
        return Err(PortalError::validation("Subject name and code are required"));
    }
    Ok(())
}

impl SubjectService {
    pub async fn list_subjects(
        &self,
        query: SubjectListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.list_subjects(query).await {
            Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                page,
                "Subject list retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn get_subject(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.get_subject(id).await {
            Ok(Some(subject)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                subject,
                "Subject retrieved successfully",
            ))),
            Ok(None) => Ok(not_found(ErrorCode::NotFound, "Subject not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn create_subject(
        &self,
        req: CreateSubjectRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(e) = check_create(&req) {
            return Ok(error_response(&e));
        }
        let storage = self.get_storage(request)?;
        match storage.create_subject(req).await {
            Ok(subject) => {
                tracing::info!("Subject {} ({}) created", subject.name, subject.code);
                Ok(HttpResponse::Created().json(ApiResponse::success(
                    subject,
                    "Subject created successfully",
                )))
            }
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn update_subject(
        &self,
        id: i64,
        req: UpdateSubjectRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.update_subject(id, req).await {
            Ok(Some(subject)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                subject,
                "Subject updated successfully",
            ))),
            Ok(None) => Ok(not_found(ErrorCode::NotFound, "Subject not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }

    /// 仍有导师、选课或作业引用时返回 409
    pub async fn delete_subject(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.delete_subject(id).await {
            Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Subject deleted successfully",
            ))),
            Ok(false) => Ok(not_found(ErrorCode::NotFound, "Subject not found")),
            Err(PortalError::Conflict(_)) => Ok(error_response(&PortalError::conflict(
                "Subject is still referenced by tutors, enrollments or assignments",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_create_requires_name_and_code() {
        let mut req = CreateSubjectRequest {
            name: "Mathematics".into(),
            code: "MATH".into(),
            description: None,
        };
        assert!(check_create(&req).is_ok());
        req.code = " ".into();
        assert_eq!(check_create(&req).unwrap_err().code(), "E007");
    }
}
