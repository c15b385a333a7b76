//! 学生档案：账号与档案一起创建、删除

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    students::requests::{CreateStudentRequest, StudentListParams, UpdateStudentRequest},
};
use crate::services::{
    error_response, forget_profile, not_found, prepare_account, resolve_student_id,
};
use crate::utils::validate::{validate_optional_email, validate_optional_phone};

super::define_service!(StudentService);

impl StudentService {
    pub async fn list_students(
        &self,
        query: StudentListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.list_students(query).await {
            Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                page,
                "Student list retrieved successfully",
            ))),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn get_student(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.get_student(id).await {
            Ok(Some(student)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                student,
                "Student retrieved successfully",
            ))),
            Ok(None) => Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }

    /// 当前学生本人的档案
    pub async fn get_me(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let student_id = match resolve_student_id(request, &storage).await {
            Ok(id) => id,
            Err(e) => return Ok(error_response(&e)),
        };
        self.get_student(student_id, request).await
    }

    pub async fn create_student(
        &self,
        mut req: CreateStudentRequest,
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
        match storage.create_student(req).await {
            Ok(student) => {
                tracing::info!("Student {} ({}) created", student.full_name, student.username);
                Ok(HttpResponse::Created().json(ApiResponse::success(
                    student,
                    "Student created successfully",
                )))
            }
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn update_student(
        &self,
        id: i64,
        req: UpdateStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        if let Err(e) = validate_optional_email(req.email.as_deref())
            .and_then(|_| validate_optional_phone(req.phone.as_deref()))
        {
            return Ok(error_response(&e));
        }

        let storage = self.get_storage(request)?;
        match storage.update_student(id, req).await {
            Ok(Some(student)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                student,
                "Student updated successfully",
            ))),
            Ok(None) => Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }

    pub async fn delete_student(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        match storage.delete_student(id).await {
            Ok(Some(user_id)) => {
                forget_profile(request, user_id).await;
                tracing::info!("Student {} and account {} deleted", id, user_id);
                Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                    "Student deleted successfully",
                )))
            }
            Ok(None) => Ok(not_found(ErrorCode::StudentNotFound, "Student not found")),
            Err(e) => Ok(error_response(&e)),
        }
    }
}
