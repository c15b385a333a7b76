use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::students::requests::{CreateStudentRequest, StudentListParams, UpdateStudentRequest};
use crate::models::users::entities::UserRole;
use crate::services::StudentService;
use crate::utils::SafeIDI64;

static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentListParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_students(query.into_inner(), &req).await
}

pub async fn create_student(
    req: HttpRequest,
    body: web::Json<CreateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.create_student(body.into_inner(), &req).await
}

// 当前账号自己的档案
pub async fn get_me(req: HttpRequest) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.get_me(&req).await
}

pub async fn get_student(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.get_student(path.0, &req).await
}

pub async fn update_student(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<UpdateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .update_student(path.0, body.into_inner(), &req)
        .await
}

pub async fn delete_student(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.delete_student(path.0, &req).await
}

pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireJWT)
            // /me 必须先于 /{id} 注册
            .service(
                web::resource("/me")
                    .route(web::get().to(get_me))
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles())),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .service(
                        web::resource("")
                            .route(web::get().to(list_students))
                            .route(web::post().to(create_student)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(get_student))
                            .route(web::put().to(update_student))
                            .route(web::delete().to(delete_student)),
                    ),
            ),
    );
}
