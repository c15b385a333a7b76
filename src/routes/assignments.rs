use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::assignments::requests::{AssignmentListParams, AssignmentRequest};
use crate::models::users::entities::UserRole;
use crate::services::{AssignmentService, SubmissionService};
use crate::utils::SafeIDI64;

// 懒加载的全局 AssignmentService 实例
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 列出作业（业务层按角色过滤）
pub async fn list_assignments(
    req: HttpRequest,
    query: web::Query<AssignmentListParams>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_assignments(query.into_inner(), &req)
        .await
}

pub async fn create_assignment(
    req: HttpRequest,
    body: web::Json<AssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .create_assignment(body.into_inner(), &req)
        .await
}

pub async fn get_assignment(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.get_assignment(path.0, &req).await
}

pub async fn update_assignment(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<AssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .update_assignment(path.0, body.into_inner(), &req)
        .await
}

pub async fn delete_assignment(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.delete_assignment(path.0, &req).await
}

// 学生提交作业
pub async fn submit_assignment(
    req: HttpRequest,
    path: SafeIDI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE.submit(path.0, payload, &req).await
}

pub fn configure_assignment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    // 导师看自己的作业，学生看选课覆盖的作业
                    .route(
                        web::get()
                            .to(list_assignments)
                            .wrap(middlewares::RequireRole::new_any(
                                UserRole::tutor_or_student_roles(),
                            )),
                    )
                    .route(
                        web::post()
                            .to(create_assignment)
                            .wrap(middlewares::RequireRole::new_any(UserRole::tutor_roles())),
                    ),
            )
            .service(
                web::resource("/{id}/submit")
                    .route(web::post().to(submit_assignment))
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles())),
            )
            .service(
                web::resource("/{id}")
                    .route(
                        web::get()
                            .to(get_assignment)
                            .wrap(middlewares::RequireRole::new_any(
                                UserRole::tutor_or_student_roles(),
                            )),
                    )
                    .route(
                        web::put()
                            .to(update_assignment)
                            .wrap(middlewares::RequireRole::new_any(UserRole::tutor_roles())),
                    )
                    .route(
                        web::delete()
                            .to(delete_assignment)
                            .wrap(middlewares::RequireRole::new_any(UserRole::tutor_roles())),
                    ),
            ),
    );
}
