use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::enrollments::requests::{EnrollRequest, EnrollmentListParams};
use crate::models::users::entities::UserRole;
use crate::services::EnrollmentService;
use crate::utils::SafeIDI64;

// 懒加载的全局 EnrollmentService 实例
static ENROLLMENT_SERVICE: Lazy<EnrollmentService> = Lazy::new(EnrollmentService::new_lazy);

// 导师名下的选课
pub async fn list_enrollments(
    req: HttpRequest,
    query: web::Query<EnrollmentListParams>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .list_enrollments(query.into_inner(), &req)
        .await
}

pub async fn enroll(
    req: HttpRequest,
    body: web::Json<EnrollRequest>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.enroll(body.into_inner(), &req).await
}

pub async fn unenroll(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.unenroll(path.0, &req).await
}

// 学生自己的选课
pub async fn list_my_enrollments(req: HttpRequest) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.list_my_enrollments(&req).await
}

pub fn configure_enrollment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/enrollments")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/my")
                    .route(web::get().to(list_my_enrollments))
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles())),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::tutor_roles()))
                    .service(
                        web::resource("")
                            .route(web::get().to(list_enrollments))
                            .route(web::post().to(enroll)),
                    )
                    .service(web::resource("/{id}").route(web::delete().to(unenroll))),
            ),
    );
}
