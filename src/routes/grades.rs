use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::grades::requests::{CreateGradeRequest, GradeListParams, UpdateGradeRequest};
use crate::models::users::entities::UserRole;
use crate::services::GradeService;
use crate::utils::SafeIDI64;

static GRADE_SERVICE: Lazy<GradeService> = Lazy::new(GradeService::new_lazy);

pub async fn list_grades(
    req: HttpRequest,
    query: web::Query<GradeListParams>,
) -> ActixResult<HttpResponse> {
    GRADE_SERVICE.list_grades(query.into_inner(), &req).await
}

pub async fn create_grade(
    req: HttpRequest,
    body: web::Json<CreateGradeRequest>,
) -> ActixResult<HttpResponse> {
    GRADE_SERVICE.create_grade(body.into_inner(), &req).await
}

pub async fn get_grade(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    GRADE_SERVICE.get_grade(path.0, &req).await
}

pub async fn update_grade(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<UpdateGradeRequest>,
) -> ActixResult<HttpResponse> {
    GRADE_SERVICE
        .update_grade(path.0, body.into_inner(), &req)
        .await
}

pub async fn delete_grade(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    GRADE_SERVICE.delete_grade(path.0, &req).await
}

// 读取对所有登录用户开放，写操作仅限管理员
pub fn configure_grade_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/grades")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_grades))
                    .route(
                        web::post()
                            .to(create_grade)
                            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles())),
                    ),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_grade))
                    .route(
                        web::put()
                            .to(update_grade)
                            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles())),
                    )
                    .route(
                        web::delete()
                            .to(delete_grade)
                            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles())),
                    ),
            ),
    );
}
