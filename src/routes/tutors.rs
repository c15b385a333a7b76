use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::tutors::requests::{CreateTutorRequest, TutorListParams, UpdateTutorRequest};
use crate::models::users::entities::UserRole;
use crate::services::TutorService;
use crate::utils::SafeIDI64;

// 懒加载的全局 TutorService 实例
static TUTOR_SERVICE: Lazy<TutorService> = Lazy::new(TutorService::new_lazy);

pub async fn list_tutors(
    req: HttpRequest,
    query: web::Query<TutorListParams>,
) -> ActixResult<HttpResponse> {
    TUTOR_SERVICE.list_tutors(query.into_inner(), &req).await
}

pub async fn create_tutor(
    req: HttpRequest,
    body: web::Json<CreateTutorRequest>,
) -> ActixResult<HttpResponse> {
    TUTOR_SERVICE.create_tutor(body.into_inner(), &req).await
}

// 当前账号自己的档案
pub async fn get_me(req: HttpRequest) -> ActixResult<HttpResponse> {
    TUTOR_SERVICE.get_me(&req).await
}

pub async fn get_tutor(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    TUTOR_SERVICE.get_tutor(path.0, &req).await
}

pub async fn update_tutor(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<UpdateTutorRequest>,
) -> ActixResult<HttpResponse> {
    TUTOR_SERVICE
        .update_tutor(path.0, body.into_inner(), &req)
        .await
}

pub async fn delete_tutor(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    TUTOR_SERVICE.delete_tutor(path.0, &req).await
}

pub fn configure_tutor_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/tutors")
            .wrap(middlewares::RequireJWT)
            // /me 必须先于 /{id} 注册
            .service(
                web::resource("/me")
                    .route(web::get().to(get_me))
                    .wrap(middlewares::RequireRole::new_any(UserRole::tutor_roles())),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .service(
                        web::resource("")
                            .route(web::get().to(list_tutors))
                            .route(web::post().to(create_tutor)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(get_tutor))
                            .route(web::put().to(update_tutor))
                            .route(web::delete().to(delete_tutor)),
                    ),
            ),
    );
}
