use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::exams::requests::{
    CreateExamRequest, ExamListParams, RecordResultRequest, UpdateExamRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::ExamService;
use crate::utils::SafeIDI64;

// 懒加载的全局 ExamService 实例
static EXAM_SERVICE: Lazy<ExamService> = Lazy::new(ExamService::new_lazy);

// 学生只看到选课覆盖的考试
pub async fn list_exams(
    req: HttpRequest,
    query: web::Query<ExamListParams>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_exams(query.into_inner(), &req).await
}

pub async fn create_exam(
    req: HttpRequest,
    body: web::Json<CreateExamRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.create_exam(body.into_inner(), &req).await
}

pub async fn get_exam(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.get_exam(path.0, &req).await
}

pub async fn update_exam(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<UpdateExamRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .update_exam(path.0, body.into_inner(), &req)
        .await
}

pub async fn delete_exam(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.delete_exam(path.0, &req).await
}

pub async fn register(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.register(path.0, &req).await
}

pub async fn list_my_registrations(req: HttpRequest) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_my_registrations(&req).await
}

pub async fn record_result(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<RecordResultRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SERVICE
        .record_result(path.0, body.into_inner(), &req)
        .await
}

pub async fn list_results(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_results(path.0, &req).await
}

pub async fn publish_results(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.publish_results(path.0, &req).await
}

pub async fn list_my_results(req: HttpRequest) -> ActixResult<HttpResponse> {
    EXAM_SERVICE.list_my_results(&req).await
}

pub fn configure_exam_routes(cfg: &mut web::ServiceConfig) {
    let admin = || middlewares::RequireRole::new_any(UserRole::admin_roles());
    let student = || middlewares::RequireRole::new_any(UserRole::student_roles());
    let staff = || middlewares::RequireRole::new_any(UserRole::staff_roles());

    cfg.service(
        web::scope("/api/v1/exams")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_exams))
                    .route(web::post().to(create_exam).wrap(admin())),
            )
            // 固定路径先于 /{id} 注册
            .service(
                web::resource("/registrations/my")
                    .route(web::get().to(list_my_registrations))
                    .wrap(student()),
            )
            .service(
                web::resource("/results/my")
                    .route(web::get().to(list_my_results))
                    .wrap(student()),
            )
            .service(
                web::resource("/{id}/register")
                    .route(web::post().to(register))
                    .wrap(student()),
            )
            .service(
                web::resource("/{id}/results")
                    .route(web::get().to(list_results))
                    .route(web::put().to(record_result))
                    .wrap(staff()),
            )
            .service(
                web::resource("/{id}/publish")
                    .route(web::post().to(publish_results))
                    .wrap(admin()),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_exam))
                    .route(web::put().to(update_exam))
                    .route(web::delete().to(delete_exam))
                    .wrap(admin()),
            ),
    );
}
