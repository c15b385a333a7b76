/*!
 * JWT 认证中间件
 *
 * 令牌来源依次为 `Authorization: Bearer <token>` 请求头与会话 Cookie。
 * 校验通过后把 [`Principal`] 放入请求扩展，后续的 [`RequireRole`](super::RequireRole)
 * 与处理函数通过 [`RequireJWT::extract_principal`] 读取。
 *
 * ```rust,ignore
 * web::scope("/api/v1/students")
 *     .wrap(RequireRole::new_any(UserRole::admin_roles()))
 *     .wrap(RequireJWT)
 * ```
 *
 * 缺失、签名错误或过期的令牌返回 401；OPTIONS 预检直接返回 204。
 */

use crate::models::auth::entities::Principal;
use crate::models::ErrorCode;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireJWT;

fn authenticate(req: &ServiceRequest) -> Result<Principal, &'static str> {
    let token = JwtUtils::extract_token(req.request()).ok_or("Missing authentication token")?;

    let claims = JwtUtils::verify_token(&token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid or expired token"
    })?;

    claims.principal().ok_or("Malformed token claims")
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match authenticate(&req) {
                Ok(principal) => {
                    debug!(
                        "JWT authentication successful for user {} ({})",
                        principal.user_id, principal.role
                    );
                    req.extensions_mut().insert(principal);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 读取调用方身份；只能在 RequireJWT 保护的路由中使用
    pub fn extract_principal(req: &actix_web::HttpRequest) -> Option<Principal> {
        req.extensions().get::<Principal>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<Principal>().map(|p| p.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::users::entities::UserRole;
    use actix_web::{App, HttpRequest, HttpResponse, cookie::Cookie, test, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match RequireJWT::extract_principal(&req) {
            Some(p) => HttpResponse::Ok().body(format!("{}:{}", p.user_id, p.role)),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    fn token(user_id: i64, role: UserRole) -> String {
        JwtUtils::generate_token(user_id, &role).unwrap()
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test::init_service(
            App::new().service(web::scope("/p").wrap(RequireJWT).route("", web::get().to(whoami))),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/p").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_bearer_and_cookie_accepted() {
        let app = test::init_service(
            App::new().service(web::scope("/p").wrap(RequireJWT).route("", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header(("Authorization", format!("Bearer {}", token(7, UserRole::Tutor))))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "7:tutor");

        let cookie_name = AppConfig::get().jwt.cookie_name.clone();
        let req = test::TestRequest::get()
            .uri("/p")
            .cookie(Cookie::new(cookie_name, token(9, UserRole::Student)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "9:student");
    }

    #[actix_web::test]
    async fn test_options_short_circuits() {
        let app = test::init_service(
            App::new().service(
                web::scope("/p")
                    .wrap(RequireJWT)
                    .route("", web::method(actix_web::http::Method::OPTIONS).to(whoami)),
            ),
        )
        .await;
        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/p")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}
