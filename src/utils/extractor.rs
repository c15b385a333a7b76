//! 路径参数提取器
//!
//! 非法参数直接返回 400 JSON，不进入处理函数。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_param(message: String) -> actix_web::Error {
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(
            ErrorCode::BadRequest,
            message,
        )),
    )
    .into()
}

macro_rules! define_safe_id {
    ($name:ident, $param:literal) => {
        #[doc = concat!("路径参数 `{", $param, "}`，必须为正整数")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                let raw = req.match_info().get($param).unwrap_or_default();
                ready(match raw.parse::<i64>() {
                    Ok(id) if id > 0 => Ok($name(id)),
                    _ => Err(bad_param(format!(
                        "Invalid path parameter '{}': {}",
                        $param, raw
                    ))),
                })
            }
        }
    };
}

define_safe_id!(SafeIDI64, "id");

/// 上传目录中的平铺文件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeFileName(pub String);

impl FromRequest for SafeFileName {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("file").unwrap_or_default();
        let valid = !raw.is_empty()
            && raw.len() <= 128
            && !raw.contains("..")
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        ready(if valid {
            Ok(SafeFileName(raw.to_string()))
        } else {
            Err(bad_param(format!("Invalid file name: {raw}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test, web};

    async fn echo(id: SafeIDI64) -> HttpResponse {
        HttpResponse::Ok().body(id.0.to_string())
    }

    #[actix_web::test]
    async fn test_safe_id_accepts_positive() {
        let app = test::init_service(App::new().route("/items/{id}", web::get().to(echo))).await;
        let req = test::TestRequest::get().uri("/items/42").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "42");
    }

    #[actix_web::test]
    async fn test_safe_id_rejects_garbage() {
        let app = test::init_service(App::new().route("/items/{id}", web::get().to(echo))).await;
        for uri in ["/items/abc", "/items/0", "/items/-3"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400, "{uri}");
        }
    }
}
