use crate::config::AppConfig;
use crate::models::auth::entities::Principal;
use crate::models::users::entities::UserRole;
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // 用户 ID
    pub role: String, // 用户角色
    pub exp: usize,   // 过期时间（时间戳）
    pub iat: usize,   // 签发时间
}

impl Claims {
    /// 解出调用方身份；`sub` 或 `role` 非法时返回 None
    pub fn principal(&self) -> Option<Principal> {
        let user_id = self.sub.parse::<i64>().ok()?;
        let role = self.role.parse::<UserRole>().ok()?;
        Some(Principal { user_id, role })
    }
}

pub struct JwtUtils;

impl JwtUtils {
    fn get_secret() -> String {
        AppConfig::get().jwt.secret.clone()
    }

    /// 令牌有效期
    pub fn token_expiry() -> chrono::Duration {
        chrono::Duration::days(AppConfig::get().jwt.token_expiry_days)
    }

    /// 生成会话令牌
    pub fn generate_token(
        user_id: i64,
        role: &UserRole,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        Self::generate_token_with_secret(user_id, role, Self::token_expiry(), &Self::get_secret())
    }

    pub fn generate_token_with_secret(
        user_id: i64,
        role: &UserRole,
        expiry_duration: chrono::Duration,
        secret: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let expiration = now + expiry_duration;

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: expiration.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
    }

    // 验证 JWT token（签名与过期时间）
    pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        Self::verify_token_with_secret(token, &Self::get_secret())
    }

    pub fn verify_token_with_secret(
        token: &str,
        secret: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(secret.as_ref());
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &decoding_key, &validation).map(|token_data| token_data.claims)
    }

    /// 创建会话 Cookie
    pub fn create_auth_cookie(token: &str) -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(config.jwt.cookie_name.clone(), token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::days(
                config.jwt.token_expiry_days,
            ))
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(config.is_production()) // 生产环境下使用 HTTPS
            .finish()
    }

    /// 创建已过期的空 Cookie（用于注销）
    pub fn create_empty_auth_cookie() -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(config.jwt.cookie_name.clone(), "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    /// 从请求中提取令牌：先 Authorization 头，再 Cookie
    pub fn extract_token(req: &actix_web::HttpRequest) -> Option<String> {
        let bearer = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        bearer.or_else(|| {
            req.cookie(&AppConfig::get().jwt.cookie_name)
                .map(|cookie| cookie.value().to_string())
                .filter(|s| !s.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_issue_and_verify_round_trip() {
        let token =
            JwtUtils::generate_token_with_secret(42, &UserRole::Tutor, chrono::Duration::days(7), SECRET)
                .unwrap();
        let claims = JwtUtils::verify_token_with_secret(&token, SECRET).unwrap();
        assert_eq!(
            claims.principal(),
            Some(Principal {
                user_id: 42,
                role: UserRole::Tutor
            })
        );
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token =
            JwtUtils::generate_token_with_secret(1, &UserRole::Admin, chrono::Duration::days(1), SECRET)
                .unwrap();
        assert!(JwtUtils::verify_token_with_secret(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = JwtUtils::generate_token_with_secret(
            1,
            &UserRole::Student,
            chrono::Duration::seconds(-60),
            SECRET,
        )
        .unwrap();
        assert!(JwtUtils::verify_token_with_secret(&token, SECRET).is_err());
    }

    #[test]
    fn test_principal_rejects_unknown_role() {
        let claims = Claims {
            sub: "5".into(),
            role: "root".into(),
            exp: 0,
            iat: 0,
        };
        assert!(claims.principal().is_none());
    }
}
