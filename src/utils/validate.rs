use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::PortalError;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 -]{6,20}$").expect("Invalid phone regex"));

pub fn validate_username(username: &str) -> Result<(), PortalError> {
    // 3 <= 长度 <= 32
    if username.len() < 3 || username.len() > 32 {
        return Err(PortalError::validation(
            "Username length must be between 3 and 32 characters",
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(PortalError::validation(
            "Username may only contain letters, digits, '.', '_' or '-'",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), PortalError> {
    if !EMAIL_RE.is_match(email) {
        return Err(PortalError::validation("Email format is invalid"));
    }
    Ok(())
}

/// 空串视为未填写
pub fn validate_optional_email(email: Option<&str>) -> Result<(), PortalError> {
    match email.map(str::trim) {
        Some(e) if !e.is_empty() => validate_email(e),
        _ => Ok(()),
    }
}

pub fn validate_optional_phone(phone: Option<&str>) -> Result<(), PortalError> {
    match phone.map(str::trim) {
        Some(p) if !p.is_empty() && !PHONE_RE.is_match(p) => {
            Err(PortalError::validation("Phone number format is invalid"))
        }
        _ => Ok(()),
    }
}

/// 密码至少 8 位，且同时包含字母和数字
pub fn validate_password(password: &str) -> Result<(), PortalError> {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        errors.push("Password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PortalError::validation(errors.join("; ")))
    }
}

/// 必填文本：去除首尾空白后不能为空
pub fn required_text(field: &str, value: &str) -> Result<String, PortalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortalError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("jane.doe").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert_eq!(validate_username("x".repeat(33).as_str()).unwrap_err().code(), "E007");
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("abcd1234").is_ok());
        let err = validate_password("short1").unwrap_err();
        assert!(err.message().contains("at least 8"));
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("12345678").is_err());
    }

    #[test]
    fn test_optional_fields() {
        assert!(validate_optional_email(None).is_ok());
        assert!(validate_optional_email(Some("  ")).is_ok());
        assert!(validate_optional_email(Some("a@b.io")).is_ok());
        assert!(validate_optional_email(Some("nope")).is_err());
        assert!(validate_optional_phone(Some("+86 138-0000-0000")).is_ok());
        assert!(validate_optional_phone(Some("call me")).is_err());
    }

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("Name", "  Ann ").unwrap(), "Ann");
        assert!(required_text("Name", "   ").is_err());
    }
}
