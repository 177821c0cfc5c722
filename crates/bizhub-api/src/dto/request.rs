//! Request DTOs with validation.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address (case-insensitive).
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
}

/// Business registration request. The registering person becomes the owner.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Name of the new business.
    #[validate(length(min = 1, max = 255, message = "Business name is required"))]
    pub business_name: String,
    /// Owner's display name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 1024, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Create role request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    /// Role name.
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    /// Optional `#RRGGBB` color.
    #[validate(length(equal = 7))]
    pub color: Option<String>,
}

/// Assign a role to an account.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}

/// Grant a route to a role.
#[derive(Debug, Deserialize, Validate)]
pub struct GrantRouteRequest {
    #[validate(length(min = 1, max = 255))]
    pub route: String,
    pub role_id: Uuid,
}

/// `?route=` query parameter.
#[derive(Debug, Deserialize, Validate)]
pub struct RouteQuery {
    #[validate(length(min = 1, max = 255))]
    pub route: String,
}

/// Audit log listing query.
#[derive(Debug, Deserialize, Validate)]
pub struct AuditLogQuery {
    /// Maximum number of entries (default 50).
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
}

impl AuditLogQuery {
    pub const DEFAULT_LIMIT: i64 = 50;

    /// The requested limit or the default.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let ok = LoginRequest {
            email: "boss@acme.test".into(),
            password: "pw".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "not-an-email".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            business_name: "Acme".into(),
            name: "Bia".into(),
            email: "bia@acme.test".into(),
            password: "s3cret".into(),
            confirm_password: "s3cret".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            business_name: String::new(),
            password: "12345".into(),
            confirm_password: "54321".into(),
            ..ok
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("business_name"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("confirm_password"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn test_audit_limit_bounds() {
        assert_eq!(AuditLogQuery { limit: None }.limit(), 50);
        assert!(AuditLogQuery { limit: Some(200) }.validate().is_ok());
        assert!(AuditLogQuery { limit: Some(0) }.validate().is_err());
        assert!(AuditLogQuery { limit: Some(201) }.validate().is_err());
    }
}
