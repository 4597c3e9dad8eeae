//! Bearer-token authentication extractor.
//!
//! Issuance of the caller's credential (login, refresh) is an external
//! collaborator; this crate only decodes the opaque identity carried in
//! the JWT so the Plan Service can gate generate/simulate behind role.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use common::{AppError, CallerIdentity, Role};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims carried by the caller's bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the caller's opaque id.
    pub sub: String,
    /// Expiration time (seconds since epoch).
    pub exp: i64,
    /// Display name.
    pub name: String,
    /// Role: ADMIN, SUPERVISOR, or READER.
    pub role: Role,
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthCaller(pub CallerIdentity);

impl AuthCaller {
    /// Require supervisor-or-higher.
    pub fn require_supervisor(&self) -> Result<(), AppError> {
        if self.0.role.can_generate() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role {} lacks permission for this operation",
                self.0.role
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".to_string()))?;

        let secret = std::env::var("JWT_SECRET").map_err(|_| {
            tracing::error!("JWT_SECRET environment variable not set");
            AppError::Internal("server is missing required configuration".to_string())
        })?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

        let claims = token_data.claims;
        Ok(AuthCaller(CallerIdentity {
            caller_id: claims.sub,
            display_name: claims.name,
            role: claims.role,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-for-unit-tests-only";

    fn mint(role: Role) -> String {
        let claims = Claims {
            sub: "caller-1".to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
            name: "Test Caller".to_string(),
            role,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        std::env::set_var("JWT_SECRET", SECRET);
        let req = Request::builder().body(Body::empty()).unwrap();
        let (mut parts, _) = req.into_parts();
        let result = AuthCaller::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn accepts_valid_bearer_token() {
        std::env::set_var("JWT_SECRET", SECRET);
        let token = mint(Role::Supervisor);
        let req = Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let caller = AuthCaller::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(caller.0.role, Role::Supervisor);
        assert!(caller.require_supervisor().is_ok());
    }

    #[tokio::test]
    async fn reader_cannot_generate() {
        std::env::set_var("JWT_SECRET", SECRET);
        let token = mint(Role::Reader);
        let req = Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let caller = AuthCaller::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(matches!(caller.require_supervisor(), Err(AppError::Forbidden(_))));
    }
}
