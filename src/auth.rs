use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    username: String,
    email: String,
    exp: i64,
    iat: i64,
}

/// Identity resolved from a validated bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

/// Validates and issues HS256 bearer tokens.
#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_secret: String,
    debug: bool,
}

impl AuthService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone(),
            debug: settings.debug,
        }
    }

    /// Validate a JWT and return the embedded user info.
    ///
    /// In debug mode the literal token `dev-token` resolves to a fixed
    /// development user so the service can be exercised without issuing
    /// real tokens.
    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        if self.debug && token == "dev-token" {
            return Ok(AuthenticatedUser {
                user_id: "dev-user-123".to_string(),
                username: "dev_user".to_string(),
                email: "dev@example.com".to_string(),
            });
        }

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            debug!("token validation failed: {e}");
            ApiError::Unauthorized("invalid authentication credentials".to_string())
        })?;

        Ok(AuthenticatedUser {
            user_id: data.claims.user_id,
            username: data.claims.username,
            email: data.claims.email,
        })
    }

    /// Create a JWT for a user, used by the `token` CLI subcommand and tests.
    pub fn create_token(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
        ttl_hours: i64,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ttl_hours)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = bearer_token(req).and_then(|token| {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| ApiError::Internal("application state missing".to_string()))?;
            state.auth.validate_token(&token)
        });
        ready(result)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    match header_value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::Unauthorized("missing bearer token".to_string())),
    }
}
