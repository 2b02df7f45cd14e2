// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::user::Role};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject - Stores the User ID (student id for students).
    pub sub: String,
    /// Portal role of the user.
    pub role: Role,
    /// School the user belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// The authenticated caller, built once per request by `auth_middleware`
/// and handed to every school API call.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub school_id: Option<String>,
    /// Raw bearer token, forwarded to the school API.
    pub token: String,
}

impl Session {
    /// School of the caller, or `fallback` when the token carries none.
    ///
    /// A `fallback` naming another school than the token's is refused.
    pub fn school_or(&self, fallback: Option<&str>) -> Result<String, AppError> {
        match (self.school_id.as_deref(), fallback) {
            (Some(own), Some(asked)) if own != asked => Err(AppError::Forbidden(format!(
                "Not allowed to access school {}",
                asked
            ))),
            (Some(own), _) => Ok(own.to_string()),
            (None, Some(asked)) => Ok(asked.to_string()),
            (None, None) => Err(AppError::BadRequest("schoolId is required".to_string())),
        }
    }
}

/// Signs a new JWT for the user.
///
/// Arguments:
/// * `id`: User ID.
/// * `role`: Portal role.
/// * `school_id`: School the user belongs to.
pub fn sign_jwt(
    id: &str,
    role: Role,
    school_id: Option<&str>,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_owned(),
        role,
        school_id: school_id.map(str::to_owned),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects a
/// `Session` into the request extensions. Invalid tokens get 401.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token.to_string(),
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(&token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(Session {
                user_id: claims.sub,
                role: claims.role,
                school_id: claims.school_id,
                token,
            });
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

fn require_role(req: &Request<Body>, role: Role) -> Result<(), StatusCode> {
    let session = req
        .extensions()
        .get::<Session>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if session.role != role {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(&req, Role::Admin)?;
    Ok(next.run(req).await)
}

/// Axum Middleware: Student Authorization.
///
/// Must be used AFTER `auth_middleware`.
pub async fn student_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(&req, Role::Student)?;
    Ok(next.run(req).await)
}
