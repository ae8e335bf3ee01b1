use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, HttpMessage,
};

use crate::auth_token::{now_ms, TokenClaims, TokenService};
use crate::error::ApiError;

/// Request header carrying the raw signed token.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Base check shared by all three gates: pull the token off the request,
/// verify signature and expiry, hand back the decoded claims.
fn authenticate(req: &ServiceRequest) -> Result<TokenClaims, ApiError> {
    let token = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingToken)?;

    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| ApiError::Internal("Token service not available".to_string()))?;

    let claims = tokens
        .verify(token, now_ms())
        .map_err(|_| ApiError::InvalidToken)?;

    Ok(claims)
}

/// Authenticated-only gate. Decoded claims are stored in the request
/// extensions so handlers can read the caller's identity via ReqData.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let claims = authenticate(&req)?;
    req.extensions_mut().insert(claims);
    next.call(req).await
}

/// Owner-or-admin gate for routes with an `{id}` path segment: the token
/// subject must match the id, or the caller must be an admin.
pub async fn require_self_or_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let claims = authenticate(&req)?;

    let target = req
        .match_info()
        .get("id")
        .ok_or_else(|| ApiError::Internal("Route has no id parameter".to_string()))?;

    if claims.subject != target && !claims.is_admin {
        return Err(ApiError::Forbidden("You are not allowed").into());
    }

    req.extensions_mut().insert(claims);
    next.call(req).await
}

/// Admin-only gate.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let claims = authenticate(&req)?;

    if !claims.is_admin {
        return Err(ApiError::Forbidden("You are not allowed, only admin").into());
    }

    req.extensions_mut().insert(claims);
    next.call(req).await
}
