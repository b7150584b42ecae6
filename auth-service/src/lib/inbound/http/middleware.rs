use axum::extract::Request;
use axum::extract::State;
use axum::http;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::token::errors::TokenError;
use crate::domain::token::models::VerifiedIdentity;
use crate::domain::token::service::extract_bearer_token;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type carrying the caller's identity in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub VerifiedIdentity);

/// Extension type carrying the bearer token the gate accepted
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Authentication gate.
///
/// Validates the bearer token and attaches the identity to the request. Every
/// failure answers with the same 401 body; the precise kind is only logged.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req).map_err(reject)?;

    let identity = state
        .token_service
        .validate(&token)
        .await
        .map_err(reject)?;

    tracing::debug!(user_id = %identity.user_id, "Request authenticated");
    req.extensions_mut().insert(AuthenticatedUser(identity));
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Result<String, TokenError> {
    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| TokenError::MalformedHeader))
        .transpose()?;

    extract_bearer_token(header).map(str::to_string)
}

fn reject(err: TokenError) -> ApiError {
    if err.is_infrastructure() {
        tracing::error!(error = %err, "Authentication unavailable");
    } else {
        tracing::warn!(error = %err, "Authentication rejected");
    }
    ApiError::Unauthorized("Unauthorized".to_string())
}
