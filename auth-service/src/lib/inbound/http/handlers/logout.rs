use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::middleware::BearerToken;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<ApiSuccess<LogoutResponseData>, ApiError> {
    state.user_service.logout(&token).await?;
    tracing::info!(user_id = %identity.user_id, "User logged out");

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LogoutResponseData {
            message: "Logged out".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutResponseData {
    pub message: String,
}
