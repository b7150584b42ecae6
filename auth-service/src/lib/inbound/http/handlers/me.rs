use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiSuccess;
use crate::domain::token::models::VerifiedIdentity;
use crate::inbound::http::middleware::AuthenticatedUser;

/// Identity of the caller, as established by the authentication gate.
pub async fn me(
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> ApiSuccess<IdentityData> {
    ApiSuccess::new(StatusCode::OK, (&identity).into())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityData {
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

impl From<&VerifiedIdentity> for IdentityData {
    fn from(identity: &VerifiedIdentity) -> Self {
        Self {
            user_id: identity.user_id.0,
            email: identity.email.clone(),
            role: identity.role.clone(),
        }
    }
}
