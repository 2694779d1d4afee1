use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{error::AppError, state::AppState};

pub const AUTH_COOKIE: &str = "auth_token";

/// The authenticated caller, resolved from an `Authorization: Bearer` header
/// or, failing that, the `auth_token` cookie set at login.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            Err(_) => parts
                .extensions
                .get::<Cookies>()
                .and_then(|cookies| cookies.get(AUTH_COOKIE))
                .map(|cookie| cookie.value().to_string())
                .ok_or_else(|| AppError::Unauthorized("Missing credentials".to_string()))?,
        };

        let user = state.accounts.resolve_user(&token).await?;
        Ok(Self {
            id: user.id,
            email: user.email,
        })
    }
}
