use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::AppError,
    middleware::{CurrentUser, AUTH_COOKIE},
    models::{CreateUser, LoginRequest, TokenResponse, UserResponse},
    state::AppState,
};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.accounts.register(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = state.accounts.login(payload).await?;

    // Browser clients may rely on the cookie instead of the bearer header
    let ttl = time::Duration::hours(state.accounts.auth_config().token_ttl_hours);
    let cookie = Cookie::build((AUTH_COOKIE, response.access_token.clone()))
        .path("/")
        .http_only(true)
        .max_age(ttl)
        .build();
    cookies.add(cookie);

    Ok(Json(response))
}

pub async fn logout(cookies: Cookies) -> impl IntoResponse {
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
    StatusCode::NO_CONTENT
}

pub async fn delete_account(
    State(state): State<AppState>,
    cookies: Cookies,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    state.accounts.delete_account(user.id).await?;
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
    Ok(StatusCode::NO_CONTENT)
}
