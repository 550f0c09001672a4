use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use serde_json::json;
use validator::Validate;

use super::json_body;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{LoginCredentials, RegisterUser, User};
use crate::repositories::{SessionRepository, UserRepository};
use crate::session::{create_session_cookie, get_session_token, remove_session_cookie};
use crate::validation::FieldErrors;

#[derive(Clone)]
pub struct AuthState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
}

#[derive(Serialize)]
pub struct UserView {
    id: String,
    email: String,
    name: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

impl From<AuthUser> for UserView {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

async fn start_session(state: &AuthState, jar: CookieJar, user: &User) -> Result<CookieJar> {
    let token = state.session_repo.create(&user.id).await?;
    Ok(jar.add(create_session_cookie(&token)))
}

pub async fn register(
    State(state): State<AuthState>,
    jar: CookieJar,
    payload: std::result::Result<Json<RegisterUser>, JsonRejection>,
) -> Result<Response> {
    let form = json_body(payload)?;
    form.validate().map_err(|e| AppError::Validation(e.into()))?;

    if state.user_repo.find_by_email(&form.email).await?.is_some() {
        let mut errors = FieldErrors::new();
        errors.add("email", "An account with this email already exists");
        return Err(AppError::Validation(errors));
    }

    let user = state
        .user_repo
        .create(&form.email, &form.display_name(), &form.password)
        .await?;
    tracing::info!(user_id = %user.id, "Registered new user");

    let jar = start_session(&state, jar, &user).await?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({ "success": true, "user": UserView::from(user) })),
    )
        .into_response())
}

pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    payload: std::result::Result<Json<LoginCredentials>, JsonRejection>,
) -> Result<Response> {
    let credentials = json_body(payload)?;

    let user = state
        .user_repo
        .verify_password(&credentials.email, &credentials.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let jar = start_session(&state, jar, &user).await?;

    Ok((
        jar,
        Json(json!({ "success": true, "user": UserView::from(user) })),
    )
        .into_response())
}

pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> Result<Response> {
    if let Some(token) = get_session_token(&jar) {
        state.session_repo.delete(&token).await?;
    }

    let jar = jar.add(remove_session_cookie());
    Ok((jar, Json(json!({ "success": true }))).into_response())
}

pub async fn me(auth_user: AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "user": UserView::from(auth_user) }))
}
