use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::auth_dto::{
        AuthResponse, ChangePasswordPayload, LoginPayload, MessageResponse, ProfileResponse,
        RegisterPayload, SummaryResponse, UpdateProfilePayload, UserProfile, UserSummary,
    },
    error::Result,
    middleware::auth::AuthUser,
    routes::{extract::AppJson, files_named},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created", body = Json<AuthResponse>),
        (status = 400, description = "Invalid payload or email already registered")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterPayload>,
) -> Result<impl IntoResponse> {
    let (token, user) = state.auth_service.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Logged in", body = Json<AuthResponse>),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<impl IntoResponse> {
    let (token, user) = state.auth_service.login(payload).await?;
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user profile", body = Json<ProfileResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.current_user(caller.id).await?;
    Ok(Json(ProfileResponse::new(UserProfile::from(user))))
}

#[utoipa::path(
    put,
    path = "/api/auth/update",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated", body = Json<SummaryResponse>),
        (status = 400, description = "Invalid payload or email in use")
    )
)]
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppJson(payload): AppJson<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.update_profile(caller.id, payload).await?;
    Ok(Json(SummaryResponse::new(UserSummary::from(user))))
}

#[utoipa::path(
    put,
    path = "/api/auth/update-password",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Password changed", body = Json<MessageResponse>),
        (status = 401, description = "Current password is incorrect")
    )
)]
#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppJson(payload): AppJson<ChangePasswordPayload>,
) -> Result<impl IntoResponse> {
    state.auth_service.change_password(caller.id, payload).await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

#[utoipa::path(
    put,
    path = "/api/auth/update-image",
    responses(
        (status = 200, description = "Profile image replaced", body = Json<SummaryResponse>),
        (status = 400, description = "No image uploaded")
    )
)]
#[axum::debug_handler]
pub async fn update_image(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let image = files_named(multipart, "profileImage").await?.into_iter().next();
    let user = state
        .auth_service
        .update_profile_image(caller.id, image)
        .await?;
    Ok(Json(SummaryResponse::new(UserSummary::from(user))))
}

#[utoipa::path(
    delete,
    path = "/api/auth/delete",
    responses(
        (status = 200, description = "Account and its cars deleted", body = Json<MessageResponse>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    state.auth_service.delete_account(caller.id).await?;
    Ok(Json(MessageResponse::new(
        "User and all associated cars deleted successfully",
    )))
}

#[axum::debug_handler]
pub async fn logout(Extension(caller): Extension<AuthUser>) -> impl IntoResponse {
    tracing::debug!(user_id = %caller.id, "Logout");
    Json(MessageResponse::new("Logged out successfully"))
}
