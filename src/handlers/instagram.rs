// src/handlers/instagram.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        auth::AuthToken,
        instagram::{InstagramKpis, InstagramPanel, InstagramQuery, InstagramTopPost},
    },
};

// GET /api/wbr/instagram/panel
#[utoipa::path(
    get,
    path = "/api/wbr/instagram/panel",
    tag = "Instagram",
    params(InstagramQuery),
    responses(
        (status = 200, description = "KPIs e top posts; cada widget traz o próprio erro", body = InstagramPanel)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn get_panel(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Query(query): Query<InstagramQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let panel = app_state.instagram_service.panel(&query, &token).await;
    Ok((StatusCode::OK, Json(panel)))
}

// GET /api/wbr/instagram/kpis
#[utoipa::path(
    get,
    path = "/api/wbr/instagram/kpis",
    tag = "Instagram",
    params(InstagramQuery),
    responses(
        (status = 200, description = "Seguidores e engajamento", body = InstagramKpis)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn get_kpis(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Query(query): Query<InstagramQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kpis = app_state
        .instagram_service
        .kpis(&query, &token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(kpis)))
}

// GET /api/wbr/instagram/top-posts
#[utoipa::path(
    get,
    path = "/api/wbr/instagram/top-posts",
    tag = "Instagram",
    params(InstagramQuery),
    responses(
        (status = 200, description = "Posts com mais engajamento (3 por padrão)", body = Vec<InstagramTopPost>)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn get_top_posts(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Query(query): Query<InstagramQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let posts = app_state
        .instagram_service
        .top_posts(&query, &token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(posts)))
}
