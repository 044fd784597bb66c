// src/handlers/filters.rs

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
        filters::{AvailableDates, CascadeQuery, FilterChange, FilterOptions, FilteredOptions, ResolveDateQuery, ResolvedDate},
        wbr::UserFilters,
    },
};

// GET /api/wbr/filters/options
#[utoipa::path(
    get,
    path = "/api/wbr/filters/options",
    tag = "Filtros",
    responses(
        (status = 200, description = "Datas, shoppings, ramos, categorias e lojas", body = FilterOptions)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn get_options(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
) -> Result<impl IntoResponse, ApiError> {
    let options = app_state
        .filter_service
        .options(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(options)))
}

// GET /api/wbr/filters/filtered-options
#[utoipa::path(
    get,
    path = "/api/wbr/filters/filtered-options",
    tag = "Filtros",
    params(CascadeQuery),
    responses(
        (status = 200, description = "Opções dependentes do shopping/ramo/categoria escolhidos", body = FilteredOptions)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn get_filtered_options(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Query(query): Query<CascadeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let options = app_state
        .filter_service
        .filtered_options(&query, &token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(options)))
}

// GET /api/wbr/filters/available-dates
#[utoipa::path(
    get,
    path = "/api/wbr/filters/available-dates",
    tag = "Filtros",
    responses(
        (status = 200, description = "Datas com dados, da mais recente para a mais antiga", body = AvailableDates)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn get_available_dates(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
) -> Result<impl IntoResponse, ApiError> {
    let dates = app_state
        .filter_service
        .available_dates(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(dates)))
}

// GET /api/wbr/filters/resolve-date?data=
#[utoipa::path(
    get,
    path = "/api/wbr/filters/resolve-date",
    tag = "Filtros",
    params(ResolveDateQuery),
    responses(
        (status = 200, description = "Data interpretada e encaixada na data disponível mais próxima", body = ResolvedDate),
        (status = 400, description = "Data inválida"),
        (status = 404, description = "Nenhuma data disponível")
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn resolve_date(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Query(query): Query<ResolveDateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let resolved = app_state
        .filter_service
        .resolve_date(&query.data, &token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(resolved)))
}

// GET /api/wbr/filters/saved
#[utoipa::path(
    get,
    path = "/api/wbr/filters/saved",
    tag = "Filtros",
    responses(
        (status = 200, description = "Últimos filtros usados (null se nunca salvos)", body = Option<UserFilters>)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn get_saved(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
) -> Result<impl IntoResponse, ApiError> {
    let saved = app_state
        .filter_service
        .saved(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(saved)))
}

// PUT /api/wbr/filters/saved
#[utoipa::path(
    put,
    path = "/api/wbr/filters/saved",
    tag = "Filtros",
    request_body = UserFilters,
    responses(
        (status = 200, description = "Filtros gravados", body = UserFilters),
        (status = 400, description = "Filtros inválidos")
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn put_saved(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Json(payload): Json<UserFilters>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let saved = app_state
        .filter_service
        .save(&token, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(saved)))
}

// POST /api/wbr/filters/saved/change
#[utoipa::path(
    post,
    path = "/api/wbr/filters/saved/change",
    tag = "Filtros",
    request_body = FilterChange,
    responses(
        (status = 200, description = "Filtros após a mudança, com os dependentes limpos", body = UserFilters)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn change_saved(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Json(change): Json<FilterChange>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .filter_service
        .apply_change(&token, &change)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}
