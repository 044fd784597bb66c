// src/handlers/wbr.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        auth::AuthToken,
        chart::ChartView,
        page::{PageErrorKind, PageLoadState, SessionAccepted},
        wbr::{ChartDisplayQuery, ChartMeta, UserFilters},
    },
    services::{page_loader::LoadRequest, page_session::resolve_reference_date},
};

fn page_failure(state: &PageLoadState) -> Option<AppError> {
    let error = state.error.as_ref()?;
    Some(match error.tipo {
        PageErrorKind::EmptyPage => AppError::EmptyPage(state.page_id.clone()),
        PageErrorKind::ConfigFetch => AppError::ConfigFetch(error.mensagem.clone()),
    })
}

// GET /api/wbr/page/{page_id}
#[utoipa::path(
    get,
    path = "/api/wbr/page/{page_id}",
    tag = "WBR",
    params(
        ("page_id" = String, Path, description = "ID da página"),
        UserFilters
    ),
    responses(
        (status = 200, description = "Página carregada com todos os gráficos resolvidos", body = PageLoadState),
        (status = 401, description = "Token ausente"),
        (status = 404, description = "Página sem gráficos"),
        (status = 502, description = "Configuração da página indisponível")
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn load_page(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Path(page_id): Path<String>,
    Query(filters): Query<UserFilters>,
) -> Result<impl IntoResponse, ApiError> {
    filters
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let filters = filters.normalized();
    let request = LoadRequest {
        page_id,
        reference_date: resolve_reference_date(&filters),
        filters,
        token,
        generation: 1,
    };
    let state = app_state.page_loader.load_to_completion(request).await;

    if let Some(err) = page_failure(&state) {
        return Err(err.to_api_error(&locale, &app_state.i18n_store));
    }
    Ok((StatusCode::OK, Json(state)))
}

// POST /api/wbr/page/{page_id}/session
#[utoipa::path(
    post,
    path = "/api/wbr/page/{page_id}/session",
    tag = "WBR",
    params(("page_id" = String, Path, description = "ID da página")),
    request_body = UserFilters,
    responses(
        (status = 202, description = "Carga iniciada (ou já em andamento com os mesmos filtros)", body = SessionAccepted),
        (status = 400, description = "Filtros inválidos")
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn start_session(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Path(page_id): Path<String>,
    Json(filters): Json<UserFilters>,
) -> Result<impl IntoResponse, ApiError> {
    filters
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let session = app_state.sessions.session(&token, &page_id).await;
    let generation = session
        .load(filters, token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::ACCEPTED, Json(SessionAccepted { page_id, generation })))
}

// POST /api/wbr/page/{page_id}/session/refetch
#[utoipa::path(
    post,
    path = "/api/wbr/page/{page_id}/session/refetch",
    tag = "WBR",
    params(("page_id" = String, Path, description = "ID da página")),
    responses(
        (status = 202, description = "Recarga iniciada com os filtros atuais", body = SessionAccepted),
        (status = 409, description = "Nenhuma carga anterior")
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn refetch_session(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Path(page_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .sessions
        .existing(&token, &page_id)
        .await
        .ok_or_else(|| AppError::SessionNotStarted.to_api_error(&locale, &app_state.i18n_store))?;

    let generation = session
        .refetch(token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::ACCEPTED, Json(SessionAccepted { page_id, generation })))
}

// GET /api/wbr/page/{page_id}/session
#[utoipa::path(
    get,
    path = "/api/wbr/page/{page_id}/session",
    tag = "WBR",
    params(("page_id" = String, Path, description = "ID da página")),
    responses(
        (status = 200, description = "Estado atual da sessão (Idle se nunca carregada)", body = PageLoadState)
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn session_snapshot(
    State(app_state): State<AppState>,
    token: AuthToken,
    Path(page_id): Path<String>,
) -> impl IntoResponse {
    let state = match app_state.sessions.existing(&token, &page_id).await {
        Some(session) => session.snapshot(),
        None => PageLoadState::new(page_id),
    };
    (StatusCode::OK, Json(state))
}

// GET /api/wbr/page/{page_id}/session/events
#[utoipa::path(
    get,
    path = "/api/wbr/page/{page_id}/session/events",
    tag = "WBR",
    params(("page_id" = String, Path, description = "ID da página")),
    responses(
        (status = 200, description = "Stream SSE com o estado da página a cada mudança (sem sessão, só o estado Idle)", content_type = "text/event-stream")
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn session_events(
    State(app_state): State<AppState>,
    token: AuthToken,
    Path(page_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    // Sem sessão não se cria uma: o stream envia o estado Idle e termina
    let receiver = match app_state.sessions.existing(&token, &page_id).await {
        Some(session) => session.subscribe(),
        None => watch::channel(PageLoadState::new(page_id)).1,
    };

    // O primeiro evento é o estado atual; depois, um por mudança
    let stream = WatchStream::new(receiver).map(|state| {
        Event::default()
            .event("estado")
            .id(state.generation.to_string())
            .json_data(&state)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// GET /api/wbr/chart/{grafico_id}
#[utoipa::path(
    get,
    path = "/api/wbr/chart/{grafico_id}",
    tag = "WBR",
    params(
        ("grafico_id" = String, Path, description = "ID do gráfico"),
        UserFilters,
        ChartDisplayQuery
    ),
    responses(
        (status = 200, description = "Gráfico montado com KPIs", body = ChartView),
        (status = 400, description = "Filtros ou metadados inválidos"),
        (status = 502, description = "Gráfico indisponível ou dataset incompleto")
    ),
    security(
        ("api_token" = [])
    )
)]
pub async fn get_chart(
    State(app_state): State<AppState>,
    locale: Locale,
    token: AuthToken,
    Path(grafico_id): Path<String>,
    Query(filters): Query<UserFilters>,
    Query(display): Query<ChartDisplayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    filters
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    display
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let filters = filters.normalized();
    let meta = ChartMeta::with_overrides(&grafico_id, display.titulo, display.unidade, display.rgm);
    let view = app_state
        .chart_service
        .fetch_view(
            &meta,
            &filters,
            &token,
            resolve_reference_date(&filters),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(view)))
}
