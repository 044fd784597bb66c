//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod docs;
mod handlers;
mod middleware;
mod models;
mod repo;
mod services;
mod wbr;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

fn build_router(app_state: AppState) -> Router {
    // Páginas e gráficos
    let page_routes = Router::new()
        .route("/page/{page_id}", get(handlers::wbr::load_page))
        .route(
            "/page/{page_id}/session",
            post(handlers::wbr::start_session).get(handlers::wbr::session_snapshot),
        )
        .route("/page/{page_id}/session/refetch", post(handlers::wbr::refetch_session))
        .route("/page/{page_id}/session/events", get(handlers::wbr::session_events))
        .route("/chart/{grafico_id}", get(handlers::wbr::get_chart));

    let filter_routes = Router::new()
        .route("/options", get(handlers::filters::get_options))
        .route("/filtered-options", get(handlers::filters::get_filtered_options))
        .route("/available-dates", get(handlers::filters::get_available_dates))
        .route("/resolve-date", get(handlers::filters::resolve_date))
        .route(
            "/saved",
            get(handlers::filters::get_saved).put(handlers::filters::put_saved),
        )
        .route("/saved/change", post(handlers::filters::change_saved));

    let instagram_routes = Router::new()
        .route("/panel", get(handlers::instagram::get_panel))
        .route("/kpis", get(handlers::instagram::get_kpis))
        .route("/top-posts", get(handlers::instagram::get_top_posts));

    // Tudo em /api/wbr exige o token do usuário
    let wbr_routes = page_routes
        .nest("/filters", filter_routes)
        .nest("/instagram", instagram_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/wbr", wbr_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mapa_do_bosque=info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Sem configuração válida a aplicação não deve subir
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    let addr = app_state.settings.bind_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", addr);
    tracing::info!("📄 Documentação em http://{}/swagger-ui", addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
