// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::wbr;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- WBR ---
        handlers::wbr::load_page,
        handlers::wbr::start_session,
        handlers::wbr::refetch_session,
        handlers::wbr::session_snapshot,
        handlers::wbr::session_events,
        handlers::wbr::get_chart,

        // --- Filtros ---
        handlers::filters::get_options,
        handlers::filters::get_filtered_options,
        handlers::filters::get_available_dates,
        handlers::filters::resolve_date,
        handlers::filters::get_saved,
        handlers::filters::put_saved,
        handlers::filters::change_saved,

        // --- Instagram ---
        handlers::instagram::get_panel,
        handlers::instagram::get_kpis,
        handlers::instagram::get_top_posts,
    ),
    components(
        schemas(
            // --- Página ---
            models::page::PageLoadState,
            models::page::LoadPhase,
            models::page::Progress,
            models::page::ChartSlot,
            models::page::PageError,
            models::page::PageErrorKind,
            models::page::SessionAccepted,

            // --- Gráfico ---
            models::chart::ChartView,
            models::chart::ChartSpec,
            models::chart::LineSeries,
            models::chart::Overlay,
            models::chart::KpiCell,
            wbr::kpi::KpiSet,
            wbr::format::ValueFormat,
            models::wbr::ChartErrorDescriptor,

            // --- Filtros ---
            models::wbr::UserFilters,
            models::wbr::ChartDisplayQuery,
            models::wbr::FilterField,
            models::filters::FilterOptions,
            models::filters::FilteredOptions,
            models::filters::ShoppingOption,
            models::filters::AvailableDates,
            models::filters::ResolvedDate,
            models::filters::FilterChange,

            // --- Instagram ---
            models::instagram::InstagramPanel,
            models::instagram::InstagramKpis,
            models::instagram::InstagramFollowers,
            models::instagram::InstagramEngagement,
            models::instagram::InstagramTopPost,
        )
    ),
    tags(
        (name = "WBR", description = "Páginas e gráficos WBR (semanas e meses, CY x PY)"),
        (name = "Filtros", description = "Opções, datas disponíveis e filtros salvos"),
        (name = "Instagram", description = "Painel de KPIs e top posts do Instagram")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        // "Authorization: Token <token>" (também aceita Bearer)
        components.add_security_scheme(
            "api_token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
        );
    }
}
