// src/models/page.rs

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use super::{
    chart::ChartView,
    wbr::{ChartErrorDescriptor, ChartMeta, UserFilters},
};

// Estado de um gráfico dentro da página
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "estado", rename_all = "snake_case")]
pub enum ChartSlot {
    Loading,
    Ready(ChartView),
    Error(ChartErrorDescriptor),
    /// A API respondeu, mas faltam séries obrigatórias
    Malformed { missing: Vec<String> },
}

impl ChartSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, ChartSlot::Ready(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ChartSlot::Error(_) | ChartSlot::Malformed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    #[default]
    Idle,
    FetchingConfig,
    ChartsLoading,
    ChartsSettled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct Progress {
    pub loaded: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorKind {
    ConfigFetch,
    EmptyPage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageError {
    pub tipo: PageErrorKind,
    pub mensagem: String,
}

impl PageError {
    pub fn config_fetch(details: impl std::fmt::Display) -> Self {
        Self {
            tipo: PageErrorKind::ConfigFetch,
            mensagem: format!("Erro ao carregar configuração da página: {details}"),
        }
    }

    pub fn empty_page() -> Self {
        Self {
            tipo: PageErrorKind::EmptyPage,
            mensagem: "Página não possui gráficos configurados".to_string(),
        }
    }
}

/// Eventos emitidos pelo carregador de páginas. Todos carregam a geração
/// da carga que os produziu.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    Started { generation: u64 },
    ConfigLoaded { generation: u64, charts: Vec<ChartMeta> },
    ConfigFailed { generation: u64, error: PageError },
    ChartSettled { generation: u64, chart_id: String, slot: ChartSlot },
    BatchSettled { generation: u64, processed: usize, total: usize },
    Finished { generation: u64 },
}

impl LoadEvent {
    pub fn generation(&self) -> u64 {
        match self {
            LoadEvent::Started { generation }
            | LoadEvent::ConfigLoaded { generation, .. }
            | LoadEvent::ConfigFailed { generation, .. }
            | LoadEvent::ChartSettled { generation, .. }
            | LoadEvent::BatchSettled { generation, .. }
            | LoadEvent::Finished { generation } => *generation,
        }
    }
}

/// Estado de carregamento de uma página WBR
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PageLoadState {
    pub page_id: String,
    pub generation: u64,
    pub phase: LoadPhase,
    pub filters: UserFilters,
    pub chart_ids: Vec<String>,
    pub charts: HashMap<String, ChartSlot>,
    pub loading: HashMap<String, bool>,
    pub progress: Progress,
    pub error: Option<PageError>,
}

impl PageLoadState {
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            ..Default::default()
        }
    }

    /// Descarta tudo e passa a aceitar só eventos da nova geração
    pub fn reset(&mut self, generation: u64, filters: UserFilters) {
        *self = Self {
            page_id: std::mem::take(&mut self.page_id),
            generation,
            filters,
            ..Default::default()
        };
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.phase, LoadPhase::ChartsSettled | LoadPhase::Failed)
    }

    /// Aplica um evento. Retorna `false` quando o evento é de uma geração
    /// anterior e foi ignorado.
    pub fn apply(&mut self, event: LoadEvent) -> bool {
        if event.generation() != self.generation {
            debug!(
                "Evento descartado da geração {} (atual {}) na página '{}'",
                event.generation(),
                self.generation,
                self.page_id
            );
            return false;
        }

        match event {
            LoadEvent::Started { .. } => {
                self.phase = LoadPhase::FetchingConfig;
            }
            LoadEvent::ConfigLoaded { charts, .. } => {
                self.chart_ids = charts.iter().map(|c| c.grafico_id.clone()).collect();
                self.charts = self
                    .chart_ids
                    .iter()
                    .map(|id| (id.clone(), ChartSlot::Loading))
                    .collect();
                self.loading = self.chart_ids.iter().map(|id| (id.clone(), true)).collect();
                self.progress = Progress { loaded: 0, total: self.chart_ids.len() };
                self.phase = LoadPhase::ChartsLoading;
            }
            LoadEvent::ConfigFailed { error, .. } => {
                self.error = Some(error);
                self.phase = LoadPhase::Failed;
            }
            LoadEvent::ChartSettled { chart_id, slot, .. } => {
                self.loading.insert(chart_id.clone(), false);
                self.charts.insert(chart_id, slot);
            }
            LoadEvent::BatchSettled { processed, total, .. } => {
                self.progress = Progress { loaded: processed.min(total), total };
            }
            LoadEvent::Finished { .. } => {
                if self.phase != LoadPhase::Failed {
                    self.phase = LoadPhase::ChartsSettled;
                }
            }
        }
        true
    }

    pub fn ready_count(&self) -> usize {
        self.charts.values().filter(|s| s.is_ready()).count()
    }

    pub fn error_count(&self) -> usize {
        self.charts.values().filter(|s| s.is_error()).count()
    }
}

/// Resposta do início (ou reinício) de uma sessão
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionAccepted {
    pub page_id: String,
    pub generation: u64,
}
