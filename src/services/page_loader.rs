// src/services/page_loader.rs

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::{
    models::{
        auth::AuthToken,
        page::{LoadEvent, PageError, PageLoadState},
        wbr::{ChartMeta, ChartRef, UserFilters},
    },
    repo::WbrRepository,
    services::chart_service::ChartService,
};

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Uma carga de página (uma geração)
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub page_id: String,
    pub filters: UserFilters,
    pub token: AuthToken,
    pub generation: u64,
    pub reference_date: NaiveDate,
}

/// Carrega a configuração da página e depois os gráficos em lotes
/// sequenciais, com busca concorrente dentro de cada lote.
#[derive(Clone)]
pub struct PageLoader {
    repo: Arc<dyn WbrRepository>,
    charts: ChartService,
    batch_size: usize,
}

impl PageLoader {
    pub fn new(repo: Arc<dyn WbrRepository>, charts: ChartService, batch_size: usize) -> Self {
        Self {
            repo,
            charts,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Emite os eventos da carga no canal. Quem consome é o dono do estado.
    pub async fn run(&self, request: LoadRequest, events: UnboundedSender<LoadEvent>) {
        let generation = request.generation;
        let emit = |event: LoadEvent| {
            // Receptor fechado = sessão descartada; a carga segue até o fim sem efeito
            let _ = events.send(event);
        };

        info!("📄 Carregando página '{}' (geração {})", request.page_id, generation);
        emit(LoadEvent::Started { generation });

        let config = match self.repo.page_config(&request.page_id, &request.token).await {
            Ok(config) => config,
            Err(e) => {
                error!("🔥 Erro ao carregar configuração da página '{}': {}", request.page_id, e);
                emit(LoadEvent::ConfigFailed { generation, error: PageError::config_fetch(&e) });
                emit(LoadEvent::Finished { generation });
                return;
            }
        };

        let charts: Vec<ChartMeta> = config.graficos.iter().map(ChartRef::meta).collect();
        if charts.is_empty() {
            warn!("⚠️ Página '{}' não possui gráficos configurados", request.page_id);
            emit(LoadEvent::ConfigFailed { generation, error: PageError::empty_page() });
            emit(LoadEvent::Finished { generation });
            return;
        }

        let total = charts.len();
        emit(LoadEvent::ConfigLoaded { generation, charts: charts.clone() });

        let mut processed = 0;
        for (n, batch) in charts.chunks(self.batch_size).enumerate() {
            debug!(
                "Lote {} da página '{}': {:?}",
                n + 1,
                request.page_id,
                batch.iter().map(|c| c.grafico_id.as_str()).collect::<Vec<_>>()
            );

            let request = &request;
            let emit = &emit;
            let fetches = batch.iter().map(|meta| async move {
                let slot = self
                    .charts
                    .fetch_slot(meta, &request.filters, &request.token, request.reference_date)
                    .await;
                emit(LoadEvent::ChartSettled {
                    generation,
                    chart_id: meta.grafico_id.clone(),
                    slot,
                });
            });
            join_all(fetches).await;

            processed += batch.len();
            emit(LoadEvent::BatchSettled {
                generation,
                processed: processed.min(total),
                total,
            });
        }

        emit(LoadEvent::Finished { generation });
        info!(
            "✅ Página '{}' carregada: {} gráficos (geração {})",
            request.page_id, total, generation
        );
    }

    /// Carga completa aplicada a um estado novo
    pub async fn load_to_completion(&self, request: LoadRequest) -> PageLoadState {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = PageLoadState::new(request.page_id.clone());
        state.reset(request.generation, request.filters.clone());

        let drain = async {
            while let Some(event) = rx.recv().await {
                state.apply(event);
            }
        };
        tokio::join!(self.run(request, tx), drain);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::page::{ChartSlot, LoadPhase, PageErrorKind, Progress},
        repo::fake::FakeWbrRepository,
        wbr::format::WeekLabelStyle,
    };
    use std::{sync::atomic::Ordering, time::Duration};

    fn loader(fake: Arc<FakeWbrRepository>) -> PageLoader {
        let repo: Arc<dyn WbrRepository> = fake;
        PageLoader::new(repo.clone(), ChartService::new(repo, WeekLabelStyle::DdMm), DEFAULT_BATCH_SIZE)
    }

    fn request(page_id: &str) -> LoadRequest {
        LoadRequest {
            page_id: page_id.into(),
            filters: UserFilters { data_referencia: Some("2025-08-20".into()), ..Default::default() },
            token: AuthToken::new("t"),
            generation: 1,
            reference_date: NaiveDate::from_ymd_opt(2025, 8, 20).unwrap(),
        }
    }

    fn twelve_ids() -> Vec<String> {
        (1..=12).map(|i| format!("grafico_{i}")).collect()
    }

    #[tokio::test]
    async fn loads_in_sequential_batches_with_isolated_failure() {
        let ids = twelve_ids();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut fake = FakeWbrRepository::with_page("vendas", &id_refs);
        fake.failing_charts.insert("grafico_7".into());
        fake.chart_delay = Duration::from_millis(5);
        let fake = Arc::new(fake);

        let (tx, mut rx) = mpsc::unbounded_channel();
        loader(fake.clone()).run(request("vendas"), tx).await;

        let mut batches = Vec::new();
        let mut state = PageLoadState::new("vendas");
        state.reset(1, UserFilters::default());
        while let Some(event) = rx.recv().await {
            if let LoadEvent::BatchSettled { processed, .. } = &event {
                batches.push(*processed);
            }
            state.apply(event);
        }

        assert_eq!(batches, vec![5, 10, 12]);
        assert_eq!(state.progress, Progress { loaded: 12, total: 12 });
        assert_eq!(state.phase, LoadPhase::ChartsSettled);
        assert_eq!(state.error_count(), 1);
        assert_eq!(state.ready_count(), 11);
        assert!(matches!(state.charts["grafico_7"], ChartSlot::Error(_)));
        assert!(state.loading.values().all(|l| !l));

        // Concorrência limitada ao tamanho do lote
        assert_eq!(fake.max_in_flight.load(Ordering::SeqCst), 5);
        assert_eq!(fake.chart_calls.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn next_batch_starts_after_previous_settles() {
        let ids = twelve_ids();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut fake = FakeWbrRepository::with_page("vendas", &id_refs);
        fake.chart_delay = Duration::from_millis(2);
        let fake = Arc::new(fake);

        loader(fake.clone()).load_to_completion(request("vendas")).await;

        let log = fake.log();
        let position = |entry: String| log.iter().position(|e| *e == entry).unwrap();
        for finished in 1..=5 {
            assert!(position(format!("-grafico_{finished}")) < position("+grafico_6".to_string()));
        }
        for finished in 6..=10 {
            assert!(position(format!("-grafico_{finished}")) < position("+grafico_11".to_string()));
        }
        // Os 5 primeiros gráficos começam juntos
        assert!(log[..5].iter().all(|e| e.starts_with('+')));
    }

    #[tokio::test]
    async fn config_failure_fails_whole_page() {
        let mut fake = FakeWbrRepository::with_page("vendas", &["a"]);
        fake.config_fails = true;
        let fake = Arc::new(fake);

        let state = loader(fake.clone()).load_to_completion(request("vendas")).await;
        assert_eq!(state.phase, LoadPhase::Failed);
        assert_eq!(state.error.unwrap().tipo, PageErrorKind::ConfigFetch);
        assert!(state.charts.is_empty());
        assert_eq!(fake.chart_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_page_is_an_error() {
        let fake = Arc::new(FakeWbrRepository::with_page("vazia", &[]));
        let state = loader(fake).load_to_completion(request("vazia")).await;
        assert_eq!(state.phase, LoadPhase::Failed);
        let error = state.error.unwrap();
        assert_eq!(error.tipo, PageErrorKind::EmptyPage);
        assert_eq!(error.mensagem, "Página não possui gráficos configurados");
    }

    #[tokio::test]
    async fn filters_are_forwarded_to_every_chart() {
        let fake = Arc::new(FakeWbrRepository::with_page("vendas", &["a", "b"]));
        let mut req = request("vendas");
        req.filters.shopping = Some("SIG".into());
        loader(fake.clone()).load_to_completion(req).await;

        let seen = fake.seen_filters.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|f| f.shopping.as_deref() == Some("SIG")));
    }
}
