// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context};

use crate::{
    common::i18n::I18nStore,
    repo::{FilterStore, HttpWbrRepository, InMemoryFilterStore, JsonFileFilterStore, WbrRepository},
    services::{
        chart_service::ChartService,
        filter_service::FilterService,
        instagram_service::InstagramService,
        page_loader::{PageLoader, DEFAULT_BATCH_SIZE},
        page_session::{SessionRegistry, DEFAULT_SESSION_IDLE_TTL},
    },
    wbr::format::WeekLabelStyle,
};

const DEFAULT_WBR_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub wbr_api_url: String,
    pub bind_addr: String,
    pub batch_size: usize,
    pub upstream_timeout: Duration,
    /// Sem caminho os filtros ficam só em memória
    pub filter_store_path: Option<PathBuf>,
    pub week_labels: WeekLabelStyle,
    /// Tempo sem atividade até a sessão de uma página ser descartada
    pub session_idle_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Lê as variáveis por uma função de busca (o ambiente, ou um mapa nos testes)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let wbr_api_url = var("WBR_API_URL").unwrap_or_else(|| DEFAULT_WBR_API_URL.to_string());
        if !wbr_api_url.starts_with("http://") && !wbr_api_url.starts_with("https://") {
            bail!("WBR_API_URL deve começar com http:// ou https:// (recebido '{wbr_api_url}')");
        }

        let batch_size = match var("WBR_BATCH_SIZE") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("WBR_BATCH_SIZE inválido: '{raw}'"))?,
            None => DEFAULT_BATCH_SIZE,
        };
        if batch_size == 0 {
            bail!("WBR_BATCH_SIZE deve ser maior que zero");
        }

        let timeout_secs = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("UPSTREAM_TIMEOUT_SECS inválido: '{raw}'"))?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        let session_idle_ttl = match var("SESSION_IDLE_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("SESSION_IDLE_SECS inválido: '{raw}'"))?,
            ),
            None => DEFAULT_SESSION_IDLE_TTL,
        };
        if session_idle_ttl.is_zero() {
            bail!("SESSION_IDLE_SECS deve ser maior que zero");
        }

        let week_labels = match var("WBR_WEEK_LABELS").as_deref() {
            None | Some("ddmm") => WeekLabelStyle::DdMm,
            Some("iso") => WeekLabelStyle::IsoWeek,
            Some(other) => bail!("WBR_WEEK_LABELS deve ser 'ddmm' ou 'iso' (recebido '{other}')"),
        };

        Ok(Self {
            wbr_api_url,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            batch_size,
            upstream_timeout: Duration::from_secs(timeout_secs),
            filter_store_path: var("FILTER_STORE_PATH").map(PathBuf::from),
            week_labels,
            session_idle_ttl,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub chart_service: ChartService,
    pub page_loader: PageLoader,
    pub sessions: SessionRegistry,
    pub filter_service: FilterService,
    pub instagram_service: InstagramService,
    pub i18n_store: Arc<I18nStore>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Settings::from_env()?;
        let repo = HttpWbrRepository::new(&settings.wbr_api_url, settings.upstream_timeout)?;
        tracing::info!("🔗 API WBR configurada em {}", settings.wbr_api_url);

        let store: Arc<dyn FilterStore> = match &settings.filter_store_path {
            Some(path) => {
                tracing::info!("✅ Filtros salvos em {}", path.display());
                Arc::new(JsonFileFilterStore::new(path))
            }
            None => {
                tracing::warn!("⚠️ FILTER_STORE_PATH não definido; filtros ficam só em memória");
                Arc::new(InMemoryFilterStore::new())
            }
        };

        let state = Self::from_parts(settings, Arc::new(repo), store);
        tracing::info!("📄 Gráficos carregados em lotes de {}", state.page_loader.batch_size());
        Ok(state)
    }

    /// Monta o grafo de dependências a partir do repositório e do armazenamento
    pub fn from_parts(settings: Settings, repo: Arc<dyn WbrRepository>, store: Arc<dyn FilterStore>) -> Self {
        let chart_service = ChartService::new(repo.clone(), settings.week_labels);
        let page_loader = PageLoader::new(repo.clone(), chart_service.clone(), settings.batch_size);

        Self {
            sessions: SessionRegistry::new(page_loader.clone(), settings.session_idle_ttl),
            filter_service: FilterService::new(repo.clone(), store),
            instagram_service: InstagramService::new(repo),
            chart_service,
            page_loader,
            settings: Arc::new(settings),
            i18n_store: Arc::new(I18nStore::new()),
        }
    }
}
