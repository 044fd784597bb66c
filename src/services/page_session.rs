// src/services/page_session.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{Local, NaiveDate};
use tokio::{
    sync::{mpsc, oneshot, watch, Mutex},
    task::JoinHandle,
    time::{sleep, Instant},
};
use tracing::{debug, info};

use crate::{
    common::error::AppError,
    models::{
        auth::AuthToken,
        page::{LoadEvent, PageLoadState},
        wbr::UserFilters,
    },
    services::page_loader::{LoadRequest, PageLoader},
};

const COMMAND_BUFFER: usize = 16;
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(300);

/// Data de referência dos KPIs: a do filtro ou hoje
pub fn resolve_reference_date(filters: &UserFilters) -> NaiveDate {
    filters
        .reference_date()
        .unwrap_or_else(|| Local::now().date_naive())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user: String,
    pub page_id: String,
}

impl SessionKey {
    pub fn new(token: &AuthToken, page_id: &str) -> Self {
        Self {
            user: token.fingerprint(),
            page_id: page_id.to_string(),
        }
    }
}

enum SessionCommand {
    Load {
        filters: UserFilters,
        token: AuthToken,
        reply: oneshot::Sender<u64>,
    },
    Refetch {
        token: AuthToken,
        reply: oneshot::Sender<Result<u64, AppError>>,
    },
}

/// Acesso à sessão de uma página. O estado só é alterado pela task da sessão.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<PageLoadState>,
}

fn session_closed() -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("sessão da página encerrada"))
}

impl SessionHandle {
    /// Inicia (ou reinicia) a carga com os filtros; devolve a geração ativa
    pub async fn load(&self, filters: UserFilters, token: AuthToken) -> Result<u64, AppError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Load { filters, token, reply })
            .await
            .map_err(|_| session_closed())?;
        rx.await.map_err(|_| session_closed())
    }

    pub async fn refetch(&self, token: AuthToken) -> Result<u64, AppError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Refetch { token, reply })
            .await
            .map_err(|_| session_closed())?;
        rx.await.map_err(|_| session_closed())?
    }

    pub fn snapshot(&self) -> PageLoadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageLoadState> {
        self.state.clone()
    }

    fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

struct SessionActor {
    loader: PageLoader,
    state: PageLoadState,
    publisher: watch::Sender<PageLoadState>,
    commands: mpsc::Receiver<SessionCommand>,
    events_tx: mpsc::UnboundedSender<LoadEvent>,
    events_rx: mpsc::UnboundedReceiver<LoadEvent>,
    current: Option<JoinHandle<()>>,
    next_generation: u64,
    idle_ttl: Duration,
}

impl SessionActor {
    fn spawn(page_id: &str, loader: PageLoader, idle_ttl: Duration) -> SessionHandle {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let state = PageLoadState::new(page_id);
        let (publisher, state_rx) = watch::channel(state.clone());

        let actor = SessionActor {
            loader,
            state,
            publisher,
            commands,
            events_tx,
            events_rx,
            current: None,
            next_generation: 1,
            idle_ttl,
        };
        tokio::spawn(actor.run());

        SessionHandle {
            commands: commands_tx,
            state: state_rx,
        }
    }

    async fn run(mut self) {
        let idle = sleep(self.idle_ttl);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(event) = self.events_rx.recv() => {
                    let finished = matches!(event, LoadEvent::Finished { .. });
                    if self.state.apply(event) {
                        self.publish();
                        if finished {
                            info!(
                                "✅ Sessão da página '{}' (geração {}): {} gráficos prontos, {} com erro",
                                self.state.page_id,
                                self.state.generation,
                                self.state.ready_count(),
                                self.state.error_count()
                            );
                        }
                    }
                }
                () = &mut idle => {
                    if self.is_abandoned() {
                        debug!("Sessão da página '{}' ociosa; descartando estado", self.state.page_id);
                        break;
                    }
                }
            }
            idle.as_mut().reset(Instant::now() + self.idle_ttl);
        }

        // Sessão descartada ou todos os handles foram soltos
        if let Some(current) = self.current.take() {
            current.abort();
        }
        debug!("Sessão da página '{}' encerrada", self.state.page_id);
    }

    // Nada em carga e ninguém além do registro observando o estado
    fn is_abandoned(&self) -> bool {
        let quiet = self.state.generation == 0 || self.state.is_settled();
        quiet && self.publisher.receiver_count() <= 1
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Load { filters, token, reply } => {
                let filters = filters.normalized();
                // Geração ainda em curso (mesmo antes do evento Started chegar)
                let running = self.state.generation > 0 && !self.state.is_settled();
                if running && self.state.filters == filters {
                    debug!(
                        "Filtros iguais durante a carga da página '{}'; nada a fazer",
                        self.state.page_id
                    );
                    let _ = reply.send(self.state.generation);
                    return;
                }
                let generation = self.start_load(filters, token);
                let _ = reply.send(generation);
            }
            SessionCommand::Refetch { token, reply } => {
                if self.state.generation == 0 {
                    let _ = reply.send(Err(AppError::SessionNotStarted));
                    return;
                }
                let filters = self.state.filters.clone();
                let generation = self.start_load(filters, token);
                let _ = reply.send(Ok(generation));
            }
        }
    }

    fn start_load(&mut self, filters: UserFilters, token: AuthToken) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;

        // A carga anterior é interrompida; eventos atrasados dela são descartados pela geração
        if let Some(previous) = self.current.take() {
            previous.abort();
        }

        info!(
            "🔄 Reiniciando página '{}' na geração {} com filtros [{}]",
            self.state.page_id,
            generation,
            filters.cache_key()
        );
        self.state.reset(generation, filters.clone());
        self.publish();

        let request = LoadRequest {
            page_id: self.state.page_id.clone(),
            reference_date: resolve_reference_date(&filters),
            filters,
            token,
            generation,
        };
        let loader = self.loader.clone();
        let events = self.events_tx.clone();
        self.current = Some(tokio::spawn(async move {
            loader.run(request, events).await;
        }));
        generation
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

/// Uma sessão por (usuário, página). Sessões ociosas se encerram sozinhas
/// e saem do mapa na próxima consulta.
#[derive(Clone)]
pub struct SessionRegistry {
    loader: PageLoader,
    idle_ttl: Duration,
    sessions: Arc<Mutex<HashMap<SessionKey, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new(loader: PageLoader, idle_ttl: Duration) -> Self {
        Self {
            loader,
            idle_ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Sessão existente ou uma nova (Idle) para o usuário e a página
    pub async fn session(&self, token: &AuthToken, page_id: &str) -> SessionHandle {
        let key = SessionKey::new(token, page_id);
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, handle| !handle.is_closed());

        if let Some(handle) = sessions.get(&key) {
            return handle.clone();
        }
        let handle = SessionActor::spawn(page_id, self.loader.clone(), self.idle_ttl);
        sessions.insert(key, handle.clone());
        debug!("Nova sessão para a página '{}' ({} ativas)", page_id, sessions.len());
        handle
    }

    pub async fn existing(&self, token: &AuthToken, page_id: &str) -> Option<SessionHandle> {
        let key = SessionKey::new(token, page_id);
        let mut sessions = self.sessions.lock().await;
        let handle = sessions.get(&key).cloned()?;
        if handle.is_closed() {
            sessions.remove(&key);
            return None;
        }
        Some(handle)
    }

    #[cfg(test)]
    pub async fn active_sessions(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, handle| !handle.is_closed());
        sessions.len()
    }
}
