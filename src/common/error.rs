// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::wbr::ChartErrorDescriptor,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Falha de comunicação com a API WBR: {0}")]
    UpstreamRequest(#[from] reqwest::Error),

    #[error("API WBR respondeu {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Resposta inválida da API WBR: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Página '{0}' não possui gráficos configurados")]
    EmptyPage(String),

    #[error("Erro ao carregar configuração da página: {0}")]
    ConfigFetch(String),

    #[error("Gráfico indisponível: {}", .0.error)]
    ChartUnavailable(ChartErrorDescriptor),

    #[error("Dataset WBR incompleto, faltando: {0:?}")]
    MalformedDataset(Vec<String>),

    #[error("Nenhum carregamento iniciado para a página")]
    SessionNotStarted,

    #[error("Data inválida: '{0}'")]
    InvalidDate(String),

    #[error("Nenhuma data disponível")]
    NoAvailableDates,

    #[error("Erro ao acessar o armazenamento de filtros: {0}")]
    FilterStore(#[from] std::io::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

/// Erro já pronto para a resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect();
        details.insert(field.to_string(), messages);
    }
    json!(details)
}

impl AppError {
    fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::UpstreamRequest(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            // 401/403 da API WBR são repassados como estão
            AppError::UpstreamStatus { status: 401, .. } => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::UpstreamStatus { status: 403, .. } => (StatusCode::FORBIDDEN, "upstream_status"),
            AppError::UpstreamStatus { status: 404, .. } => (StatusCode::NOT_FOUND, "upstream_status"),
            AppError::UpstreamStatus { .. } => (StatusCode::BAD_GATEWAY, "upstream_status"),
            AppError::Decode(_) => (StatusCode::BAD_GATEWAY, "decode"),
            AppError::EmptyPage(_) => (StatusCode::NOT_FOUND, "empty_page"),
            AppError::ConfigFetch(_) => (StatusCode::BAD_GATEWAY, "config_fetch"),
            AppError::ChartUnavailable(_) => (StatusCode::BAD_GATEWAY, "chart_unavailable"),
            AppError::MalformedDataset(_) => (StatusCode::BAD_GATEWAY, "malformed_dataset"),
            AppError::SessionNotStarted => (StatusCode::CONFLICT, "session_not_started"),
            AppError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "invalid_date"),
            AppError::NoAvailableDates => (StatusCode::NOT_FOUND, "no_available_dates"),
            AppError::FilterStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, "filter_store"),
            AppError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            AppError::UpstreamStatus { status, message } => {
                Some(json!({ "status": status, "message": message }))
            }
            AppError::ConfigFetch(message) => Some(json!(message)),
            AppError::ChartUnavailable(descriptor) => serde_json::to_value(descriptor).ok(),
            AppError::MalformedDataset(missing) => Some(json!({ "faltando": missing })),
            AppError::InvalidDate(input) => Some(json!({ "data": input })),
            _ => None,
        }
    }

    /// Converte para a resposta HTTP no idioma do usuário
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();
        if status.is_server_error() {
            tracing::error!("🔥 {}", self);
        }
        ApiError {
            status,
            error: i18n.translate(locale, key),
            details: self.details(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::new())
            .into_response()
    }
}
