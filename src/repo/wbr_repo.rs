// src/repo/wbr_repo.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    common::error::AppError,
    models::{
        auth::AuthToken,
        filters::{CascadeQuery, FilterOptions, FilteredOptions, UpstreamDates},
        instagram::{InstagramKpis, InstagramTopPost, TopPostsResponse},
        wbr::{ChartPayload, PageConfig, UserFilters},
    },
};

/// Acesso à API WBR. Toda chamada repassa o token do usuário.
#[async_trait]
pub trait WbrRepository: Send + Sync {
    async fn page_config(&self, page_id: &str, token: &AuthToken) -> Result<PageConfig, AppError>;

    async fn chart(
        &self,
        grafico_id: &str,
        filters: &UserFilters,
        token: &AuthToken,
    ) -> Result<ChartPayload, AppError>;

    async fn filter_options(&self, token: &AuthToken) -> Result<FilterOptions, AppError>;

    async fn filtered_options(
        &self,
        query: &CascadeQuery,
        token: &AuthToken,
    ) -> Result<FilteredOptions, AppError>;

    /// Datas disponíveis (AAAA-MM-DD), da mais recente para a mais antiga
    async fn available_dates(&self, token: &AuthToken) -> Result<Vec<String>, AppError>;

    async fn instagram_kpis(
        &self,
        data_referencia: Option<&str>,
        shopping: Option<&str>,
        token: &AuthToken,
    ) -> Result<InstagramKpis, AppError>;

    async fn instagram_top_posts(
        &self,
        data_referencia: Option<&str>,
        shopping: Option<&str>,
        limit: u32,
        token: &AuthToken,
    ) -> Result<Vec<InstagramTopPost>, AppError>;
}

#[derive(Clone)]
pub struct HttpWbrRepository {
    client: Client,
    base_url: String,
}

// Resposta crua: status + corpo já como JSON (Null se vazio ou não-JSON)
struct RawResponse {
    status: u16,
    body: Value,
    text: String,
}

impl RawResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn into_status_error(self) -> AppError {
        let message = self
            .body
            .get("error")
            .or_else(|| self.body.get("detail"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(self.text);
        AppError::UpstreamStatus {
            status: self.status,
            message,
        }
    }
}

fn optional_pairs(pairs: &[(&'static str, Option<&str>)]) -> Vec<(&'static str, String)> {
    pairs
        .iter()
        .filter_map(|&(k, v)| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (k, s.to_string()))
        })
        .collect()
}

impl HttpWbrRepository {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_raw(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        token: &AuthToken,
    ) -> Result<RawResponse, AppError> {
        let url = self.url(path);
        debug!("🔗 GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(RawResponse { status, body, text })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        token: &AuthToken,
    ) -> Result<T, AppError> {
        let raw = self.get_raw(path, query, token).await?;
        if !raw.is_success() {
            warn!("⚠️ API WBR respondeu {} em {}", raw.status, path);
            return Err(raw.into_status_error());
        }
        Ok(serde_json::from_value(raw.body)?)
    }
}

#[async_trait]
impl WbrRepository for HttpWbrRepository {
    async fn page_config(&self, page_id: &str, token: &AuthToken) -> Result<PageConfig, AppError> {
        self.get_json(&format!("wbr/page/{page_id}/config/"), &[], token)
            .await
    }

    async fn chart(
        &self,
        grafico_id: &str,
        filters: &UserFilters,
        token: &AuthToken,
    ) -> Result<ChartPayload, AppError> {
        let raw = self
            .get_raw(&format!("wbr/{grafico_id}/"), &filters.query_pairs(), token)
            .await?;

        // Erros de gráfico vêm como {error, status} e viram erro do gráfico
        if raw.is_success() || raw.body.get("error").is_some() {
            return Ok(ChartPayload::from_value(raw.body));
        }
        Err(raw.into_status_error())
    }

    async fn filter_options(&self, token: &AuthToken) -> Result<FilterOptions, AppError> {
        self.get_json("wbr/filters/options/", &[], token).await
    }

    async fn filtered_options(
        &self,
        query: &CascadeQuery,
        token: &AuthToken,
    ) -> Result<FilteredOptions, AppError> {
        self.get_json("wbr/filters/filtered-options/", &query.query_pairs(), token)
            .await
    }

    async fn available_dates(&self, token: &AuthToken) -> Result<Vec<String>, AppError> {
        let dates: UpstreamDates = self
            .get_json("wbr/filters/available-dates/", &[], token)
            .await?;
        Ok(dates.dates)
    }

    async fn instagram_kpis(
        &self,
        data_referencia: Option<&str>,
        shopping: Option<&str>,
        token: &AuthToken,
    ) -> Result<InstagramKpis, AppError> {
        let query = optional_pairs(&[("data_referencia", data_referencia), ("shopping", shopping)]);
        self.get_json("wbr/instagram/kpis/", &query, token).await
    }

    async fn instagram_top_posts(
        &self,
        data_referencia: Option<&str>,
        shopping: Option<&str>,
        limit: u32,
        token: &AuthToken,
    ) -> Result<Vec<InstagramTopPost>, AppError> {
        let mut query = optional_pairs(&[("data_referencia", data_referencia), ("shopping", shopping)]);
        query.push(("limit", limit.to_string()));
        let response: TopPostsResponse = self
            .get_json("wbr/instagram/top-posts/", &query, token)
            .await?;
        Ok(response.posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_urls_without_double_slashes() {
        let repo = HttpWbrRepository::with_client(Client::new(), "http://localhost:8000/api/");
        assert_eq!(repo.url("wbr/vendas/"), "http://localhost:8000/api/wbr/vendas/");
        assert_eq!(repo.url("/wbr/filters/options/"), "http://localhost:8000/api/wbr/filters/options/");
    }

    #[test]
    fn status_error_prefers_error_field() {
        let raw = RawResponse {
            status: 500,
            body: json!({"error": "Falha no Athena", "error_type": "QueryExecutionException"}),
            text: String::new(),
        };
        match raw.into_status_error() {
            AppError::UpstreamStatus { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Falha no Athena");
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn optional_pairs_skip_empty_values() {
        let pairs = optional_pairs(&[("data_referencia", Some("2025-08-01")), ("shopping", Some(" "))]);
        assert_eq!(pairs, vec![("data_referencia", "2025-08-01".to_string())]);
    }
}
