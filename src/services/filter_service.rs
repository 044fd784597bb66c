// src/services/filter_service.rs

use std::{cmp::Reverse, sync::Arc};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    common::error::AppError,
    models::{
        auth::AuthToken,
        filters::{AvailableDates, CascadeQuery, FilterChange, FilterOptions, FilteredOptions, ResolvedDate},
        wbr::UserFilters,
    },
    repo::{filter_store::storage_key, FilterStore, WbrRepository},
};

const MASK_MAX_LEN: usize = 10;

/// Máscara do campo de data: mantém dígitos e barras, insere a barra
/// nas posições 2 e 5 quando o usuário não digitou
pub fn mask_date_input(input: &str) -> String {
    let mut masked: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '/')
        .take(MASK_MAX_LEN)
        .collect();

    for slash_at in [2, 5] {
        if masked.len() > slash_at && masked.as_bytes()[slash_at] != b'/' {
            masked.insert(slash_at, '/');
        }
    }
    masked.truncate(MASK_MAX_LEN);
    masked
}

/// Aceita AAAA-MM-DD ou DD/MM/AAAA (com a máscara aplicada)
pub fn parse_user_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    let masked = mask_date_input(trimmed);
    if masked.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(&masked, "%d/%m/%Y").ok()
}

/// Data disponível mais próxima; empate fica com a mais recente
pub fn snap_to_available(date: NaiveDate, available: &[String]) -> Option<String> {
    available
        .iter()
        .filter_map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| (d, raw))
        })
        .min_by_key(|(d, _)| ((*d - date).num_days().abs(), Reverse(*d)))
        .map(|(_, raw)| raw.clone())
}

pub fn default_reference_date(dates: &[String]) -> Option<String> {
    dates.first().cloned()
}

#[derive(Clone)]
pub struct FilterService {
    repo: Arc<dyn WbrRepository>,
    store: Arc<dyn FilterStore>,
}

impl FilterService {
    pub fn new(repo: Arc<dyn WbrRepository>, store: Arc<dyn FilterStore>) -> Self {
        Self { repo, store }
    }

    pub async fn options(&self, token: &AuthToken) -> Result<FilterOptions, AppError> {
        self.repo.filter_options(token).await
    }

    pub async fn filtered_options(
        &self,
        query: &CascadeQuery,
        token: &AuthToken,
    ) -> Result<FilteredOptions, AppError> {
        self.repo.filtered_options(query, token).await
    }

    pub async fn available_dates(&self, token: &AuthToken) -> Result<AvailableDates, AppError> {
        let mut dates: Vec<String> = self
            .repo
            .available_dates(token)
            .await?
            .into_iter()
            .filter(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();

        Ok(AvailableDates {
            count: dates.len(),
            default_date: default_reference_date(&dates),
            dates,
        })
    }

    /// Interpreta a data digitada e encaixa na data disponível mais próxima
    pub async fn resolve_date(&self, input: &str, token: &AuthToken) -> Result<ResolvedDate, AppError> {
        let masked = mask_date_input(input);
        let parsed = parse_user_date(input).ok_or_else(|| AppError::InvalidDate(input.to_string()))?;

        let available = self.available_dates(token).await?;
        let snapped_to = snap_to_available(parsed, &available.dates).ok_or(AppError::NoAvailableDates)?;
        let parsed = parsed.format("%Y-%m-%d").to_string();
        debug!("Data '{}' resolvida para {}", input, snapped_to);

        Ok(ResolvedDate {
            masked,
            snapped: snapped_to != parsed,
            parsed: Some(parsed),
            data_referencia: Some(snapped_to),
        })
    }

    pub async fn saved(&self, token: &AuthToken) -> Result<Option<UserFilters>, AppError> {
        self.store.load(&storage_key(token)).await
    }

    pub async fn save(&self, token: &AuthToken, filters: &UserFilters) -> Result<UserFilters, AppError> {
        let filters = filters.normalized();
        self.store.save(&storage_key(token), &filters).await?;
        info!("✅ Filtros salvos: [{}]", filters.cache_key());
        Ok(filters)
    }

    /// Muda um campo dos filtros salvos e limpa os dependentes
    pub async fn apply_change(&self, token: &AuthToken, change: &FilterChange) -> Result<UserFilters, AppError> {
        let current = self.saved(token).await?.unwrap_or_default();
        let next = current.with_change(change.field, change.value.clone());
        self.save(token, &next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::wbr::FilterField,
        repo::{fake::FakeWbrRepository, InMemoryFilterStore},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates() -> Vec<String> {
        vec!["2025-08-20".into(), "2025-08-13".into(), "2025-08-06".into()]
    }

    fn service() -> FilterService {
        let mut fake = FakeWbrRepository::with_page("vendas", &["a"]);
        fake.dates = vec!["2025-08-13".into(), "2025-08-20".into(), "lixo".into(), "2025-08-06".into()];
        FilterService::new(Arc::new(fake), Arc::new(InMemoryFilterStore::new()))
    }

    #[test]
    fn masks_like_the_date_field() {
        assert_eq!(mask_date_input("2"), "2");
        assert_eq!(mask_date_input("200"), "20/0");
        assert_eq!(mask_date_input("2008"), "20/08");
        assert_eq!(mask_date_input("20082025"), "20/08/2025");
        assert_eq!(mask_date_input("20/08/2025999"), "20/08/2025");
        assert_eq!(mask_date_input("20a08-2025"), "20/08/2025");
    }

    #[test]
    fn mask_keeps_typed_slashes() {
        assert_eq!(mask_date_input("20/"), "20/");
        assert_eq!(mask_date_input("20/8"), "20/8");
        assert_eq!(mask_date_input("20/08/2025"), "20/08/2025");
        assert_eq!(mask_date_input("2008/2025"), "20/08/2025");
        assert_eq!(mask_date_input("2/08/2025"), "2//08/2025");
        assert_eq!(parse_user_date("2/08/2025"), None);
    }

    #[test]
    fn parses_both_formats() {
        assert_eq!(parse_user_date("2025-08-20"), Some(date(2025, 8, 20)));
        assert_eq!(parse_user_date("20/08/2025"), Some(date(2025, 8, 20)));
        assert_eq!(parse_user_date("20082025"), Some(date(2025, 8, 20)));
        assert_eq!(parse_user_date("20/08/25"), None);
        assert_eq!(parse_user_date("31/02/2025"), None);
    }

    #[test]
    fn snaps_to_nearest_and_prefers_recent_on_tie() {
        assert_eq!(snap_to_available(date(2025, 8, 19), &dates()).as_deref(), Some("2025-08-20"));
        assert_eq!(snap_to_available(date(2025, 8, 7), &dates()).as_deref(), Some("2025-08-06"));
        // 10 e 14 estão a dois dias de 12
        let tie = vec!["2025-08-10".to_string(), "2025-08-14".to_string()];
        assert_eq!(snap_to_available(date(2025, 8, 12), &tie).as_deref(), Some("2025-08-14"));
        assert_eq!(snap_to_available(date(2025, 8, 12), &[]), None);
    }

    #[tokio::test]
    async fn available_dates_are_sorted_with_default() {
        let dates = service().available_dates(&AuthToken::new("t")).await.unwrap();
        assert_eq!(dates.dates, vec!["2025-08-20", "2025-08-13", "2025-08-06"]);
        assert_eq!(dates.count, 3);
        assert_eq!(dates.default_date.as_deref(), Some("2025-08-20"));
    }

    #[tokio::test]
    async fn resolves_typed_date() {
        let service = service();
        let token = AuthToken::new("t");

        let resolved = service.resolve_date("18082025", &token).await.unwrap();
        assert_eq!(resolved.masked, "18/08/2025");
        assert_eq!(resolved.parsed.as_deref(), Some("2025-08-18"));
        assert_eq!(resolved.data_referencia.as_deref(), Some("2025-08-20"));
        assert!(resolved.snapped);

        let exact = service.resolve_date("2025-08-13", &token).await.unwrap();
        assert!(!exact.snapped);

        assert!(matches!(
            service.resolve_date("18/08", &token).await,
            Err(AppError::InvalidDate(_))
        ));
    }

    #[tokio::test]
    async fn saved_filters_are_per_user_and_cascade() {
        let service = service();
        let alice = AuthToken::new("a");
        let bob = AuthToken::new("b");

        let saved = service
            .save(
                &alice,
                &UserFilters {
                    shopping: Some("SIG".into()),
                    ramo: Some("Moda".into()),
                    loja: Some("  ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.loja, None);
        assert_eq!(service.saved(&bob).await.unwrap(), None);

        let changed = service
            .apply_change(&alice, &FilterChange { field: FilterField::Shopping, value: Some("SBI".into()) })
            .await
            .unwrap();
        assert_eq!(changed.shopping.as_deref(), Some("SBI"));
        assert_eq!(changed.ramo, None);
        assert_eq!(service.saved(&alice).await.unwrap(), Some(changed));
    }
}
