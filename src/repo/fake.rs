// src/repo/fake.rs

// Repositório em memória para os testes de serviços e handlers

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::wbr_repo::WbrRepository;
use crate::{
    common::error::AppError,
    models::{
        auth::AuthToken,
        filters::{CascadeQuery, FilterOptions, FilteredOptions, ShoppingOption},
        instagram::{InstagramEngagement, InstagramKpis, InstagramTopPost},
        wbr::{ChartPayload, ChartRef, PageConfig, UserFilters},
    },
};

fn monthly(year: i32, values: &[f64]) -> Value {
    let keys: Vec<String> = (1..=values.len()).map(|m| format!("{year}-{m:02}-01")).collect();
    let metric: serde_json::Map<String, Value> = keys
        .iter()
        .cloned()
        .zip(values.iter().map(|v| json!(v)))
        .collect();
    json!({"metric_value": metric, "index": keys})
}

pub fn sample_dataset() -> Value {
    json!({
        "semanas_cy": {
            "metric_value": {"2025-07-28T00:00:00": 100, "2025-08-04T00:00:00": 120, "2025-08-11T00:00:00": 90},
            "index": ["2025-07-28", "2025-08-04", "2025-08-11"]
        },
        "semanas_py": {
            "metric_value": {"2024-07-29T00:00:00": 80, "2024-08-05T00:00:00": 100, "2024-08-12T00:00:00": 100},
            "index": ["2024-07-29", "2024-08-05", "2024-08-12"]
        },
        "meses_cy": monthly(2025, &[1000.0, 1010.0, 1020.0, 1030.0, 1040.0, 1050.0, 1060.0, 500.0]),
        "meses_py": monthly(2024, &[900.0; 12]),
        "ano_atual": 2025,
        "ano_anterior": 2024,
        "mes_parcial_cy": true
    })
}

#[derive(Default)]
pub struct FakeWbrRepository {
    pub pages: HashMap<String, Vec<String>>,
    pub config_fails: bool,
    /// Gráficos cuja busca falha com erro de transporte
    pub failing_charts: HashSet<String>,
    /// Corpos específicos por gráfico (senão usa `sample_dataset`)
    pub chart_bodies: HashMap<String, Value>,
    pub chart_delay: Duration,
    pub dates: Vec<String>,
    pub instagram_fails: bool,
    pub top_posts_fail: bool,

    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub chart_calls: AtomicUsize,
    pub config_calls: AtomicUsize,
    /// Ordem de início e fim das buscas ("+id" / "-id")
    pub log: Mutex<Vec<String>>,
    pub seen_filters: Mutex<Vec<UserFilters>>,
}

impl FakeWbrRepository {
    pub fn with_page(page_id: &str, charts: &[&str]) -> Self {
        let mut fake = Self::default();
        fake.pages.insert(
            page_id.to_string(),
            charts.iter().map(|c| c.to_string()).collect(),
        );
        fake.dates = vec![
            "2025-08-20".to_string(),
            "2025-08-13".to_string(),
            "2025-08-06".to_string(),
        ];
        fake
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl WbrRepository for FakeWbrRepository {
    async fn page_config(&self, page_id: &str, _token: &AuthToken) -> Result<PageConfig, AppError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        if self.config_fails {
            return Err(AppError::UpstreamStatus { status: 500, message: "config indisponível".into() });
        }
        Ok(PageConfig {
            page_id: Some(page_id.to_string()),
            graficos: self
                .pages
                .get(page_id)
                .map(|ids| ids.iter().cloned().map(ChartRef::Id).collect())
                .unwrap_or_default(),
        })
    }

    async fn chart(
        &self,
        grafico_id: &str,
        filters: &UserFilters,
        _token: &AuthToken,
    ) -> Result<ChartPayload, AppError> {
        self.chart_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_filters.lock().unwrap().push(filters.clone());
        self.log.lock().unwrap().push(format!("+{grafico_id}"));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.chart_delay.is_zero() {
            tokio::time::sleep(self.chart_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("-{grafico_id}"));

        if self.failing_charts.contains(grafico_id) {
            return Err(AppError::UpstreamStatus { status: 500, message: format!("falha em {grafico_id}") });
        }
        let body = self
            .chart_bodies
            .get(grafico_id)
            .cloned()
            .unwrap_or_else(sample_dataset);
        Ok(ChartPayload::from_value(body))
    }

    async fn filter_options(&self, _token: &AuthToken) -> Result<FilterOptions, AppError> {
        Ok(FilterOptions {
            datas: self.dates.clone(),
            shoppings: vec![ShoppingOption { value: "SIG".into(), label: "Shopping Iguatemi".into() }],
            ramos: vec!["Moda".into(), "Alimentação".into()],
            categorias: vec!["Calçados".into()],
            lojas: vec!["Loja A".into()],
        })
    }

    async fn filtered_options(
        &self,
        query: &CascadeQuery,
        _token: &AuthToken,
    ) -> Result<FilteredOptions, AppError> {
        let shopping = query.shopping.clone().unwrap_or_default();
        Ok(FilteredOptions {
            ramos: Some(vec![format!("Moda {shopping}").trim().to_string()]),
            categorias: query.ramo.as_ref().map(|r| vec![format!("{r}/Calçados")]),
            lojas: query.categoria.as_ref().map(|c| vec![format!("{c}/Loja A")]),
        })
    }

    async fn available_dates(&self, _token: &AuthToken) -> Result<Vec<String>, AppError> {
        Ok(self.dates.clone())
    }

    async fn instagram_kpis(
        &self,
        _data_referencia: Option<&str>,
        shopping: Option<&str>,
        _token: &AuthToken,
    ) -> Result<InstagramKpis, AppError> {
        if self.instagram_fails {
            return Err(AppError::UpstreamStatus { status: 503, message: "instagram fora".into() });
        }
        Ok(InstagramKpis {
            seguidores: Vec::new(),
            engagement: vec![InstagramEngagement {
                shopping: shopping.map(str::to_string),
                total_likes: Some(1200.0),
                ..Default::default()
            }],
        })
    }

    async fn instagram_top_posts(
        &self,
        _data_referencia: Option<&str>,
        shopping: Option<&str>,
        limit: u32,
        _token: &AuthToken,
    ) -> Result<Vec<InstagramTopPost>, AppError> {
        if self.top_posts_fail {
            return Err(AppError::UpstreamStatus { status: 500, message: "top posts fora".into() });
        }
        Ok((0..limit)
            .map(|i| InstagramTopPost {
                shopping: shopping.map(str::to_string),
                data: Some("2025-08-20".into()),
                link_foto: None,
                link_insta: Some(format!("https://instagram.com/p/{i}")),
                total_likes: Some(100.0 - i as f64),
                total_comentarios: None,
                total_compartilhamentos: None,
                total_salvos: None,
                engajamento_total: None,
            })
            .collect())
    }
}
