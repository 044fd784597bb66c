// src/services/chart_service.rs

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::{
    common::error::AppError,
    models::{
        auth::AuthToken,
        chart::ChartView,
        page::ChartSlot,
        wbr::{ChartErrorDescriptor, ChartMeta, ChartPayload, UserFilters},
    },
    repo::WbrRepository,
    wbr::{self, format::WeekLabelStyle},
};

/// Busca o dataset de um gráfico e monta a sua visualização
#[derive(Clone)]
pub struct ChartService {
    repo: Arc<dyn WbrRepository>,
    label_style: WeekLabelStyle,
}

fn error_type(err: &AppError) -> &'static str {
    match err {
        AppError::UpstreamRequest(_) => "NetworkError",
        AppError::UpstreamStatus { .. } => "UpstreamError",
        AppError::Decode(_) => "DecodeError",
        _ => "Error",
    }
}

impl ChartService {
    pub fn new(repo: Arc<dyn WbrRepository>, label_style: WeekLabelStyle) -> Self {
        Self { repo, label_style }
    }

    pub async fn fetch_view(
        &self,
        meta: &ChartMeta,
        filters: &UserFilters,
        token: &AuthToken,
        reference_date: NaiveDate,
    ) -> Result<ChartView, AppError> {
        match self.repo.chart(&meta.grafico_id, filters, token).await? {
            ChartPayload::Dataset(dataset) => {
                let series = [&dataset.semanas_cy, &dataset.semanas_py, &dataset.meses_cy, &dataset.meses_py];
                if series.iter().any(|s| !s.is_consistent()) {
                    warn!("⚠️ Gráfico '{}': índice e valores com tamanhos diferentes", meta.grafico_id);
                }
                Ok(wbr::render_chart(&dataset, meta, reference_date, self.label_style))
            }
            ChartPayload::Error(descriptor) => Err(AppError::ChartUnavailable(descriptor)),
            ChartPayload::Malformed { missing } => Err(AppError::MalformedDataset(missing)),
        }
    }

    /// Como `fetch_view`, mas qualquer falha fica contida no slot do gráfico
    pub async fn fetch_slot(
        &self,
        meta: &ChartMeta,
        filters: &UserFilters,
        token: &AuthToken,
        reference_date: NaiveDate,
    ) -> ChartSlot {
        match self.fetch_view(meta, filters, token, reference_date).await {
            Ok(view) => ChartSlot::Ready(view),
            Err(AppError::ChartUnavailable(descriptor)) => {
                warn!("⚠️ Gráfico '{}' retornou erro: {}", meta.grafico_id, descriptor.error);
                ChartSlot::Error(descriptor)
            }
            Err(AppError::MalformedDataset(missing)) => {
                warn!("⚠️ Gráfico '{}' com dataset incompleto: faltando {:?}", meta.grafico_id, missing);
                ChartSlot::Malformed { missing }
            }
            Err(err) => {
                warn!("⚠️ Falha ao buscar gráfico '{}': {}", meta.grafico_id, err);
                ChartSlot::Error(ChartErrorDescriptor::new(err.to_string()).with_type(error_type(&err)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::fake::FakeWbrRepository;
    use serde_json::json;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
    }

    fn service(fake: FakeWbrRepository) -> ChartService {
        ChartService::new(Arc::new(fake), WeekLabelStyle::DdMm)
    }

    #[tokio::test]
    async fn renders_dataset() {
        let service = service(FakeWbrRepository::default());
        let view = service
            .fetch_view(&ChartMeta::for_id("vendas"), &UserFilters::default(), &AuthToken::new("t"), reference())
            .await
            .unwrap();
        assert_eq!(view.grafico_id, "vendas");
        assert_eq!(view.kpis.mtd, 500.0);
        assert_eq!(view.kpis.last_wk, 90.0);
    }

    #[tokio::test]
    async fn slots_contain_each_failure_kind() {
        let mut fake = FakeWbrRepository::default();
        fake.failing_charts.insert("quebrado".into());
        fake.chart_bodies.insert("erro".into(), json!({"error": "Sem dados", "status": "error"}));
        fake.chart_bodies.insert("incompleto".into(), json!({"semanas_cy": {}, "ano_atual": 2025}));
        let service = service(fake);
        let token = AuthToken::new("t");
        let filters = UserFilters::default();

        let slot = service.fetch_slot(&ChartMeta::for_id("quebrado"), &filters, &token, reference()).await;
        match slot {
            ChartSlot::Error(d) => assert_eq!(d.error_type.as_deref(), Some("UpstreamError")),
            other => panic!("esperava erro: {other:?}"),
        }

        let slot = service.fetch_slot(&ChartMeta::for_id("erro"), &filters, &token, reference()).await;
        assert!(matches!(slot, ChartSlot::Error(ref d) if d.error == "Sem dados"));

        let slot = service.fetch_slot(&ChartMeta::for_id("incompleto"), &filters, &token, reference()).await;
        match slot {
            ChartSlot::Malformed { missing } => {
                assert_eq!(missing, vec!["semanas_py", "meses_cy", "meses_py", "ano_anterior"]);
            }
            other => panic!("esperava malformado: {other:?}"),
        }
    }
}
