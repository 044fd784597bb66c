// src/wbr.rs

pub mod align;
pub mod assembly;
pub mod format;
pub mod kpi;
pub mod segment;

use chrono::NaiveDate;

use crate::models::{
    chart::ChartView,
    wbr::{ChartMeta, WbrDataset},
};
use self::{assembly::ChartContext, format::WeekLabelStyle};

/// Pipeline completo de um gráfico: alinhamento, KPIs, segmentação e montagem.
/// Puro: a mesma entrada sempre produz o mesmo `ChartView`.
pub fn render_chart(
    dataset: &WbrDataset,
    meta: &ChartMeta,
    reference_date: NaiveDate,
    label_style: WeekLabelStyle,
) -> ChartView {
    let aligned = align::align_with_labels(
        &dataset.semanas_cy,
        &dataset.semanas_py,
        &dataset.meses_cy,
        &dataset.meses_py,
        meta.is_rgm,
        label_style,
    );

    let kpis = kpi::derive_kpis(
        &aligned.weekly_cy,
        &aligned.weekly_py,
        &aligned.monthly_cy,
        &aligned.monthly_py,
        reference_date,
    );
    let segmentation = segment::segment_monthly(&aligned.monthly_cy, reference_date, meta.is_rgm);

    let ctx = ChartContext {
        titulo: meta.titulo.clone(),
        unidade: meta.unidade.clone(),
        is_rgm: meta.is_rgm,
        ano_atual: dataset.ano_atual,
        ano_anterior: dataset.ano_anterior,
    };
    let spec = assembly::assemble(&aligned, &kpis, &segmentation, &ctx);

    ChartView {
        grafico_id: meta.grafico_id.clone(),
        titulo: meta.titulo.clone(),
        unidade: meta.unidade.clone(),
        is_rgm: meta.is_rgm,
        data_referencia: reference_date,
        semana_parcial: dataset.semana_parcial,
        mes_parcial_cy: dataset.mes_parcial_cy,
        mes_parcial_py: dataset.mes_parcial_py,
        spec,
        kpis,
    }
}
