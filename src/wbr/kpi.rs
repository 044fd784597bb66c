// src/wbr/kpi.rs

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use super::format::calculate_yoy;

/// Os 9 indicadores exibidos abaixo de cada gráfico WBR
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiSet {
    pub last_wk: f64,
    pub wow: f64,
    pub yoy_semana: f64,
    pub mtd: f64,
    pub yoy_mes: Option<f64>,
    pub qtd: f64,
    pub yoy_trimestre: Option<f64>,
    pub ytd: f64,
    pub yoy_ano: Option<f64>,
}

fn or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| !v.is_nan()).unwrap_or(0.0)
}

fn last(values: &[Option<f64>], back: usize) -> f64 {
    values
        .len()
        .checked_sub(back + 1)
        .map(|i| or_zero(values[i]))
        .unwrap_or(0.0)
}

// Variação semanal: denominador zero dá 0, não nulo
fn weekly_delta(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

fn sum(values: &[Option<f64>], from: usize, to: usize) -> f64 {
    (from..to)
        .map(|i| or_zero(values.get(i).copied().flatten()))
        .sum()
}

pub fn derive_kpis(
    weekly_cy: &[Option<f64>],
    weekly_py: &[Option<f64>],
    monthly_cy: &[Option<f64>],
    monthly_py: &[Option<f64>],
    reference_date: NaiveDate,
) -> KpiSet {
    let last_wk = last(weekly_cy, 0);
    let prev_wk = last(weekly_cy, 1);
    let last_wk_py = last(weekly_py, 0);

    let mes_ref = reference_date.month0() as usize;
    let mtd = or_zero(monthly_cy.get(mes_ref).copied().flatten());
    let mtd_py = monthly_py.get(mes_ref).copied().flatten();

    let quarter_start = (mes_ref / 3) * 3;
    let quarter_end = (quarter_start + 3).min(mes_ref + 1);
    let qtd = sum(monthly_cy, quarter_start, quarter_end);
    let qtd_py = sum(monthly_py, quarter_start, quarter_end);

    let ytd = sum(monthly_cy, 0, mes_ref + 1);
    let ytd_py = sum(monthly_py, 0, mes_ref + 1);

    KpiSet {
        last_wk,
        wow: weekly_delta(last_wk, prev_wk),
        yoy_semana: weekly_delta(last_wk, last_wk_py),
        mtd,
        yoy_mes: calculate_yoy(Some(mtd), mtd_py),
        qtd,
        yoy_trimestre: calculate_yoy(Some(qtd), Some(qtd_py)),
        ytd,
        yoy_ano: calculate_yoy(Some(ytd), Some(ytd_py)),
    }
}
