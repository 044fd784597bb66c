// src/wbr/format.rs

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

pub const COLOR_POSITIVE: &str = "darkgreen";
pub const COLOR_NEGATIVE: &str = "darkred";
pub const COLOR_NEUTRAL: &str = "black";

pub const MONTH_LABELS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    /// Contagens e valores monetários (sufixos B/M/k)
    Numero,
    Percentual,
}

impl ValueFormat {
    pub fn for_unit(unidade: &str) -> Self {
        if unidade.trim() == "%" {
            ValueFormat::Percentual
        } else {
            ValueFormat::Numero
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekLabelStyle {
    #[default]
    DdMm,
    IsoWeek,
}

// Arredonda meio para longe do zero antes de formatar
fn fixed(value: f64, decimals: usize) -> String {
    let factor = 10f64.powi(decimals as i32);
    let mut rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        rounded = 0.0; // evita "-0.0"
    }
    format!("{rounded:.decimals$}")
}

/// Formata um valor para rótulos e para o painel de KPIs.
/// Nulo ou NaN vira string vazia.
pub fn format_value(value: Option<f64>, format: ValueFormat) -> String {
    let Some(v) = value.filter(|v| !v.is_nan()) else {
        return String::new();
    };

    match format {
        ValueFormat::Percentual => {
            let sign = if v > 0.0 { "+" } else { "" };
            format!("{sign}{}%", fixed(v, 1))
        }
        ValueFormat::Numero => {
            let magnitude = v.abs();
            if magnitude >= 1e9 {
                format!("{}B", fixed(v / 1e9, 1))
            } else if magnitude >= 1e6 {
                format!("{}M", fixed(v / 1e6, 1))
            } else if magnitude >= 1e3 {
                format!("{}k", fixed(v / 1e3, 1))
            } else {
                fixed(v, 0)
            }
        }
    }
}

/// Variação percentual ano contra ano.
/// Nulo quando algum operando falta ou o ano anterior é exatamente zero.
pub fn calculate_yoy(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let cy = current.filter(|v| !v.is_nan())?;
    let py = previous.filter(|v| !v.is_nan())?;
    if py == 0.0 {
        return None;
    }
    Some((cy - py) / py * 100.0)
}

pub fn delta_color(delta: Option<f64>) -> &'static str {
    match delta {
        Some(v) if v > 0.0 => COLOR_POSITIVE,
        Some(v) if v < 0.0 => COLOR_NEGATIVE,
        _ => COLOR_NEUTRAL,
    }
}

pub fn week_label(date: NaiveDate, style: WeekLabelStyle) -> String {
    match style {
        WeekLabelStyle::DdMm => date.format("%d/%m").to_string(),
        WeekLabelStyle::IsoWeek => format!("Wk {}", date.iso_week().week()),
    }
}

/// Faixa [min, max] segura para um eixo Y, ignorando nulos.
pub fn safe_range(values: &[Option<f64>]) -> (f64, f64) {
    let valid: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        return (0.0, 1.0);
    }

    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        let upper = max * 1.2;
        return (0.0, if upper == 0.0 { 1.0 } else { upper });
    }

    (min * 0.85, max * 1.15)
}
