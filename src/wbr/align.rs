// src/wbr/align.rs

use chrono::NaiveDate;
use tracing::warn;

use super::format::{week_label, WeekLabelStyle, MONTH_LABELS};
use crate::models::wbr::SerieTemporal;

// Janela semanal exibida em gráficos não-RGM
pub const WEEKLY_WINDOW: usize = 6;
pub const MONTHS_IN_YEAR: usize = 12;

/// Séries já posicionadas no eixo X do gráfico
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub weekly_cy: Vec<Option<f64>>,
    pub weekly_py: Vec<Option<f64>>,
    pub weekly_dates: Vec<NaiveDate>,
    pub monthly_cy: Vec<Option<f64>>,
    pub monthly_py: Vec<Option<f64>>,
    pub semanas_count: usize,
    /// Primeira posição do bloco mensal (um slot vazio separa os blocos)
    pub months_offset: usize,
    pub labels: Vec<String>,
}

impl AlignedSeries {
    // Posição no eixo X do mês `month` (0 = janeiro)
    pub fn month_x(&self, month: usize) -> usize {
        self.months_offset + month
    }

    pub fn total_labels(&self) -> usize {
        self.labels.len()
    }
}

fn trailing<T: Clone>(values: &[T], window: usize) -> Vec<T> {
    values[values.len().saturating_sub(window)..].to_vec()
}

fn pad_months(mut values: Vec<Option<f64>>, serie: &str) -> Vec<Option<f64>> {
    if values.len() > MONTHS_IN_YEAR {
        warn!(
            "⚠️ Série mensal '{}' com {} posições (esperado {}); mantendo todas",
            serie,
            values.len(),
            MONTHS_IN_YEAR
        );
    }
    while values.len() < MONTHS_IN_YEAR {
        values.push(None);
    }
    values
}

pub fn align(
    weekly_cy: &SerieTemporal,
    weekly_py: &SerieTemporal,
    monthly_cy: &SerieTemporal,
    monthly_py: &SerieTemporal,
    is_rgm: bool,
) -> AlignedSeries {
    align_with_labels(
        weekly_cy,
        weekly_py,
        monthly_cy,
        monthly_py,
        is_rgm,
        WeekLabelStyle::default(),
    )
}

pub fn align_with_labels(
    weekly_cy: &SerieTemporal,
    weekly_py: &SerieTemporal,
    monthly_cy: &SerieTemporal,
    monthly_py: &SerieTemporal,
    is_rgm: bool,
    style: WeekLabelStyle,
) -> AlignedSeries {
    let mut cy = weekly_cy.values();
    let mut py = weekly_py.values();
    let mut dates = weekly_cy.index.clone();

    // Cada array mantém as suas próprias últimas 6 posições
    if !is_rgm {
        if cy.len() > WEEKLY_WINDOW {
            cy = trailing(&cy, WEEKLY_WINDOW);
            py = trailing(&py, WEEKLY_WINDOW);
        }
        if dates.len() > WEEKLY_WINDOW {
            dates = trailing(&dates, WEEKLY_WINDOW);
        }
    }

    let monthly_cy = pad_months(monthly_cy.values(), "meses_cy");
    let monthly_py = pad_months(monthly_py.values(), "meses_py");

    let semanas_count = cy.len();
    let months_offset = semanas_count + 1;

    // Rótulos alinhados à direita com as datas da janela
    let missing = semanas_count.saturating_sub(dates.len());
    let mut labels: Vec<String> = Vec::with_capacity(months_offset + MONTHS_IN_YEAR);
    labels.extend(std::iter::repeat_n(String::new(), missing));
    labels.extend(
        dates[dates.len().saturating_sub(semanas_count)..]
            .iter()
            .map(|d| week_label(*d, style)),
    );
    labels.push(String::new());
    labels.extend(MONTH_LABELS.iter().map(|m| m.to_string()));

    AlignedSeries {
        weekly_cy: cy,
        weekly_py: py,
        weekly_dates: dates,
        monthly_cy,
        monthly_py,
        semanas_count,
        months_offset,
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serie(start: NaiveDate, step_days: i64, values: &[Option<f64>]) -> SerieTemporal {
        let index: Vec<NaiveDate> = (0..values.len())
            .map(|i| start + chrono::Duration::days(step_days * i as i64))
            .collect();
        SerieTemporal {
            metric_value: index
                .iter()
                .zip(values)
                .map(|(d, v)| (format!("{d}T00:00:00"), *v))
                .collect(),
            index,
        }
    }

    fn weeks(n: usize) -> SerieTemporal {
        let values: Vec<Option<f64>> = (1..=n).map(|v| Some(v as f64)).collect();
        serie(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), 7, &values)
    }

    fn months(values: &[Option<f64>]) -> SerieTemporal {
        serie(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 31, values)
    }

    #[test]
    fn pads_months_to_twelve() {
        let aligned = align(
            &weeks(3),
            &weeks(3),
            &months(&[Some(100.0), None, Some(120.0)]),
            &months(&[]),
            false,
        );
        assert_eq!(aligned.monthly_cy.len(), 12);
        assert_eq!(&aligned.monthly_cy[..3], &[Some(100.0), None, Some(120.0)]);
        assert!(aligned.monthly_cy[3..].iter().all(Option::is_none));
        assert_eq!(aligned.monthly_py, vec![None; 12]);
    }

    #[test]
    fn keeps_more_than_twelve_months() {
        let values: Vec<Option<f64>> = (0..13).map(|v| Some(v as f64)).collect();
        let aligned = align(&weeks(1), &weeks(1), &months(&values), &months(&[]), false);
        assert_eq!(aligned.monthly_cy.len(), 13);
    }

    #[test]
    fn non_rgm_keeps_trailing_six_weeks() {
        let aligned = align(&weeks(10), &weeks(9), &months(&[]), &months(&[]), false);
        let expected: Vec<Option<f64>> = (5..=10).map(|v| Some(v as f64)).collect();
        assert_eq!(aligned.weekly_cy, expected);
        let expected_py: Vec<Option<f64>> = (4..=9).map(|v| Some(v as f64)).collect();
        assert_eq!(aligned.weekly_py, expected_py);
        assert_eq!(aligned.weekly_dates.len(), 6);
        assert_eq!(aligned.weekly_dates[0], weeks(10).index[4]);
        assert_eq!(aligned.semanas_count, 6);
        assert_eq!(aligned.months_offset, 7);
        assert_eq!(aligned.labels.len(), 6 + 1 + 12);
        assert_eq!(aligned.labels[0], "03/02");
        assert_eq!(aligned.labels[6], "");
        assert_eq!(aligned.labels[7], "JAN");
        assert_eq!(aligned.month_x(1), 8);
    }

    #[test]
    fn rgm_keeps_full_history() {
        let aligned = align(&weeks(10), &weeks(10), &months(&[]), &months(&[]), true);
        assert_eq!(aligned.weekly_cy.len(), 10);
        assert_eq!(aligned.weekly_dates.len(), 10);
        assert_eq!(aligned.semanas_count, 10);
        assert_eq!(aligned.total_labels(), 10 + 1 + 12);
    }

    #[test]
    fn iso_week_labels_are_optional() {
        let aligned = align_with_labels(
            &weeks(2),
            &weeks(2),
            &months(&[]),
            &months(&[]),
            false,
            WeekLabelStyle::IsoWeek,
        );
        assert_eq!(aligned.labels[..2], ["Wk 2".to_string(), "Wk 3".to_string()]);
    }
}
