// src/wbr/segment.rs

use chrono::{Datelike, NaiveDate};

/// Como desenhar a série mensal do ano corrente
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthlySegmentation {
    /// Uma única linha sólida por todos os meses válidos
    Whole { indices: Vec<usize> },
    /// Meses fechados sólidos + trecho tracejado até o mês em andamento
    Split {
        solid: Vec<usize>,
        dashed: (usize, usize),
    },
    /// Mês em andamento sem mês anterior válido: ponto tracejado solto
    SinglePoint { point: usize },
}

pub fn last_day_of_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

pub fn is_end_of_month(date: NaiveDate) -> bool {
    date.day() == last_day_of_month(date)
}

fn is_valid(value: &Option<f64>) -> bool {
    value.is_some_and(|v| v.is_finite())
}

pub fn segment_monthly(
    monthly_cy: &[Option<f64>],
    reference_date: NaiveDate,
    is_rgm: bool,
) -> MonthlySegmentation {
    let valid: Vec<usize> = monthly_cy
        .iter()
        .enumerate()
        .filter(|(_, v)| is_valid(v))
        .map(|(i, _)| i)
        .collect();

    let mes_ref = reference_date.month0() as usize;
    let current_is_valid = monthly_cy.get(mes_ref).is_some_and(is_valid);

    if is_rgm || is_end_of_month(reference_date) || !current_is_valid {
        return MonthlySegmentation::Whole { indices: valid };
    }

    let solid: Vec<usize> = valid.into_iter().filter(|&i| i < mes_ref).collect();
    match solid.last() {
        Some(&prior) => MonthlySegmentation::Split {
            dashed: (prior, mes_ref),
            solid,
        },
        None => MonthlySegmentation::SinglePoint { point: mes_ref },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn months(values: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut v = values.to_vec();
        v.resize(12, None);
        v
    }

    #[test]
    fn splits_in_progress_month() {
        let cy = months(&[Some(100.0), Some(110.0)]);
        assert_eq!(
            segment_monthly(&cy, date(2025, 2, 15), false),
            MonthlySegmentation::Split { solid: vec![0], dashed: (0, 1) }
        );
    }

    #[test]
    fn january_is_a_single_point() {
        let cy = months(&[Some(100.0)]);
        assert_eq!(
            segment_monthly(&cy, date(2025, 1, 10), false),
            MonthlySegmentation::SinglePoint { point: 0 }
        );
    }

    #[test]
    fn skips_gaps_before_current_month() {
        let cy = months(&[Some(1.0), Some(2.0), None, Some(4.0)]);
        assert_eq!(
            segment_monthly(&cy, date(2025, 4, 2), false),
            MonthlySegmentation::Split { solid: vec![0, 1], dashed: (1, 3) }
        );
    }

    #[test]
    fn whole_line_fallbacks() {
        let cy = months(&[Some(100.0), Some(110.0)]);
        // fim de mês (fevereiro de 2024 tem 29 dias)
        assert_eq!(
            segment_monthly(&cy, date(2024, 2, 29), false),
            MonthlySegmentation::Whole { indices: vec![0, 1] }
        );
        assert!(is_end_of_month(date(2025, 2, 28)));
        // RGM
        assert_eq!(
            segment_monthly(&cy, date(2025, 2, 15), true),
            MonthlySegmentation::Whole { indices: vec![0, 1] }
        );
        // mês corrente nulo
        assert_eq!(
            segment_monthly(&cy, date(2025, 3, 15), false),
            MonthlySegmentation::Whole { indices: vec![0, 1] }
        );
    }

    #[test]
    fn month_lengths() {
        assert_eq!(last_day_of_month(date(2024, 2, 10)), 29);
        assert_eq!(last_day_of_month(date(2025, 2, 10)), 28);
        assert_eq!(last_day_of_month(date(2025, 12, 1)), 31);
        assert_eq!(last_day_of_month(date(2025, 4, 30)), 30);
        assert!(is_end_of_month(date(2025, 4, 30)));
    }
}
