// src/wbr/assembly.rs

use super::{
    align::AlignedSeries,
    format::{calculate_yoy, delta_color, format_value, safe_range, ValueFormat, COLOR_NEUTRAL},
    kpi::KpiSet,
    segment::MonthlySegmentation,
};
use crate::models::chart::{
    AxisPosition, ChartSpec, DataPoint, KpiCell, LineSeries, LineStyle, LineType, Overlay,
    SeriesRole, Symbol, XAxis, YAxis, YoyCallout,
};

pub const COLOR_PY: &str = "#D685AB";
pub const COLOR_CY_WEEKLY: &str = "#000075";
pub const COLOR_CY_MONTHLY: &str = "#00008B";
pub const SEPARATOR_STROKE: &str = "#88888888";
pub const RGM_MASK_FILL: &str = "rgba(202, 202, 202, 0.9)";
pub const RGM_CAPTION: &str = "Dados semanais não disponíveis para este indicador";

const ROTATE_AFTER_LABELS: usize = 10;
const CALLOUT_OFFSET: i32 = -15;

pub const KPI_HEADERS: [&str; 9] = [
    "LastWk",
    "WOW",
    "YOY(Semana)",
    "MTD",
    "YOY(Mês)",
    "QTD",
    "YOY(Trimestre)",
    "YTD",
    "YOY(Ano)",
];

/// Dados de exibição que não vêm das séries
#[derive(Debug, Clone)]
pub struct ChartContext {
    pub titulo: String,
    pub unidade: String,
    pub is_rgm: bool,
    pub ano_atual: i32,
    pub ano_anterior: i32,
}

struct SeriesStyle {
    color: &'static str,
    item_color: &'static str,
    width: f64,
    line_type: LineType,
    symbol: Symbol,
    symbol_size: u32,
    show_labels: bool,
}

const THIN_PY: SeriesStyle = SeriesStyle {
    color: COLOR_PY,
    item_color: COLOR_PY,
    width: 1.5,
    line_type: LineType::Solid,
    symbol: Symbol::None,
    symbol_size: 0,
    show_labels: false,
};

const THICK_CY_WEEKLY: SeriesStyle = SeriesStyle {
    color: COLOR_CY_WEEKLY,
    item_color: COLOR_CY_MONTHLY,
    width: 2.5,
    line_type: LineType::Solid,
    symbol: Symbol::Diamond,
    symbol_size: 8,
    show_labels: true,
};

const THICK_CY_MONTHLY: SeriesStyle = SeriesStyle {
    color: COLOR_CY_MONTHLY,
    item_color: COLOR_CY_MONTHLY,
    width: 2.5,
    line_type: LineType::Solid,
    symbol: Symbol::Diamond,
    symbol_size: 8,
    show_labels: true,
};

fn line(
    name: String,
    role: SeriesRole,
    y_axis_index: usize,
    points: Vec<DataPoint>,
    style: &SeriesStyle,
) -> LineSeries {
    LineSeries {
        name,
        role,
        y_axis_index,
        points,
        line_style: LineStyle {
            color: style.color.to_string(),
            width: style.width,
            line_type: style.line_type,
        },
        item_color: style.item_color.to_string(),
        symbol: style.symbol,
        symbol_size: style.symbol_size,
        smooth: true,
        show_labels: style.show_labels,
        label_font_size: if style.show_labels { 15 } else { 0 },
        callouts: Vec::new(),
    }
}

fn points_at(
    values: &[Option<f64>],
    indices: impl IntoIterator<Item = usize>,
    x_of: impl Fn(usize) -> usize,
    labels: Option<ValueFormat>,
) -> Vec<DataPoint> {
    indices
        .into_iter()
        .filter_map(|i| values.get(i).map(|v| (i, *v)))
        .map(|(i, y)| DataPoint {
            x: x_of(i),
            y,
            label: labels.map(|f| format_value(y, f)).filter(|l| !l.is_empty()),
        })
        .collect()
}

fn yoy_callouts(
    current: &[Option<f64>],
    previous: &[Option<f64>],
    indices: impl IntoIterator<Item = usize>,
    x_of: impl Fn(usize) -> usize,
) -> Vec<YoyCallout> {
    indices
        .into_iter()
        .filter_map(|i| {
            let cy = current.get(i).copied().flatten()?;
            let yoy = calculate_yoy(Some(cy), previous.get(i).copied().flatten())?;
            Some(YoyCallout {
                x: x_of(i),
                y: cy,
                text: format_value(Some(yoy), ValueFormat::Percentual),
                color: delta_color(Some(yoy)).to_string(),
                offset_y: CALLOUT_OFFSET,
            })
        })
        .collect()
}

fn weekly_callouts(aligned: &AlignedSeries) -> Vec<YoyCallout> {
    yoy_callouts(&aligned.weekly_cy, &aligned.weekly_py, 0..aligned.weekly_cy.len(), |i| i)
}

fn monthly_callouts(aligned: &AlignedSeries, indices: impl IntoIterator<Item = usize>) -> Vec<YoyCallout> {
    yoy_callouts(&aligned.monthly_cy, &aligned.monthly_py, indices, |i| aligned.month_x(i))
}

fn monthly_cy_series(
    aligned: &AlignedSeries,
    segmentation: &MonthlySegmentation,
    name: &str,
    format: ValueFormat,
) -> Vec<LineSeries> {
    let x_of = |i: usize| aligned.month_x(i);
    let values = &aligned.monthly_cy;
    let dashed_style = SeriesStyle {
        line_type: LineType::Dashed,
        ..THICK_CY_MONTHLY
    };

    match segmentation {
        MonthlySegmentation::Whole { indices } => {
            let mut whole = line(
                name.to_string(),
                SeriesRole::MonthlyCy,
                1,
                points_at(values, indices.iter().copied(), x_of, Some(format)),
                &THICK_CY_MONTHLY,
            );
            whole.callouts = monthly_callouts(aligned, indices.iter().copied());
            vec![whole]
        }
        MonthlySegmentation::Split { solid, dashed } => {
            // O mês anterior aparece nos dois trechos; só o sólido leva rótulo e YoY
            let mut partial = points_at(values, [dashed.0, dashed.1], x_of, Some(format));
            if let Some(first) = partial.first_mut() {
                first.label = None;
            }
            let mut closed = line(
                name.to_string(),
                SeriesRole::MonthlyCy,
                1,
                points_at(values, solid.iter().copied(), x_of, Some(format)),
                &THICK_CY_MONTHLY,
            );
            closed.callouts = monthly_callouts(aligned, solid.iter().copied());
            let mut current = line(name.to_string(), SeriesRole::MonthlyCyPartial, 1, partial, &dashed_style);
            current.callouts = monthly_callouts(aligned, [dashed.1]);
            vec![closed, current]
        }
        MonthlySegmentation::SinglePoint { point } => {
            let mut single = line(
                name.to_string(),
                SeriesRole::MonthlyCyPartial,
                1,
                points_at(values, [*point], x_of, Some(format)),
                &dashed_style,
            );
            single.callouts = monthly_callouts(aligned, [*point]);
            vec![single]
        }
    }
}

fn kpi_panel(kpis: &KpiSet, is_rgm: bool) -> Vec<KpiCell> {
    let level = |v: f64| (format_value(Some(v), ValueFormat::Numero), COLOR_NEUTRAL.to_string());
    // A cor segue o texto arredondado: -0.04 vira "0.0%" em preto
    let delta = |v: Option<f64>| {
        let shown = v.map(|v| (v * 10.0).round() / 10.0);
        (
            format_value(v, ValueFormat::Percentual),
            delta_color(shown).to_string(),
        )
    };
    let placeholder = || ("-".to_string(), COLOR_NEUTRAL.to_string());

    let values = [
        if is_rgm { placeholder() } else { level(kpis.last_wk) },
        if is_rgm { placeholder() } else { delta(Some(kpis.wow)) },
        if is_rgm { placeholder() } else { delta(Some(kpis.yoy_semana)) },
        level(kpis.mtd),
        delta(kpis.yoy_mes),
        level(kpis.qtd),
        delta(kpis.yoy_trimestre),
        level(kpis.ytd),
        delta(kpis.yoy_ano),
    ];

    KPI_HEADERS
        .iter()
        .zip(values)
        .map(|(header, (value, color))| KpiCell {
            header: header.to_string(),
            value,
            color,
        })
        .collect()
}

/// Monta a especificação declarativa do gráfico WBR
pub fn assemble(
    aligned: &AlignedSeries,
    kpis: &KpiSet,
    segmentation: &MonthlySegmentation,
    ctx: &ChartContext,
) -> ChartSpec {
    let format = ValueFormat::for_unit(&ctx.unidade);
    let name_cy = ctx.ano_atual.to_string();
    let name_py = ctx.ano_anterior.to_string();
    let mut series = Vec::with_capacity(5);

    if !ctx.is_rgm && !aligned.weekly_py.is_empty() {
        series.push(line(
            name_py.clone(),
            SeriesRole::WeeklyPy,
            0,
            points_at(&aligned.weekly_py, 0..aligned.weekly_py.len(), |i| i, None),
            &THIN_PY,
        ));
    }

    if !ctx.is_rgm && !aligned.weekly_cy.is_empty() {
        let mut weekly = line(
            name_cy.clone(),
            SeriesRole::WeeklyCy,
            0,
            points_at(&aligned.weekly_cy, 0..aligned.weekly_cy.len(), |i| i, Some(format)),
            &THICK_CY_WEEKLY,
        );
        weekly.callouts = weekly_callouts(aligned);
        series.push(weekly);
    }

    let valid_py: Vec<usize> = aligned
        .monthly_py
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_some())
        .map(|(i, _)| i)
        .collect();
    if !valid_py.is_empty() {
        series.push(line(
            name_py.clone(),
            SeriesRole::MonthlyPy,
            1,
            points_at(&aligned.monthly_py, valid_py, |i| aligned.month_x(i), None),
            &THIN_PY,
        ));
    }

    series.extend(monthly_cy_series(aligned, segmentation, &name_cy, format));

    let weekly_values: Vec<Option<f64>> = aligned
        .weekly_cy
        .iter()
        .chain(aligned.weekly_py.iter())
        .copied()
        .collect();
    let monthly_values: Vec<Option<f64>> = aligned
        .monthly_cy
        .iter()
        .chain(aligned.monthly_py.iter())
        .copied()
        .collect();
    let (weekly_min, weekly_max) = safe_range(&weekly_values);
    let (monthly_min, monthly_max) = safe_range(&monthly_values);

    let total_labels = aligned.total_labels().max(1) as f64;
    let separator_x = aligned.semanas_count as f64 + 0.5;
    let mut graphics = vec![Overlay::Separator {
        x: separator_x,
        x_fraction: separator_x / total_labels,
        stroke: SEPARATOR_STROKE.to_string(),
        line_dash: vec![5, 5],
    }];

    if ctx.is_rgm {
        let width_fraction = aligned.semanas_count as f64 / total_labels;
        graphics.push(Overlay::RgmMask {
            width_fraction,
            fill: RGM_MASK_FILL.to_string(),
        });
        graphics.push(Overlay::Caption {
            text: RGM_CAPTION.to_string(),
            width_fraction,
        });
    }

    ChartSpec {
        title: ctx.titulo.clone(),
        x_axis: XAxis {
            labels: aligned.labels.clone(),
            rotate: if aligned.total_labels() > ROTATE_AFTER_LABELS { -45 } else { 0 },
        },
        y_axes: vec![
            YAxis {
                name: "Semanal".to_string(),
                min: weekly_min,
                max: weekly_max,
                show: !ctx.is_rgm,
                position: AxisPosition::Left,
            },
            YAxis {
                name: "Mensal".to_string(),
                min: monthly_min,
                max: monthly_max,
                show: true,
                position: AxisPosition::Right,
            },
        ],
        series,
        graphics,
        legend: vec![name_py, name_cy],
        value_format: format,
        kpi_panel: kpi_panel(kpis, ctx.is_rgm),
    }
}
