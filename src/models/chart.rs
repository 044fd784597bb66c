// src/models/chart.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::wbr::{format::ValueFormat, kpi::KpiSet};

// Especificação declarativa de um gráfico WBR. Qualquer biblioteca de
// gráficos de linha com eixo duplo e overlays consegue desenhá-la.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: XAxis,
    pub y_axes: Vec<YAxis>,
    pub series: Vec<LineSeries>,
    pub graphics: Vec<Overlay>,
    pub legend: Vec<String>,
    pub value_format: ValueFormat,
    pub kpi_panel: Vec<KpiCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct XAxis {
    pub labels: Vec<String>,
    /// Rotação dos rótulos em graus (0 ou -45)
    pub rotate: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AxisPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct YAxis {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub show: bool,
    pub position: AxisPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeriesRole {
    WeeklyPy,
    WeeklyCy,
    MonthlyPy,
    MonthlyCy,
    MonthlyCyPartial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
    #[serde(rename = "type")]
    pub line_type: LineType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    None,
    Circle,
    Diamond,
}

/// Ponto posicionado no eixo X categórico (índice do rótulo)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DataPoint {
    pub x: usize,
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// Variação YoY desenhada acima do ponto semanal
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct YoyCallout {
    pub x: usize,
    pub y: f64,
    pub text: String,
    pub color: String,
    pub offset_y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LineSeries {
    pub name: String,
    pub role: SeriesRole,
    pub y_axis_index: usize,
    pub points: Vec<DataPoint>,
    pub line_style: LineStyle,
    pub item_color: String,
    pub symbol: Symbol,
    pub symbol_size: u32,
    pub smooth: bool,
    pub show_labels: bool,
    pub label_font_size: u32,
    pub callouts: Vec<YoyCallout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    /// Linha tracejada entre o bloco semanal e o mensal
    Separator {
        x: f64,
        x_fraction: f64,
        stroke: String,
        line_dash: Vec<u32>,
    },
    /// Retângulo cinza sobre a região semanal de gráficos RGM
    RgmMask { width_fraction: f64, fill: String },
    Caption { text: String, width_fraction: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct KpiCell {
    pub header: String,
    pub value: String,
    pub color: String,
}

/// Gráfico pronto para exibição: especificação + KPIs + metadados
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartView {
    pub grafico_id: String,
    pub titulo: String,
    pub unidade: String,
    pub is_rgm: bool,
    #[schema(value_type = String, format = Date)]
    pub data_referencia: chrono::NaiveDate,
    pub semana_parcial: bool,
    pub mes_parcial_cy: bool,
    pub mes_parcial_py: bool,
    pub spec: ChartSpec,
    pub kpis: KpiSet,
}
