// src/models/wbr.rs

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

// Campos obrigatórios de um dataset WBR vindo da API
pub const REQUIRED_DATASET_FIELDS: [&str; 6] = [
    "semanas_cy",
    "semanas_py",
    "meses_cy",
    "meses_py",
    "ano_atual",
    "ano_anterior",
];

/// Série temporal esparsa: chave ISO-8601 -> valor (ou nulo), na ordem em que
/// veio da API, acompanhada do índice de datas na mesma ordem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SerieTemporal {
    #[serde(default, with = "ordered_values")]
    #[schema(value_type = Object)]
    pub metric_value: Vec<(String, Option<f64>)>,

    #[serde(default, deserialize_with = "deserialize_index")]
    #[schema(value_type = Vec<String>)]
    pub index: Vec<NaiveDate>,
}

impl SerieTemporal {
    /// Valores densos, na ordem das chaves
    pub fn values(&self) -> Vec<Option<f64>> {
        self.metric_value.iter().map(|(_, v)| *v).collect()
    }

    // Invariante: um valor por data do índice
    pub fn is_consistent(&self) -> bool {
        self.metric_value.len() == self.index.len()
    }
}

// 1. Dataset completo de um gráfico WBR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WbrDataset {
    pub semanas_cy: SerieTemporal,
    pub semanas_py: SerieTemporal,
    pub meses_cy: SerieTemporal,
    pub meses_py: SerieTemporal,
    pub ano_atual: i32,
    pub ano_anterior: i32,
    #[serde(default)]
    pub semana_parcial: bool,
    #[serde(default)]
    pub mes_parcial_cy: bool,
    #[serde(default)]
    pub mes_parcial_py: bool,
}

// 2. Erro de um gráfico específico (formato {error, status} da API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartErrorDescriptor {
    pub error: String,
    #[serde(default = "default_error_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

fn default_error_status() -> String {
    "error".to_string()
}

impl ChartErrorDescriptor {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: default_error_status(),
            error_type: None,
            details: None,
        }
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }
}

/// Resultado tipado da busca de um gráfico. Substitui a checagem estrutural
/// "é erro ou é dado?" por uma união explícita.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartPayload {
    Dataset(WbrDataset),
    Error(ChartErrorDescriptor),
    Malformed { missing: Vec<String> },
}

impl ChartPayload {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = &value else {
            return ChartPayload::Malformed {
                missing: REQUIRED_DATASET_FIELDS.iter().map(|f| f.to_string()).collect(),
            };
        };

        if map.contains_key("error") {
            return match serde_json::from_value::<ChartErrorDescriptor>(value) {
                Ok(descriptor) => ChartPayload::Error(descriptor),
                Err(e) => ChartPayload::Error(
                    ChartErrorDescriptor::new(format!("Erro ilegível retornado pela API: {e}"))
                        .with_type("DecodeError"),
                ),
            };
        }

        let missing: Vec<String> = REQUIRED_DATASET_FIELDS
            .iter()
            .filter(|field| !map.contains_key(**field))
            .map(|field| field.to_string())
            .collect();

        if !missing.is_empty() {
            return ChartPayload::Malformed { missing };
        }

        match serde_json::from_value::<WbrDataset>(value) {
            Ok(dataset) => ChartPayload::Dataset(dataset),
            Err(e) => ChartPayload::Error(
                ChartErrorDescriptor::new(format!("Dataset WBR inválido: {e}"))
                    .with_type("DecodeError"),
            ),
        }
    }
}

// 3. Filtros aplicados pelo usuário
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilters {
    /// Data de referência (YYYY-MM-DD)
    #[validate(custom(function = "validate_iso_date"))]
    pub data_referencia: Option<String>,

    #[validate(length(max = 64, message = "Shopping inválido."))]
    pub shopping: Option<String>,

    #[validate(length(max = 128, message = "Ramo inválido."))]
    pub ramo: Option<String>,

    #[validate(length(max = 128, message = "Categoria inválida."))]
    pub categoria: Option<String>,

    #[validate(length(max = 256, message = "Loja inválida."))]
    pub loja: Option<String>,
}

fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return Ok(());
    }
    let mut err = ValidationError::new("date");
    err.message = Some("A data de referência deve estar no formato AAAA-MM-DD.".into());
    Err(err)
}

/// Campos do filtro em cascata (shopping -> ramo -> categoria -> loja)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    DataReferencia,
    Shopping,
    Ramo,
    Categoria,
    Loja,
}

impl UserFilters {
    /// Strings vazias valem como "sem filtro"
    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }
        Self {
            data_referencia: clean(&self.data_referencia),
            shopping: clean(&self.shopping),
            ramo: clean(&self.ramo),
            categoria: clean(&self.categoria),
            loja: clean(&self.loja),
        }
    }

    // Pares de query string na ordem aceita pela API
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let normalized = self.normalized();
        [
            ("data_referencia", normalized.data_referencia),
            ("shopping", normalized.shopping),
            ("ramo", normalized.ramo),
            ("categoria", normalized.categoria),
            ("loja", normalized.loja),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }

    /// Forma serializada usada para detectar mudança de filtros
    pub fn cache_key(&self) -> String {
        self.query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.normalized()
            .data_referencia
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
    }

    /// Aplica a mudança de um campo limpando os filtros dependentes.
    pub fn with_change(&self, field: FilterField, value: Option<String>) -> Self {
        let mut next = self.clone();
        match field {
            FilterField::DataReferencia => next.data_referencia = value,
            FilterField::Shopping => {
                next.shopping = value;
                next.ramo = None;
                next.categoria = None;
                next.loja = None;
            }
            FilterField::Ramo => {
                next.ramo = value;
                next.categoria = None;
                next.loja = None;
            }
            FilterField::Categoria => {
                next.categoria = value;
                next.loja = None;
            }
            FilterField::Loja => next.loja = value,
        }
        next.normalized()
    }
}

// 4. Configuração de página
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default)]
    pub graficos: Vec<ChartRef>,
}

// A API pode listar só o id do gráfico ou um objeto com metadados
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChartRef {
    Id(String),
    Detailed(ChartRefDetail),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartRefDetail {
    #[serde(alias = "grafico_id")]
    pub id: String,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub unidade: Option<String>,
    #[serde(default)]
    pub rgm: Option<bool>,
}

/// Metadados de exibição informados pelo cliente para um gráfico avulso
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChartDisplayQuery {
    #[validate(length(min = 1, max = 200, message = "Título inválido."))]
    pub titulo: Option<String>,

    /// "%" formata valores e rótulos como percentual
    #[validate(length(max = 16, message = "Unidade inválida."))]
    pub unidade: Option<String>,

    /// Força (ou desliga) o modo RGM; sem valor, vale o id do gráfico
    pub rgm: Option<bool>,
}

/// Metadados de exibição de um gráfico
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChartMeta {
    pub grafico_id: String,
    pub titulo: String,
    pub unidade: String,
    pub is_rgm: bool,
}

impl ChartMeta {
    /// Gráficos RGM são identificados pelo id (ex.: "vendas_rgm")
    pub fn for_id(grafico_id: &str) -> Self {
        Self {
            grafico_id: grafico_id.to_string(),
            titulo: grafico_id.to_string(),
            unidade: String::new(),
            is_rgm: is_rgm_chart(grafico_id),
        }
    }

    /// Metadados do id, sobrescritos pelo que vier informado
    pub fn with_overrides(
        grafico_id: &str,
        titulo: Option<String>,
        unidade: Option<String>,
        rgm: Option<bool>,
    ) -> Self {
        let base = Self::for_id(grafico_id);
        Self {
            titulo: titulo.unwrap_or(base.titulo),
            unidade: unidade.unwrap_or(base.unidade),
            is_rgm: rgm.unwrap_or(base.is_rgm),
            grafico_id: base.grafico_id,
        }
    }
}

pub fn is_rgm_chart(grafico_id: &str) -> bool {
    grafico_id.to_lowercase().contains("rgm")
}

impl ChartRef {
    pub fn meta(&self) -> ChartMeta {
        match self {
            ChartRef::Id(id) => ChartMeta::for_id(id),
            ChartRef::Detailed(detail) => ChartMeta::with_overrides(
                &detail.id,
                detail.titulo.clone(),
                detail.unidade.clone(),
                detail.rgm,
            ),
        }
    }
}

// ---
// Serde: mapa ordenado de valores e índice de datas
// ---
mod ordered_values {
    use super::*;

    pub fn serialize<S>(values: &[(String, Option<f64>)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(values.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, Option<f64>)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedValuesVisitor)
    }

    struct OrderedValuesVisitor;

    impl<'de> Visitor<'de> for OrderedValuesVisitor {
        type Value = Vec<(String, Option<f64>)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("um objeto de data -> valor numérico")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut values = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, raw)) = access.next_entry::<String, Value>()? {
                values.push((key, numeric(&raw)));
            }
            Ok(values)
        }

        // null no lugar do objeto inteiro = série vazia
        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    // Números podem vir como string decimal em algumas views
    fn numeric(raw: &Value) -> Option<f64> {
        match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }
}

fn deserialize_index<'de, D>(deserializer: D) -> Result<Vec<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .iter()
        .map(|s| {
            parse_index_date(s)
                .ok_or_else(|| de::Error::custom(format!("data inválida no índice: '{s}'")))
        })
        .collect()
}

/// Aceita "2025-01-06", "2025-01-06T00:00:00", "2025-01-06T00:00:00.000Z"
/// e variações com offset. Só a data do calendário é usada.
pub fn parse_index_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset_json() -> Value {
        json!({
            "semanas_cy": {
                "metric_value": {"2025-02-10T00:00:00": 30.0, "2025-02-03T00:00:00": 20.0, "2025-02-17T00:00:00": null},
                "index": ["2025-02-10T00:00:00", "2025-02-03", "2025-02-17T00:00:00.000Z"]
            },
            "semanas_py": {"metric_value": {"2024-02-12": 10}, "index": ["2024-02-12"]},
            "meses_cy": {"metric_value": {"2025-01-01": "100.5"}, "index": ["2025-01-01"]},
            "meses_py": {"metric_value": {}, "index": []},
            "ano_atual": 2025,
            "ano_anterior": 2024,
            "semana_parcial": true
        })
    }

    #[test]
    fn dataset_keeps_key_order_and_parses_index() {
        let ChartPayload::Dataset(ds) = ChartPayload::from_value(dataset_json()) else {
            panic!("esperava dataset");
        };
        // A ordem é a da API, não a ordem alfabética
        assert_eq!(ds.semanas_cy.values(), vec![Some(30.0), Some(20.0), None]);
        assert_eq!(ds.semanas_cy.index[1], NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        assert_eq!(ds.semanas_cy.index[2], NaiveDate::from_ymd_opt(2025, 2, 17).unwrap());
        assert!(ds.semanas_cy.is_consistent());
        assert_eq!(ds.meses_cy.values(), vec![Some(100.5)]);
        assert!(ds.semana_parcial);
        assert!(!ds.mes_parcial_cy);
    }

    #[test]
    fn error_body_becomes_error_payload() {
        let payload = ChartPayload::from_value(json!({"error": "Tabela não encontrada", "status": "error", "error_type": "QueryExecutionException"}));
        match payload {
            ChartPayload::Error(d) => {
                assert_eq!(d.error, "Tabela não encontrada");
                assert_eq!(d.error_type.as_deref(), Some("QueryExecutionException"));
            }
            other => panic!("esperava erro, veio {other:?}"),
        }
    }

    #[test]
    fn missing_series_is_malformed() {
        let mut body = dataset_json();
        body.as_object_mut().unwrap().remove("meses_py");
        match ChartPayload::from_value(body) {
            ChartPayload::Malformed { missing } => assert_eq!(missing, vec!["meses_py".to_string()]),
            other => panic!("esperava malformado, veio {other:?}"),
        }
        assert!(matches!(
            ChartPayload::from_value(json!([1, 2, 3])),
            ChartPayload::Malformed { .. }
        ));
    }

    #[test]
    fn filters_normalize_and_cascade() {
        let filters = UserFilters {
            data_referencia: Some("2025-08-20".into()),
            shopping: Some("SIG".into()),
            ramo: Some("Moda".into()),
            categoria: Some("Calçados".into()),
            loja: Some("  ".into()),
        };
        assert_eq!(filters.normalized().loja, None);
        assert_eq!(
            filters.cache_key(),
            "data_referencia=2025-08-20&shopping=SIG&ramo=Moda&categoria=Calçados"
        );

        let changed = filters.with_change(FilterField::Shopping, Some("SBI".into()));
        assert_eq!(changed.shopping.as_deref(), Some("SBI"));
        assert_eq!(changed.ramo, None);
        assert_eq!(changed.categoria, None);
        assert_eq!(changed.data_referencia.as_deref(), Some("2025-08-20"));

        let changed = filters.with_change(FilterField::Ramo, Some("Alimentação".into()));
        assert_eq!(changed.shopping.as_deref(), Some("SIG"));
        assert_eq!(changed.categoria, None);
    }

    #[test]
    fn filters_validate_reference_date() {
        let ok = UserFilters { data_referencia: Some("2025-08-20".into()), ..Default::default() };
        assert!(ok.validate().is_ok());
        let bad = UserFilters { data_referencia: Some("20/08/2025".into()), ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn chart_ref_meta_detects_rgm() {
        let config: PageConfig = serde_json::from_value(json!({
            "page_id": "dashboard_vendas",
            "graficos": ["vendas_totais", {"id": "vendas_rgm", "titulo": "Vendas RGM", "unidade": "R$"}]
        }))
        .unwrap();
        let metas: Vec<ChartMeta> = config.graficos.iter().map(ChartRef::meta).collect();
        assert!(!metas[0].is_rgm);
        assert_eq!(metas[0].titulo, "vendas_totais");
        assert!(metas[1].is_rgm);
        assert_eq!(metas[1].titulo, "Vendas RGM");
        assert_eq!(metas[1].unidade, "R$");
    }
}
