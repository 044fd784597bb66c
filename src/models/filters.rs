// src/models/filters.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::wbr::FilterField;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShoppingOption {
    pub value: String,
    pub label: String,
}

/// Todas as opções de filtro disponíveis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterOptions {
    #[serde(default)]
    pub datas: Vec<String>,
    #[serde(default)]
    pub shoppings: Vec<ShoppingOption>,
    #[serde(default)]
    pub ramos: Vec<String>,
    #[serde(default)]
    pub categorias: Vec<String>,
    #[serde(default)]
    pub lojas: Vec<String>,
}

// Opções filtradas pela cascata; listas ausentes não mudam
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilteredOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramos: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorias: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lojas: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CascadeQuery {
    #[validate(length(max = 64, message = "Shopping inválido."))]
    pub shopping: Option<String>,
    #[validate(length(max = 128, message = "Ramo inválido."))]
    pub ramo: Option<String>,
    #[validate(length(max = 128, message = "Categoria inválida."))]
    pub categoria: Option<String>,
}

impl CascadeQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("shopping", &self.shopping),
            ("ramo", &self.ramo),
            ("categoria", &self.categoria),
        ]
        .into_iter()
        .filter_map(|(k, v)| {
            v.as_ref()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| (k, s.to_string()))
        })
        .collect()
    }
}

// Resposta crua de /wbr/filters/available-dates/
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamDates {
    #[serde(default)]
    pub dates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AvailableDates {
    /// Datas disponíveis, da mais recente para a mais antiga
    pub dates: Vec<String>,
    pub count: usize,
    pub default_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResolveDateQuery {
    /// Data digitada pelo usuário (DD/MM/AAAA ou AAAA-MM-DD)
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResolvedDate {
    /// Entrada após a máscara DD/MM/AAAA
    pub masked: String,
    pub parsed: Option<String>,
    /// Data disponível mais próxima
    pub data_referencia: Option<String>,
    pub snapped: bool,
}

/// Mudança de um campo do filtro (aplica a cascata)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterChange {
    pub field: FilterField,
    pub value: Option<String>,
}
