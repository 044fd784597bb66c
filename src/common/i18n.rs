// src/common/i18n.rs

use std::collections::HashMap;

use crate::middleware::i18n::Locale;

pub const DEFAULT_LANG: &str = "pt";

// (chave, português, inglês)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("invalid_token", "Token de autenticação inválido ou ausente.", "Invalid or missing authentication token."),
    ("upstream_unavailable", "Não foi possível comunicar com a API WBR.", "Could not reach the WBR API."),
    ("upstream_status", "A API WBR retornou um erro.", "The WBR API returned an error."),
    ("decode", "Resposta inesperada da API WBR.", "Unexpected response from the WBR API."),
    ("empty_page", "Página não possui gráficos configurados", "Page has no configured charts"),
    ("config_fetch", "Erro ao carregar configuração da página", "Failed to load page configuration"),
    ("chart_unavailable", "Erro ao carregar dados do gráfico.", "Failed to load chart data."),
    ("malformed_dataset", "Dados do gráfico incompletos.", "Chart data is incomplete."),
    ("session_not_started", "Nenhum carregamento iniciado para esta página.", "No load has been started for this page."),
    ("invalid_date", "Data inválida. Use DD/MM/AAAA ou AAAA-MM-DD.", "Invalid date. Use DD/MM/YYYY or YYYY-MM-DD."),
    ("no_available_dates", "Nenhuma data disponível.", "No available dates."),
    ("filter_store", "Não foi possível salvar os filtros.", "Could not persist filters."),
    ("internal", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
];

/// Mensagens de erro por idioma
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();
        for &(key, pt, en) in MESSAGES {
            messages.entry("pt").or_default().insert(key, pt);
            messages.entry("en").or_default().insert(key, en);
        }
        Self { messages }
    }

    /// Traduz a chave; idioma desconhecido cai no português e chave
    /// desconhecida volta como está.
    pub fn translate(&self, locale: &Locale, key: &str) -> String {
        self.messages
            .get(locale.0.as_str())
            .or_else(|| self.messages.get(DEFAULT_LANG))
            .and_then(|table| table.get(key))
            .map(|m| m.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}
