// src/models/instagram.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_TOP_POSTS_LIMIT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InstagramFollowers {
    #[serde(default)]
    pub shopping: Option<String>,
    #[serde(default, alias = "DATA")]
    pub data: Option<String>,
    #[serde(default, alias = "METRICA")]
    pub metrica: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

// Métricas agregadas de engajamento por shopping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InstagramEngagement {
    #[serde(default)]
    pub shopping: Option<String>,
    #[serde(default)]
    pub total_likes: Option<f64>,
    #[serde(default)]
    pub total_alcance: Option<f64>,
    #[serde(default)]
    pub total_impressoes: Option<f64>,
    #[serde(default)]
    pub total_comentarios: Option<f64>,
    #[serde(default)]
    pub total_compartilhamentos: Option<f64>,
    #[serde(default)]
    pub total_salvos: Option<f64>,
    #[serde(default)]
    pub engajamento_total: Option<f64>,
    #[serde(default)]
    pub total_posts: Option<f64>,
    #[serde(default)]
    pub engajamento_total_mes: Option<f64>,
    #[serde(default)]
    pub engajamento_medio_dia: Option<f64>,
    #[serde(default)]
    pub dias_disponiveis: Option<f64>,
    #[serde(default)]
    pub alcance_total_mes: Option<f64>,
    #[serde(default)]
    pub alcance_medio_dia: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InstagramKpis {
    #[serde(default)]
    pub seguidores: Vec<InstagramFollowers>,
    #[serde(default)]
    pub engagement: Vec<InstagramEngagement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InstagramTopPost {
    #[serde(default)]
    pub shopping: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub link_foto: Option<String>,
    #[serde(default)]
    pub link_insta: Option<String>,
    #[serde(default)]
    pub total_likes: Option<f64>,
    #[serde(default)]
    pub total_comentarios: Option<f64>,
    #[serde(default)]
    pub total_compartilhamentos: Option<f64>,
    #[serde(default)]
    pub total_salvos: Option<f64>,
    #[serde(default)]
    pub engajamento_total: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopPostsResponse {
    #[serde(default)]
    pub posts: Vec<InstagramTopPost>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstagramQuery {
    pub data_referencia: Option<String>,
    pub shopping: Option<String>,
    #[validate(range(min = 1, max = 50, message = "O limite deve estar entre 1 e 50."))]
    pub limit: Option<u32>,
}

/// Painel do Instagram: cada widget tem o seu próprio slot de erro
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct InstagramPanel {
    pub kpis: Option<InstagramKpis>,
    pub kpis_error: Option<String>,
    pub top_posts: Option<Vec<InstagramTopPost>>,
    pub top_posts_error: Option<String>,
}
