// src/services/instagram_service.rs

use std::sync::Arc;

use tracing::warn;

use crate::{
    common::error::AppError,
    models::{
        auth::AuthToken,
        instagram::{InstagramKpis, InstagramPanel, InstagramQuery, InstagramTopPost, DEFAULT_TOP_POSTS_LIMIT},
    },
    repo::WbrRepository,
};

#[derive(Clone)]
pub struct InstagramService {
    repo: Arc<dyn WbrRepository>,
}

impl InstagramService {
    pub fn new(repo: Arc<dyn WbrRepository>) -> Self {
        Self { repo }
    }

    pub async fn kpis(&self, query: &InstagramQuery, token: &AuthToken) -> Result<InstagramKpis, AppError> {
        self.repo
            .instagram_kpis(query.data_referencia.as_deref(), query.shopping.as_deref(), token)
            .await
    }

    pub async fn top_posts(
        &self,
        query: &InstagramQuery,
        token: &AuthToken,
    ) -> Result<Vec<InstagramTopPost>, AppError> {
        self.repo
            .instagram_top_posts(
                query.data_referencia.as_deref(),
                query.shopping.as_deref(),
                query.limit.unwrap_or(DEFAULT_TOP_POSTS_LIMIT),
                token,
            )
            .await
    }

    /// KPIs e top posts em paralelo; a falha de um não derruba o outro
    pub async fn panel(&self, query: &InstagramQuery, token: &AuthToken) -> InstagramPanel {
        let (kpis, top_posts) = tokio::join!(self.kpis(query, token), self.top_posts(query, token));

        let mut panel = InstagramPanel::default();
        match kpis {
            Ok(kpis) => panel.kpis = Some(kpis),
            Err(e) => {
                warn!("⚠️ KPIs do Instagram indisponíveis: {}", e);
                panel.kpis_error = Some(e.to_string());
            }
        }
        match top_posts {
            Ok(posts) => panel.top_posts = Some(posts),
            Err(e) => {
                warn!("⚠️ Top posts do Instagram indisponíveis: {}", e);
                panel.top_posts_error = Some(e.to_string());
            }
        }
        panel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::fake::FakeWbrRepository;

    fn query() -> InstagramQuery {
        InstagramQuery {
            data_referencia: Some("2025-08-20".into()),
            shopping: Some("SIG".into()),
            limit: None,
        }
    }

    #[tokio::test]
    async fn panel_uses_default_limit() {
        let service = InstagramService::new(Arc::new(FakeWbrRepository::default()));
        let panel = service.panel(&query(), &AuthToken::new("t")).await;

        assert_eq!(panel.top_posts.unwrap().len(), DEFAULT_TOP_POSTS_LIMIT as usize);
        let kpis = panel.kpis.unwrap();
        assert_eq!(kpis.engagement[0].shopping.as_deref(), Some("SIG"));
        assert!(panel.kpis_error.is_none() && panel.top_posts_error.is_none());
    }

    #[tokio::test]
    async fn widget_failures_are_independent() {
        let mut fake = FakeWbrRepository::default();
        fake.top_posts_fail = true;
        let service = InstagramService::new(Arc::new(fake));
        let panel = service.panel(&query(), &AuthToken::new("t")).await;
        assert!(panel.kpis.is_some());
        assert!(panel.top_posts.is_none());
        assert!(panel.top_posts_error.is_some());

        let mut fake = FakeWbrRepository::default();
        fake.instagram_fails = true;
        let service = InstagramService::new(Arc::new(fake));
        let panel = service.panel(&query(), &AuthToken::new("t")).await;
        assert!(panel.kpis_error.is_some());
        assert_eq!(panel.top_posts.map(|p| p.len()), Some(3));
    }
}
