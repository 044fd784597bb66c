// src/repo/filter_store.rs

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use tokio::{fs, sync::{Mutex, RwLock}};

use crate::{
    common::error::AppError,
    models::{auth::AuthToken, wbr::UserFilters},
};

// Chave fixa dos filtros salvos
pub const FILTERS_STORAGE_KEY: &str = "mapa_do_bosque.filtros";

/// Chave por usuário: prefixo fixo + SHA-256 do token
pub fn storage_key(token: &AuthToken) -> String {
    format!("{}:{}", FILTERS_STORAGE_KEY, token.fingerprint())
}

/// Último conjunto de filtros usado, lido ao abrir a página e gravado a cada mudança.
#[async_trait]
pub trait FilterStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<UserFilters>, AppError>;
    async fn save(&self, key: &str, filters: &UserFilters) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct InMemoryFilterStore {
    entries: RwLock<HashMap<String, UserFilters>>,
}

impl InMemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FilterStore for InMemoryFilterStore {
    async fn load(&self, key: &str) -> Result<Option<UserFilters>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, filters: &UserFilters) -> Result<(), AppError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), filters.clone());
        Ok(())
    }
}

/// Um único arquivo JSON com um objeto por chave
pub struct JsonFileFilterStore {
    path: PathBuf,
    // Serializa leitura-modificação-escrita do arquivo
    lock: Mutex<()>,
}

impl JsonFileFilterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<HashMap<String, UserFilters>, AppError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content).map_err(std::io::Error::other)?)
    }
}

#[async_trait]
impl FilterStore for JsonFileFilterStore {
    async fn load(&self, key: &str) -> Result<Option<UserFilters>, AppError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn save(&self, key: &str, filters: &UserFilters) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        all.insert(key.to_string(), filters.normalized());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        // Grava em arquivo temporário e renomeia para não deixar JSON pela metade
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&all).map_err(std::io::Error::other)?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
