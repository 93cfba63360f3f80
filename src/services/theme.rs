//! Theme service
//!
//! Read-only access to the seeded themes, served from the cache after the
//! first lookup.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::ThemeRepository;
use crate::models::Theme;
use crate::services::error::{ServiceError, ServiceResult};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Cache key for the full theme list
const CACHE_KEY_THEMES: &str = "themes:all";

/// Default cache TTL for themes (1 hour)
const THEME_CACHE_TTL_SECS: u64 = 3600;

/// Theme service
pub struct ThemeService {
    repo: Arc<dyn ThemeRepository>,
    cache: Arc<MemoryCache>,
    cache_ttl: Duration,
}

impl ThemeService {
    pub fn new(repo: Arc<dyn ThemeRepository>, cache: Arc<MemoryCache>) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(THEME_CACHE_TTL_SECS),
        }
    }

    /// All themes ordered by id
    pub async fn list(&self) -> ServiceResult<Vec<Theme>> {
        if let Some(themes) = self
            .cache
            .get::<Vec<Theme>>(CACHE_KEY_THEMES)
            .await
            .ok()
            .flatten()
        {
            return Ok(themes);
        }

        let themes = self.repo.list().await.context("Failed to list themes")?;
        if let Err(e) = self.cache.set(CACHE_KEY_THEMES, &themes, self.cache_ttl).await {
            tracing::warn!("Failed to cache themes: {}", e);
        }

        Ok(themes)
    }

    /// Look up a theme, `None` if the id is unknown
    pub async fn find(&self, id: i64) -> ServiceResult<Option<Theme>> {
        let themes = self.list().await?;
        Ok(themes.into_iter().find(|t| t.id == id))
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Theme> {
        self.find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Theme not found"))
    }
}
