//! Link service
//!
//! Purchase links on individual items, and link suggestions from the
//! product search.

use crate::db::repositories::LinkRepository;
use crate::models::{ItemLink, LinkInput};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::item::ItemService;
use crate::services::product_search::{ProductSearch, ProductSuggestion};
use crate::services::validation::{self, MAX_LINKS_PER_ITEM};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Link service
pub struct LinkService {
    link_repo: Arc<dyn LinkRepository>,
    items: Arc<ItemService>,
    search: Arc<dyn ProductSearch>,
}

impl LinkService {
    pub fn new(
        link_repo: Arc<dyn LinkRepository>,
        items: Arc<ItemService>,
        search: Arc<dyn ProductSearch>,
    ) -> Self {
        Self {
            link_repo,
            items,
            search,
        }
    }

    /// Attach a link to one of the caller's items.
    ///
    /// The first link an item gets becomes its selected link.
    pub async fn add(&self, user_id: i64, item_id: i64, input: LinkInput) -> ServiceResult<ItemLink> {
        let url = input.url.trim().to_string();
        if url.is_empty() {
            return Err(ServiceError::validation("Link URL is required"));
        }
        validation::validate_link_url(&url)?;

        let item = self.items.ensure_owner(item_id, user_id).await?;

        let count = self
            .link_repo
            .count_by_item(item.id)
            .await
            .context("Failed to count links")?;
        if count >= MAX_LINKS_PER_ITEM as i64 {
            return Err(ServiceError::validation(format!(
                "An item can have at most {} links",
                MAX_LINKS_PER_ITEM
            )));
        }

        let link = ItemLink {
            id: 0,
            url,
            title: input.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            price: input.price,
            is_from_ai: input.is_from_ai,
            is_selected: false,
            item_id: item.id,
            created_at: Utc::now(),
        };
        let mut created = self
            .link_repo
            .create(&link)
            .await
            .context("Failed to create link")?;

        if count == 0 {
            self.link_repo
                .set_selected(item.id, created.id)
                .await
                .context("Failed to select link")?;
            created.is_selected = true;
        }

        Ok(created)
    }

    /// Make `link_id` the item's selected link
    pub async fn select(&self, user_id: i64, link_id: i64) -> ServiceResult<ItemLink> {
        let mut link = self.find(link_id).await?;
        self.items.ensure_owner(link.item_id, user_id).await?;

        self.link_repo
            .set_selected(link.item_id, link.id)
            .await
            .context("Failed to select link")?;
        link.is_selected = true;
        Ok(link)
    }

    pub async fn delete(&self, user_id: i64, link_id: i64) -> ServiceResult<()> {
        let link = self.find(link_id).await?;
        self.items.ensure_owner(link.item_id, user_id).await?;

        let deleted = self
            .link_repo
            .delete(link.id)
            .await
            .context("Failed to delete link")?;
        if !deleted {
            return Err(ServiceError::not_found("Link not found"));
        }
        Ok(())
    }

    /// Store search links for an item title
    pub async fn suggest(&self, title: &str) -> ServiceResult<Vec<ProductSuggestion>> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::validation("Item title is required"));
        }
        Ok(self.search.search(title).await)
    }

    async fn find(&self, link_id: i64) -> ServiceResult<ItemLink> {
        self.link_repo
            .get_by_id(link_id)
            .await
            .context("Failed to get link")?
            .ok_or_else(|| ServiceError::not_found("Link not found"))
    }
}
