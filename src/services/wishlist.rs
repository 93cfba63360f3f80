//! Wishlist service
//!
//! Wishlist CRUD, ownership checks and the share-token lookup behind the
//! public view.

use crate::db::repositories::{ItemRepository, LinkRepository, WishlistRepository};
use crate::models::{
    CreateWishlistInput, ItemWithLinks, UpdateWishlistInput, Wishlist, WishlistDetails,
    WishlistSummary,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::image_storage::ImageStorage;
use crate::services::theme::ThemeService;
use crate::services::validation::{self, MAX_WISHLISTS_PER_USER};
use anyhow::Context;
use std::sync::Arc;
use uuid::Uuid;

/// Wishlist service
pub struct WishlistService {
    wishlist_repo: Arc<dyn WishlistRepository>,
    item_repo: Arc<dyn ItemRepository>,
    link_repo: Arc<dyn LinkRepository>,
    themes: Arc<ThemeService>,
    images: Arc<dyn ImageStorage>,
}

impl WishlistService {
    pub fn new(
        wishlist_repo: Arc<dyn WishlistRepository>,
        item_repo: Arc<dyn ItemRepository>,
        link_repo: Arc<dyn LinkRepository>,
        themes: Arc<ThemeService>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            wishlist_repo,
            item_repo,
            link_repo,
            themes,
            images,
        }
    }

    /// Create a wishlist with a fresh share token.
    pub async fn create(&self, user_id: i64, mut input: CreateWishlistInput) -> ServiceResult<Wishlist> {
        input.title = input.title.trim().to_string();
        input.description = normalize_description(input.description);
        validation::validate_wishlist(&input.title, input.description.as_deref())?;
        self.ensure_theme_exists(input.theme_id).await?;

        let count = self
            .wishlist_repo
            .count_by_user(user_id)
            .await
            .context("Failed to count wishlists")?;
        if count >= MAX_WISHLISTS_PER_USER {
            return Err(ServiceError::validation(format!(
                "You can have at most {} wishlists",
                MAX_WISHLISTS_PER_USER
            )));
        }

        let wishlist = Wishlist::new(input, user_id, Uuid::new_v4().to_string());
        let created = self
            .wishlist_repo
            .create(&wishlist)
            .await
            .context("Failed to create wishlist")?;

        tracing::info!("Wishlist {} created by user {}", created.id, user_id);
        Ok(created)
    }

    /// The user's wishlists, newest first, with theme and item count
    pub async fn list_for_user(&self, user_id: i64) -> ServiceResult<Vec<WishlistSummary>> {
        let wishlists = self
            .wishlist_repo
            .list_by_user(user_id)
            .await
            .context("Failed to list wishlists")?;

        let mut summaries = Vec::with_capacity(wishlists.len());
        for wishlist in wishlists {
            let item_count = self
                .item_repo
                .count_by_wishlist(wishlist.id)
                .await
                .context("Failed to count items")?;
            let theme = self.themes.find(wishlist.theme_id).await?;
            summaries.push(WishlistSummary {
                wishlist,
                theme,
                item_count,
            });
        }

        Ok(summaries)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Wishlist> {
        self.wishlist_repo
            .get_by_id(id)
            .await
            .context("Failed to get wishlist")?
            .ok_or_else(|| ServiceError::not_found("Wishlist not found"))
    }

    /// Wishlist with theme, items and links
    pub async fn get_details(&self, id: i64) -> ServiceResult<WishlistDetails> {
        let wishlist = self.get(id).await?;
        self.details(wishlist).await
    }

    /// Public lookup. The token is the only credential, so an unknown token
    /// and a malformed one look the same.
    pub async fn get_by_share_token(&self, token: &str) -> ServiceResult<WishlistDetails> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::not_found("Wishlist not found"));
        }

        let wishlist = self
            .wishlist_repo
            .get_by_share_token(token)
            .await
            .context("Failed to get wishlist by share token")?
            .ok_or_else(|| ServiceError::not_found("Wishlist not found"))?;

        self.details(wishlist).await
    }

    /// Load the wishlist and check that `user_id` owns it
    pub async fn ensure_owner(&self, id: i64, user_id: i64) -> ServiceResult<Wishlist> {
        let wishlist = self.get(id).await?;
        if !wishlist.is_owned_by(user_id) {
            return Err(ServiceError::forbidden("Access denied"));
        }
        Ok(wishlist)
    }

    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        input: UpdateWishlistInput,
    ) -> ServiceResult<Wishlist> {
        let mut wishlist = self.ensure_owner(id, user_id).await?;

        let title = input.title.trim().to_string();
        let description = normalize_description(input.description);
        validation::validate_wishlist(&title, description.as_deref())?;
        if input.theme_id != wishlist.theme_id {
            self.ensure_theme_exists(input.theme_id).await?;
        }

        wishlist.title = title;
        wishlist.description = description;
        wishlist.event_date = input.event_date;
        wishlist.theme_id = input.theme_id;

        let updated = self
            .wishlist_repo
            .update(&wishlist)
            .await
            .context("Failed to update wishlist")?;

        Ok(updated)
    }

    /// Delete a wishlist and everything in it, including stored item images
    pub async fn delete(&self, id: i64, user_id: i64) -> ServiceResult<()> {
        self.ensure_owner(id, user_id).await?;

        let images: Vec<String> = self
            .item_repo
            .list_by_wishlist(id)
            .await
            .context("Failed to list items")?
            .into_iter()
            .filter_map(|item| item.image_url)
            .collect();

        let deleted = self
            .wishlist_repo
            .delete(id)
            .await
            .context("Failed to delete wishlist")?;
        if !deleted {
            return Err(ServiceError::not_found("Wishlist not found"));
        }

        for url in images {
            self.images.delete(&url).await;
        }

        tracing::info!("Wishlist {} deleted by user {}", id, user_id);
        Ok(())
    }

    async fn details(&self, wishlist: Wishlist) -> ServiceResult<WishlistDetails> {
        let theme = self.themes.find(wishlist.theme_id).await?;
        let items = self.items_with_links(wishlist.id).await?;
        Ok(WishlistDetails {
            wishlist,
            theme,
            items,
        })
    }

    async fn items_with_links(&self, wishlist_id: i64) -> ServiceResult<Vec<ItemWithLinks>> {
        let items = self
            .item_repo
            .list_by_wishlist(wishlist_id)
            .await
            .context("Failed to list items")?;

        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let links = self
                .link_repo
                .list_by_item(item.id)
                .await
                .context("Failed to list links")?;
            result.push(ItemWithLinks { item, links });
        }
        Ok(result)
    }

    async fn ensure_theme_exists(&self, theme_id: i64) -> ServiceResult<()> {
        match self.themes.find(theme_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::validation("Selected theme does not exist")),
        }
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
