//! Item service
//!
//! Items, their purchase links and images, plus the reservation flow.
//!
//! Reservation goes through the repository's conditional updates, so two
//! guests racing for the same item cannot both win.

use crate::db::repositories::{ItemRepository, LinkRepository, WishlistRepository};
use crate::models::{
    CreateItemInput, ItemLink, ItemWithLinks, LinkInput, ReservationState, UpdateItemInput,
    WishlistItem,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::image_storage::ImageStorage;
use crate::services::validation::{self, MAX_ITEMS_PER_WISHLIST, MAX_LINKS_PER_ITEM};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Image supplied with an item form
///
/// `data` is a base64 data URL to store, `url` an already hosted image.
/// `data` wins when both are present. Blank values count as absent.
#[derive(Debug, Clone, Default)]
pub struct ImageInput {
    pub data: Option<String>,
    pub url: Option<String>,
}

impl ImageInput {
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            url: None,
        }
    }

    fn data_url(&self) -> Option<&str> {
        self.data.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    fn plain_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// Pick the link to mark as selected.
///
/// Preference order: suggested and selected, suggested, user-supplied and
/// selected, user-supplied, first.
pub fn pick_selected_link(links: &[ItemLink]) -> Option<&ItemLink> {
    links
        .iter()
        .find(|l| l.is_from_ai && l.is_selected)
        .or_else(|| links.iter().find(|l| l.is_from_ai))
        .or_else(|| links.iter().find(|l| !l.is_from_ai && l.is_selected))
        .or_else(|| links.iter().find(|l| !l.is_from_ai))
        .or_else(|| links.first())
}

/// Item service
pub struct ItemService {
    item_repo: Arc<dyn ItemRepository>,
    link_repo: Arc<dyn LinkRepository>,
    wishlist_repo: Arc<dyn WishlistRepository>,
    images: Arc<dyn ImageStorage>,
}

impl ItemService {
    pub fn new(
        item_repo: Arc<dyn ItemRepository>,
        link_repo: Arc<dyn LinkRepository>,
        wishlist_repo: Arc<dyn WishlistRepository>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            item_repo,
            link_repo,
            wishlist_repo,
            images,
        }
    }

    /// Add an item to one of the caller's wishlists.
    ///
    /// A stored image is removed again if anything after the upload fails.
    pub async fn create(
        &self,
        user_id: i64,
        input: CreateItemInput,
        image: ImageInput,
    ) -> ServiceResult<ItemWithLinks> {
        validation::validate_item(&input.title, input.price, input.desire_level)?;
        let links = prepare_links(input.links.clone())?;

        let wishlist = self
            .wishlist_repo
            .get_by_id(input.wishlist_id)
            .await
            .context("Failed to get wishlist")?
            .ok_or_else(|| ServiceError::not_found("Wishlist not found"))?;
        if !wishlist.is_owned_by(user_id) {
            return Err(ServiceError::forbidden("Access denied"));
        }

        let count = self
            .item_repo
            .count_by_wishlist(wishlist.id)
            .await
            .context("Failed to count items")?;
        if count >= MAX_ITEMS_PER_WISHLIST {
            return Err(ServiceError::validation(format!(
                "A wishlist can hold at most {} items",
                MAX_ITEMS_PER_WISHLIST
            )));
        }

        let stored_image = match image.data_url() {
            Some(data) => Some(self.images.save_base64(data).await?),
            None => None,
        };
        let image_url = stored_image
            .clone()
            .or_else(|| image.plain_url().map(str::to_string));

        let item = WishlistItem::new(&input, image_url);
        let created = match self.item_repo.create(&item).await {
            Ok(created) => created,
            Err(e) => {
                self.discard_image(stored_image).await;
                return Err(ServiceError::Internal(e.context("Failed to create item")));
            }
        };

        let links = match self.replace_links(created.id, links).await {
            Ok(links) => links,
            Err(e) => {
                if let Err(cleanup) = self.item_repo.delete(created.id).await {
                    tracing::warn!("Failed to roll back item {}: {}", created.id, cleanup);
                }
                self.discard_image(stored_image).await;
                return Err(e);
            }
        };

        tracing::info!(
            "Item {} added to wishlist {} by user {}",
            created.id,
            wishlist.id,
            user_id
        );
        Ok(ItemWithLinks {
            item: created,
            links,
        })
    }

    /// Item with links, visible to the wishlist owner only.
    ///
    /// Anyone else gets "not found" so item ids cannot be guessed.
    pub async fn get(&self, item_id: i64, user_id: i64) -> ServiceResult<ItemWithLinks> {
        let item = self.find(item_id).await?;
        let owns = self
            .wishlist_repo
            .user_owns(item.wishlist_id, user_id)
            .await
            .context("Failed to check wishlist ownership")?;
        if !owns {
            return Err(ServiceError::not_found("Item not found"));
        }

        let links = self.links(item.id).await?;
        Ok(ItemWithLinks { item, links })
    }

    /// Load the item and check that `user_id` owns its wishlist
    pub async fn ensure_owner(&self, item_id: i64, user_id: i64) -> ServiceResult<WishlistItem> {
        let item = self.find(item_id).await?;
        let owns = self
            .wishlist_repo
            .user_owns(item.wishlist_id, user_id)
            .await
            .context("Failed to check wishlist ownership")?;
        if !owns {
            return Err(ServiceError::forbidden("Access denied"));
        }
        Ok(item)
    }

    /// Update an item. `links: Some(..)` replaces every link.
    ///
    /// A blank image keeps the current one. A replaced image that was stored
    /// locally is deleted after the update succeeds.
    pub async fn update(
        &self,
        item_id: i64,
        user_id: i64,
        input: UpdateItemInput,
        image: ImageInput,
    ) -> ServiceResult<ItemWithLinks> {
        let mut item = self.ensure_owner(item_id, user_id).await?;
        validation::validate_item(&input.title, input.price, input.desire_level)?;
        let links = input.links.map(prepare_links).transpose()?;

        let stored_image = match image.data_url() {
            Some(data) => Some(self.images.save_base64(data).await?),
            None => None,
        };
        let previous_image = item.image_url.clone();
        if let Some(url) = stored_image
            .clone()
            .or_else(|| image.plain_url().map(str::to_string))
        {
            item.image_url = Some(url);
        }

        item.title = input.title.trim().to_string();
        item.description = input.description;
        item.price = input.price;
        item.desire_level = input.desire_level;
        item.comment = input.comment;

        let result = async {
            let updated = self
                .item_repo
                .update(&item)
                .await
                .context("Failed to update item")?;
            let links = match links {
                Some(links) => self.replace_links(updated.id, links).await?,
                None => self.links(updated.id).await?,
            };
            Ok::<_, ServiceError>(ItemWithLinks {
                item: updated,
                links,
            })
        }
        .await;

        match result {
            Ok(updated) => {
                if let Some(old) = previous_image {
                    if updated.item.image_url.as_deref() != Some(old.as_str()) {
                        self.images.delete(&old).await;
                    }
                }
                Ok(updated)
            }
            Err(e) => {
                self.discard_image(stored_image).await;
                Err(e)
            }
        }
    }

    /// Delete an item with its links and stored image
    pub async fn delete(&self, item_id: i64, user_id: i64) -> ServiceResult<()> {
        let item = self.ensure_owner(item_id, user_id).await?;

        self.link_repo
            .delete_by_item(item.id)
            .await
            .context("Failed to delete links")?;
        let deleted = self
            .item_repo
            .delete(item.id)
            .await
            .context("Failed to delete item")?;
        if !deleted {
            return Err(ServiceError::not_found("Item not found"));
        }

        if let Some(url) = item.image_url {
            self.images.delete(&url).await;
        }
        Ok(())
    }

    /// Reserve an unreserved item for `user_id`
    pub async fn reserve(&self, item_id: i64, user_id: i64) -> ServiceResult<()> {
        let item = self.find(item_id).await?;
        if let ReservationState::Reserved { .. } = item.reservation() {
            return Err(ServiceError::validation("Item is already reserved"));
        }

        let reserved = self
            .item_repo
            .reserve(item_id, user_id)
            .await
            .context("Failed to reserve item")?;
        if !reserved {
            // Lost the race to another reserver
            return Err(ServiceError::validation("Item is already reserved"));
        }

        tracing::debug!("Item {} reserved", item_id);
        Ok(())
    }

    /// Release a reservation. Only the user holding it may do so.
    pub async fn unreserve(&self, item_id: i64, user_id: i64) -> ServiceResult<()> {
        let item = self.find(item_id).await?;
        if !item.is_reserved_by(user_id) {
            return Err(ServiceError::forbidden("You cannot release this item"));
        }

        let released = self
            .item_repo
            .unreserve(item_id, user_id)
            .await
            .context("Failed to release item")?;
        if !released {
            return Err(ServiceError::forbidden("You cannot release this item"));
        }

        tracing::debug!("Item {} released", item_id);
        Ok(())
    }

    /// Store an uploaded image file and return its URL
    pub async fn upload_image(&self, bytes: &[u8], content_type: &str) -> ServiceResult<String> {
        self.images.save_bytes(bytes, content_type).await
    }

    async fn discard_image(&self, url: Option<String>) {
        if let Some(url) = url {
            self.images.delete(&url).await;
        }
    }

    async fn find(&self, item_id: i64) -> ServiceResult<WishlistItem> {
        self.item_repo
            .get_by_id(item_id)
            .await
            .context("Failed to get item")?
            .ok_or_else(|| ServiceError::not_found("Item not found"))
    }

    async fn links(&self, item_id: i64) -> ServiceResult<Vec<ItemLink>> {
        let links = self
            .link_repo
            .list_by_item(item_id)
            .await
            .context("Failed to list links")?;
        Ok(links)
    }

    /// Swap the item's links for `links` and mark one of them selected
    async fn replace_links(&self, item_id: i64, links: Vec<LinkInput>) -> ServiceResult<Vec<ItemLink>> {
        self.link_repo
            .delete_by_item(item_id)
            .await
            .context("Failed to delete links")?;

        let mut created = Vec::with_capacity(links.len());
        for input in links {
            let link = ItemLink {
                id: 0,
                url: input.url,
                title: input.title,
                price: input.price,
                is_from_ai: input.is_from_ai,
                is_selected: input.is_selected,
                item_id,
                created_at: Utc::now(),
            };
            created.push(
                self.link_repo
                    .create(&link)
                    .await
                    .context("Failed to create link")?,
            );
        }

        if let Some(selected_id) = pick_selected_link(&created).map(|l| l.id) {
            self.link_repo
                .set_selected(item_id, selected_id)
                .await
                .context("Failed to select link")?;
            for link in &mut created {
                link.is_selected = link.id == selected_id;
            }
        }

        Ok(created)
    }
}

/// Drop blank links, keep the first ten and validate the rest
fn prepare_links(links: Vec<LinkInput>) -> ServiceResult<Vec<LinkInput>> {
    let links: Vec<LinkInput> = links
        .into_iter()
        .filter(|l| !l.url.trim().is_empty())
        .take(MAX_LINKS_PER_ITEM)
        .map(|mut l| {
            l.url = l.url.trim().to_string();
            l.title = l.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
            l
        })
        .collect();

    for link in &links {
        validation::validate_link_url(&link.url)?;
        if !validation::is_valid_price(link.price) {
            return Err(ServiceError::validation(
                "Price must be between 0 and 9,999,999.99",
            ));
        }
    }
    Ok(links)
}
