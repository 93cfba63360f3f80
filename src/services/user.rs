//! User service
//!
//! Profile reads and updates, account deletion and per-user statistics.

use crate::db::repositories::{ItemRepository, UniqueViolation, UserRepository, WishlistRepository};
use crate::models::{User, UserStats};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::image_storage::ImageStorage;
use crate::services::password::verify_password;
use crate::services::validation;
use anyhow::Context;
use std::sync::Arc;

/// Profile update form
#[derive(Debug, Clone)]
pub struct UpdateProfileInput {
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// User service
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    wishlist_repo: Arc<dyn WishlistRepository>,
    item_repo: Arc<dyn ItemRepository>,
    images: Arc<dyn ImageStorage>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        wishlist_repo: Arc<dyn WishlistRepository>,
        item_repo: Arc<dyn ItemRepository>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            user_repo,
            wishlist_repo,
            item_repo,
            images,
        }
    }

    pub async fn get_profile(&self, user_id: i64) -> ServiceResult<User> {
        self.user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    /// Update username, email and avatar.
    ///
    /// Changing the email to one another account already uses is rejected.
    pub async fn update_profile(&self, user_id: i64, input: UpdateProfileInput) -> ServiceResult<User> {
        let mut user = self.get_profile(user_id).await?;

        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();
        validation::validate_profile(&username, &email)?;

        if user.email != email
            && self
                .user_repo
                .email_exists(&email)
                .await
                .context("Failed to check email")?
        {
            return Err(ServiceError::validation(
                "A user with this email already exists",
            ));
        }

        user.username = username;
        user.email = email;
        user.avatar_url = input.avatar_url.filter(|url| !url.trim().is_empty());

        // Another account may claim the email between the check and the write.
        match self.user_repo.update(&user).await {
            Ok(updated) => Ok(updated),
            Err(e) if e.downcast_ref::<UniqueViolation>().is_some() => Err(
                ServiceError::validation("A user with this email already exists"),
            ),
            Err(e) => Err(e.context("Failed to update user").into()),
        }
    }

    /// Delete the account after re-checking the password.
    ///
    /// Sessions, wishlists, items, links and bookmarks go with it through
    /// cascading foreign keys. Reservations the user held are released and
    /// the images of the deleted items are removed from storage.
    pub async fn delete_account(&self, user_id: i64, confirm_password: &str) -> ServiceResult<()> {
        let user = self.get_profile(user_id).await?;

        if !verify_password(confirm_password, &user.password_hash) {
            return Err(ServiceError::unauthorized("Invalid password confirmation"));
        }

        let images = self
            .item_repo
            .list_image_urls_by_owner(user_id)
            .await
            .context("Failed to list item images")?;

        let deleted = self
            .user_repo
            .delete(user_id)
            .await
            .context("Failed to delete user")?;

        if !deleted {
            return Err(ServiceError::not_found("User not found"));
        }

        for url in images {
            self.images.delete(&url).await;
        }

        tracing::info!("User account deleted: {}", user_id);
        Ok(())
    }

    pub async fn stats(&self, user_id: i64) -> ServiceResult<UserStats> {
        let wishlists_count = self
            .wishlist_repo
            .count_by_user(user_id)
            .await
            .context("Failed to count wishlists")?;
        let items_count = self
            .item_repo
            .count_by_owner(user_id)
            .await
            .context("Failed to count items")?;
        let reserved_items_count = self
            .item_repo
            .count_reserved_by(user_id)
            .await
            .context("Failed to count reserved items")?;

        Ok(UserStats {
            wishlists_count,
            items_count,
            reserved_items_count,
        })
    }
}
