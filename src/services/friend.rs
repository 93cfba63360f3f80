//! Friend wishlist service
//!
//! Lets a user bookmark wishlists shared with them and open them later
//! without the share link.

use crate::db::repositories::{FriendRepository, UniqueViolation, WishlistRepository};
use crate::models::{FriendWishlist, FriendWishlistEntry, Wishlist, WishlistDetails};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::wishlist::WishlistService;
use anyhow::Context;
use std::sync::Arc;

/// Name used when a wishlist is saved without one
pub const DEFAULT_FRIEND_NAME: &str = "Friend";

/// Friend wishlist service
pub struct FriendService {
    friend_repo: Arc<dyn FriendRepository>,
    wishlist_repo: Arc<dyn WishlistRepository>,
    wishlists: Arc<WishlistService>,
}

impl FriendService {
    pub fn new(
        friend_repo: Arc<dyn FriendRepository>,
        wishlist_repo: Arc<dyn WishlistRepository>,
        wishlists: Arc<WishlistService>,
    ) -> Self {
        Self {
            friend_repo,
            wishlist_repo,
            wishlists,
        }
    }

    pub async fn list(&self, user_id: i64) -> ServiceResult<Vec<FriendWishlistEntry>> {
        let entries = self
            .friend_repo
            .list_by_user(user_id)
            .await
            .context("Failed to list friend wishlists")?;
        Ok(entries)
    }

    /// Bookmark the wishlist behind `share_token` under `friend_name`
    pub async fn add(
        &self,
        user_id: i64,
        share_token: &str,
        friend_name: &str,
    ) -> ServiceResult<(FriendWishlist, Wishlist)> {
        if share_token.trim().is_empty() {
            return Err(ServiceError::validation("Share token is required"));
        }
        let friend_name = friend_name.trim();
        if friend_name.is_empty() {
            return Err(ServiceError::validation("Friend name is required"));
        }

        self.save(user_id, share_token, friend_name).await
    }

    /// Bookmark from a shared link, where the name is optional
    pub async fn save_from_url(
        &self,
        user_id: i64,
        share_token: &str,
        friend_name: Option<&str>,
    ) -> ServiceResult<(FriendWishlist, Wishlist)> {
        if share_token.trim().is_empty() {
            return Err(ServiceError::validation("Share token is required"));
        }
        let friend_name = friend_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FRIEND_NAME);

        self.save(user_id, share_token, friend_name).await
    }

    /// Open a bookmark. Only the user who saved it may.
    pub async fn get(
        &self,
        id: i64,
        user_id: i64,
    ) -> ServiceResult<(FriendWishlist, WishlistDetails)> {
        let friend = self.find_owned(id, user_id).await?;
        let details = self.wishlists.get_details(friend.wishlist_id).await?;
        Ok((friend, details))
    }

    /// Remove a bookmark. Someone else's bookmark looks missing.
    pub async fn delete(&self, id: i64, user_id: i64) -> ServiceResult<()> {
        self.find_owned(id, user_id).await?;

        let deleted = self
            .friend_repo
            .delete(id)
            .await
            .context("Failed to delete friend wishlist")?;
        if !deleted {
            return Err(ServiceError::not_found("Friend wishlist not found"));
        }
        Ok(())
    }

    async fn find_owned(&self, id: i64, user_id: i64) -> ServiceResult<FriendWishlist> {
        self.friend_repo
            .get_by_id(id)
            .await
            .context("Failed to get friend wishlist")?
            .filter(|f| f.user_id == user_id)
            .ok_or_else(|| ServiceError::not_found("Friend wishlist not found"))
    }

    async fn save(
        &self,
        user_id: i64,
        share_token: &str,
        friend_name: &str,
    ) -> ServiceResult<(FriendWishlist, Wishlist)> {
        let wishlist = self
            .wishlist_repo
            .get_by_share_token(share_token.trim())
            .await
            .context("Failed to get wishlist by share token")?
            .ok_or_else(|| ServiceError::not_found("Wishlist not found"))?;

        if wishlist.is_owned_by(user_id) {
            return Err(ServiceError::validation("You cannot add your own wishlist"));
        }

        let existing = self
            .friend_repo
            .get_by_user_and_wishlist(user_id, wishlist.id)
            .await
            .context("Failed to check friend wishlist")?;
        if existing.is_some() {
            return Err(ServiceError::validation("This wishlist is already saved"));
        }

        let friend = FriendWishlist::new(user_id, wishlist.id, friend_name.to_string());
        match self.friend_repo.create(&friend).await {
            Ok(created) => Ok((created, wishlist)),
            Err(e) if e.downcast_ref::<UniqueViolation>().is_some() => {
                Err(ServiceError::validation("This wishlist is already saved"))
            }
            Err(e) => Err(e.context("Failed to save friend wishlist").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::config::UploadConfig;
    use crate::db::repositories::test_support::{
        create_test_item, create_test_user, create_test_wishlist, migrated_pool,
    };
    use crate::db::repositories::{
        SqlxFriendRepository, SqlxItemRepository, SqlxLinkRepository, SqlxThemeRepository,
        SqlxWishlistRepository,
    };
    use crate::db::Database;
    use crate::services::image_storage::LocalImageStorage;
    use crate::services::theme::ThemeService;

    async fn setup() -> (Database, FriendService) {
        let pool = migrated_pool().await;
        let themes = Arc::new(ThemeService::new(
            SqlxThemeRepository::boxed(pool.clone()),
            Arc::new(MemoryCache::new()),
        ));
        let wishlists = Arc::new(WishlistService::new(
            SqlxWishlistRepository::boxed(pool.clone()),
            SqlxItemRepository::boxed(pool.clone()),
            SqlxLinkRepository::boxed(pool.clone()),
            themes,
            Arc::new(LocalImageStorage::new(UploadConfig::default())),
        ));
        let service = FriendService::new(
            SqlxFriendRepository::boxed(pool.clone()),
            SqlxWishlistRepository::boxed(pool.clone()),
            wishlists,
        );
        (pool, service)
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let (pool, service) = setup().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let wishlist = create_test_wishlist(&pool, alice.id, "Birthday").await;

        let (friend, saved) = service
            .add(bob.id, &wishlist.share_token, "  Alice ")
            .await
            .unwrap();
        assert_eq!(friend.friend_name, "Alice");
        assert_eq!(saved.id, wishlist.id);

        let entries = service.list(bob.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].wishlist.title, "Birthday");
        assert!(service.list(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejections() {
        let (pool, service) = setup().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let wishlist = create_test_wishlist(&pool, alice.id, "Birthday").await;
        let token = wishlist.share_token.as_str();

        let message = |r: ServiceResult<(FriendWishlist, Wishlist)>| match r {
            Err(ServiceError::Validation(m)) => m,
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        };

        assert_eq!(message(service.add(bob.id, " ", "Alice").await), "Share token is required");
        assert_eq!(message(service.add(bob.id, token, "").await), "Friend name is required");
        assert_eq!(
            message(service.add(alice.id, token, "Me").await),
            "You cannot add your own wishlist"
        );

        service.add(bob.id, token, "Alice").await.unwrap();
        assert_eq!(
            message(service.add(bob.id, token, "Alice again").await),
            "This wishlist is already saved"
        );

        assert!(matches!(
            service.add(bob.id, "no-such-token", "Alice").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_adds_save_once() {
        let (pool, service) = setup().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let wishlist = create_test_wishlist(&pool, alice.id, "Birthday").await;
        let token = wishlist.share_token.as_str();

        let (a, b, c) = tokio::join!(
            service.add(bob.id, token, "Alice"),
            service.add(bob.id, token, "Alice"),
            service.add(bob.id, token, "Alice"),
        );

        let outcomes = [a, b, c];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        for outcome in outcomes.iter().filter(|r| r.is_err()) {
            assert!(matches!(
                outcome,
                Err(ServiceError::Validation(m)) if m == "This wishlist is already saved"
            ));
        }
        assert_eq!(service.list(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_from_url_defaults_name() {
        let (pool, service) = setup().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let wishlist = create_test_wishlist(&pool, alice.id, "Birthday").await;

        let (friend, _) = service
            .save_from_url(bob.id, &wishlist.share_token, None)
            .await
            .unwrap();
        assert_eq!(friend.friend_name, DEFAULT_FRIEND_NAME);
    }

    #[tokio::test]
    async fn test_get_only_for_the_saver() {
        let (pool, service) = setup().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let carol = create_test_user(&pool, "carol").await;
        let wishlist = create_test_wishlist(&pool, alice.id, "Birthday").await;
        create_test_item(&pool, wishlist.id, "Book").await;

        let (friend, _) = service.add(bob.id, &wishlist.share_token, "Alice").await.unwrap();

        let (_, details) = service.get(friend.id, bob.id).await.unwrap();
        assert_eq!(details.items.len(), 1);

        assert!(matches!(
            service.get(friend.id, carol.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_only_by_the_saver() {
        let (pool, service) = setup().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let wishlist = create_test_wishlist(&pool, alice.id, "Birthday").await;
        let (friend, _) = service.add(bob.id, &wishlist.share_token, "Alice").await.unwrap();

        let err = service.delete(friend.id, alice.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Friend wishlist not found"));
        assert_eq!(service.list(bob.id).await.unwrap().len(), 1);

        service.delete(friend.id, bob.id).await.unwrap();
        assert!(service.list(bob.id).await.unwrap().is_empty());
    }
}
