//! Read access to registered favorites.

use crate::db::{Database, DbError};
use async_trait::async_trait;
use fxwatch_core::Favorite;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of favorites for the dispatcher.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// All favorites in storage order. Empty is not an error.
    async fn list_favorites(&self) -> Result<Vec<Favorite>, DbError>;
}

#[async_trait]
impl FavoriteRepository for Database {
    async fn list_favorites(&self) -> Result<Vec<Favorite>, DbError> {
        self.get_all_favorites().await
    }
}

/// Mock repository for testing.
#[derive(Default)]
pub struct MockFavoriteRepository {
    favorites: Vec<Favorite>,
    /// Should every listing fail with a connection error.
    pub should_fail: bool,
    list_calls: AtomicUsize,
}

impl MockFavoriteRepository {
    pub fn new(favorites: Vec<Favorite>) -> Self {
        Self {
            favorites,
            ..Default::default()
        }
    }

    /// Repository whose listing always fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FavoriteRepository for MockFavoriteRepository {
    async fn list_favorites(&self) -> Result<Vec<Favorite>, DbError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(DbError::Query(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))));
        }
        Ok(self.favorites.clone())
    }
}
