//! SQLite database for favorite conversions.

use fxwatch_core::{Favorite, NewFavorite};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database not initialized")]
    NotInitialized,
    #[error("error querying favorites: {0}")]
    Query(#[from] sqlx::Error),
    #[error("favorite with this email already exists")]
    EmailAlreadyExists,
}

type FavoriteRow = (i64, String, String, String, f64);

/// Database connection for favorites.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite database at the given URL and create the schema.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Every in-memory connection would otherwise see its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        info!(url = database_url, "Database ready");
        Ok(db)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS favorite_conversions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                currency_origin TEXT NOT NULL,
                currency_destination TEXT NOT NULL,
                threshold REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.pool.is_closed() {
            return Err(DbError::NotInitialized);
        }
        Ok(())
    }

    /// Store a validated favorite and return its ID.
    pub async fn save_favorite(&self, favorite: &NewFavorite) -> Result<i64, DbError> {
        self.ensure_open()?;

        let result = sqlx::query(
            r#"
            INSERT INTO favorite_conversions (email, currency_origin, currency_destination, threshold)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&favorite.email)
        .bind(favorite.currency_origin.as_str())
        .bind(favorite.currency_destination.as_str())
        .bind(favorite.threshold)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DbError::EmailAlreadyExists
            }
            other => DbError::Query(other),
        })?;

        let id = result.last_insert_rowid();
        debug!(id, email = %favorite.email, "Saved favorite");
        Ok(id)
    }

    /// Get all favorites in storage order.
    pub async fn get_all_favorites(&self) -> Result<Vec<Favorite>, DbError> {
        self.ensure_open()?;

        let rows = sqlx::query_as::<_, FavoriteRow>(
            "SELECT id, email, currency_origin, currency_destination, threshold FROM favorite_conversions",
        )
        .fetch_all(&self.pool)
        .await?;

        let favorites = rows
            .into_iter()
            .map(|(id, email, origin, destination, threshold)| {
                Favorite::new(id, email, &origin, &destination, threshold)
            })
            .collect();

        Ok(favorites)
    }

    /// Close the pool. Later calls fail with `NotInitialized`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
