//! Catalog repository: genres, artists, and albums.
//!
//! The catalog is read-only from the web application; rows are inserted by
//! the CLI seed command.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use melodex_core::{AlbumId, ArtistId, GenreId, Price};

use super::RepositoryError;
use crate::models::catalog::{Album, Artist, Genre};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct GenreRow {
    id: i32,
    name: String,
    description: Option<String>,
}

impl From<GenreRow> for Genre {
    fn from(row: GenreRow) -> Self {
        Self {
            id: GenreId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ArtistRow {
    id: i32,
    name: String,
}

impl From<ArtistRow> for Artist {
    fn from(row: ArtistRow) -> Self {
        Self {
            id: ArtistId::new(row.id),
            name: row.name,
        }
    }
}

/// Album row joined with artist and genre names.
#[derive(Debug, sqlx::FromRow)]
struct AlbumRow {
    id: i32,
    genre_id: i32,
    artist_id: i32,
    title: String,
    price: Decimal,
    album_art_url: Option<String>,
    created_at: DateTime<Utc>,
    artist_name: String,
    genre_name: String,
}

impl From<AlbumRow> for Album {
    fn from(row: AlbumRow) -> Self {
        Self {
            id: AlbumId::new(row.id),
            genre_id: GenreId::new(row.genre_id),
            artist_id: ArtistId::new(row.artist_id),
            title: row.title,
            price: Price::new(row.price),
            album_art_url: row.album_art_url,
            created_at: row.created_at,
            artist_name: row.artist_name,
            genre_name: row.genre_name,
        }
    }
}

const ALBUM_SELECT: &str = "SELECT a.id, a.genre_id, a.artist_id, a.title, a.price, \
                                   a.album_art_url, a.created_at, \
                                   ar.name AS artist_name, g.name AS genre_name \
                            FROM albums a \
                            JOIN artists ar ON ar.id = a.artist_id \
                            JOIN genres g ON g.id = a.genre_id";

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all genres, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn genres(&self) -> Result<Vec<Genre>, RepositoryError> {
        let rows = sqlx::query_as::<_, GenreRow>(
            "SELECT id, name, description FROM genres ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a genre by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn genre_by_name(&self, name: &str) -> Result<Option<Genre>, RepositoryError> {
        let row = sqlx::query_as::<_, GenreRow>(
            "SELECT id, name, description FROM genres WHERE lower(name) = lower($1)",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all artists, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn artists(&self) -> Result<Vec<Artist>, RepositoryError> {
        let rows = sqlx::query_as::<_, ArtistRow>("SELECT id, name FROM artists ORDER BY name ASC")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List albums in a genre, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn albums_by_genre(&self, genre_id: GenreId) -> Result<Vec<Album>, RepositoryError> {
        let rows = sqlx::query_as::<_, AlbumRow>(&format!(
            "{ALBUM_SELECT} WHERE a.genre_id = $1 ORDER BY a.title ASC"
        ))
        .bind(genre_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a single album with its artist and genre names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn album(&self, id: AlbumId) -> Result<Option<Album>, RepositoryError> {
        let row = sqlx::query_as::<_, AlbumRow>(&format!("{ALBUM_SELECT} WHERE a.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// The most recently added albums, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_albums(&self, limit: i64) -> Result<Vec<Album>, RepositoryError> {
        let rows = sqlx::query_as::<_, AlbumRow>(&format!(
            "{ALBUM_SELECT} ORDER BY a.created_at DESC, a.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
