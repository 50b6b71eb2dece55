//! Catalog domain types: genres, artists, albums.

use chrono::{DateTime, Utc};

use melodex_core::{AlbumId, ArtistId, GenreId, Price};

/// A music genre.
#[derive(Debug, Clone)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    pub description: Option<String>,
}

/// A recording artist.
#[derive(Debug, Clone)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
}

/// An album in the catalog.
///
/// `created_at` is stamped by the database when the row is inserted and is
/// never updated afterwards.
#[derive(Debug, Clone)]
pub struct Album {
    pub id: AlbumId,
    pub genre_id: GenreId,
    pub artist_id: ArtistId,
    pub title: String,
    pub price: Price,
    pub album_art_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Artist name, joined in for display.
    pub artist_name: String,
    /// Genre name, joined in for display.
    pub genre_name: String,
}
